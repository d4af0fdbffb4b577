//! Source records and their authority classes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authority class of a data source
///
/// Each class carries a fixed base score in [0, 100] describing how much a
/// value from that class is trusted before freshness and verification are
/// taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SourceType {
    /// Regulatory filing (10-K, 10-Q, S-1, ...)
    SecFiling,
    /// Data supplied directly by the client
    ClientProvided,
    /// Third-party data API with its own verification
    ApiVerified,
    /// Analyst manual entry
    ManualEntry,
    /// Official press release
    PressRelease,
    /// The competitor's own website, read by an analyst
    CompanyWebsite,
    /// Automated website scrape
    WebsiteScrape,
    /// News coverage
    NewsArticle,
    /// Value extracted by a generative model
    AiExtracted,
    /// Anything unrecognised
    Unknown,
}

impl SourceType {
    /// Base authority score for this source type
    pub fn authority(&self) -> f64 {
        match self {
            SourceType::SecFiling => 100.0,
            SourceType::ClientProvided => 95.0,
            SourceType::ApiVerified => 90.0,
            SourceType::ManualEntry => 80.0,
            SourceType::PressRelease => 70.0,
            SourceType::CompanyWebsite => 65.0,
            SourceType::WebsiteScrape => 50.0,
            SourceType::NewsArticle => 40.0,
            SourceType::AiExtracted => 30.0,
            SourceType::Unknown => 10.0,
        }
    }

    /// Get the source type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::SecFiling => "sec_filing",
            SourceType::ClientProvided => "client_provided",
            SourceType::ApiVerified => "api_verified",
            SourceType::ManualEntry => "manual_entry",
            SourceType::PressRelease => "press_release",
            SourceType::CompanyWebsite => "company_website",
            SourceType::WebsiteScrape => "website_scrape",
            SourceType::NewsArticle => "news_article",
            SourceType::AiExtracted => "ai_extracted",
            SourceType::Unknown => "unknown",
        }
    }

    /// Parse a source type, mapping anything unrecognised to `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "sec_filing" | "sec" => SourceType::SecFiling,
            "client_provided" | "client" => SourceType::ClientProvided,
            "api_verified" | "api" => SourceType::ApiVerified,
            "manual_entry" | "manual" => SourceType::ManualEntry,
            "press_release" => SourceType::PressRelease,
            "company_website" => SourceType::CompanyWebsite,
            "website_scrape" | "scrape" => SourceType::WebsiteScrape,
            "news_article" | "news" => SourceType::NewsArticle,
            "ai_extracted" | "llm" => SourceType::AiExtracted,
            _ => SourceType::Unknown,
        }
    }
}

impl From<&str> for SourceType {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for SourceType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance channel of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Pre-ingested knowledge-base document
    Kb,
    /// Freshly fetched live source
    Live,
}

impl SourceOrigin {
    /// Get the origin name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOrigin::Kb => "kb",
            SourceOrigin::Live => "live",
        }
    }
}

/// One observation of one field from one source
///
/// Records are built once and only ever borrowed by the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Observed value, as text
    pub value: String,

    /// Authority class of the source
    pub source_type: SourceType,

    /// Opaque reference to the originating record
    pub source_id: i64,

    /// Knowledge base or live
    pub source_origin: SourceOrigin,

    /// Producer-asserted confidence [0.0, 1.0]
    #[serde(default)]
    pub confidence: f64,

    /// When the fact was true (not when it was collected)
    #[serde(default)]
    pub data_as_of_date: Option<DateTime<Utc>>,

    /// Human-confirmed flag
    #[serde(default)]
    pub is_verified: bool,

    /// Back-reference for citation purposes
    #[serde(default)]
    pub document_id: Option<String>,
}

impl SourceRecord {
    /// Create a new record with default confidence, no date, unverified
    pub fn new(
        value: impl Into<String>,
        source_type: SourceType,
        source_id: i64,
        source_origin: SourceOrigin,
    ) -> Self {
        Self {
            value: value.into(),
            source_type,
            source_id,
            source_origin,
            confidence: 0.0,
            data_as_of_date: None,
            is_verified: false,
            document_id: None,
        }
    }

    /// Shorthand for a knowledge-base record
    pub fn kb(value: impl Into<String>, source_type: SourceType, source_id: i64) -> Self {
        Self::new(value, source_type, source_id, SourceOrigin::Kb)
    }

    /// Shorthand for a live record
    pub fn live(value: impl Into<String>, source_type: SourceType, source_id: i64) -> Self {
        Self::new(value, source_type, source_id, SourceOrigin::Live)
    }

    /// Set the producer-asserted confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Set the date the value was true as of
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.data_as_of_date = Some(as_of);
        self
    }

    /// Mark the record as human-verified
    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    /// Attach a document back-reference
    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Age of the observation in fractional days relative to `now`
    ///
    /// Undated records and records dated in the future have age zero.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        match self.data_as_of_date {
            Some(as_of) => ((now - as_of).num_seconds() as f64 / 86_400.0).max(0.0),
            None => 0.0,
        }
    }
}
