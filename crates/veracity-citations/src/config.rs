//! Citation validator configuration

use serde::{Deserialize, Serialize};

/// Marker that replaces an invalid citation in the cleaned response
pub const CITATION_REMOVED_MARKER: &str = "[citation removed]";

/// Generic internal references accepted without a lookup entry
pub const DEFAULT_GENERIC_REFERENCES: &[&str] = &[
    "competitor database",
    "knowledge base",
    "internal database",
    "discovery pipeline",
    "internal data",
    "company database",
];

/// Configuration for citation validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Trigram similarity below which a citation is low confidence
    pub low_similarity_threshold: f64,

    /// Bytes either side of a claim searched for a supporting citation
    pub claim_window: usize,

    /// Maximum unsourced-claim warnings reported
    pub max_unsourced_claims: usize,

    /// Quotes shorter than this many words pass the deep content check
    pub deep_check_min_words: usize,

    /// Fraction of quoted words that must appear in the source
    pub deep_check_coverage: f64,

    /// Replacement for invalid citations
    #[serde(default = "default_marker")]
    pub removal_marker: String,

    /// References accepted as generic internal sources
    #[serde(default = "default_generic_references")]
    pub generic_references: Vec<String>,

    /// Scan for numeric claims with no nearby citation
    #[serde(default = "default_detect_unsourced")]
    pub detect_unsourced_claims: bool,
}

fn default_marker() -> String {
    CITATION_REMOVED_MARKER.to_string()
}

fn default_generic_references() -> Vec<String> {
    DEFAULT_GENERIC_REFERENCES.iter().map(|s| s.to_string()).collect()
}

fn default_detect_unsourced() -> bool {
    true
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            low_similarity_threshold: 0.30,
            claim_window: 100,
            max_unsourced_claims: 5,
            deep_check_min_words: 5,
            deep_check_coverage: 0.80,
            removal_marker: default_marker(),
            generic_references: default_generic_references(),
            detect_unsourced_claims: true,
        }
    }
}

impl CitationConfig {
    /// Strict preset: higher similarity bar, tighter claim window, no generic references
    pub fn strict() -> Self {
        Self {
            low_similarity_threshold: 0.45,
            claim_window: 60,
            max_unsourced_claims: 10,
            deep_check_min_words: 3,
            deep_check_coverage: 0.90,
            generic_references: Vec::new(),
            ..Self::default()
        }
    }

    /// Permissive preset: citations only, no unsourced-claim scan
    pub fn permissive() -> Self {
        Self {
            low_similarity_threshold: 0.15,
            claim_window: 200,
            deep_check_coverage: 0.60,
            detect_unsourced_claims: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.low_similarity_threshold) {
            return Err(format!(
                "low_similarity_threshold must be in [0.0, 1.0], got {}",
                self.low_similarity_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.deep_check_coverage) {
            return Err(format!(
                "deep_check_coverage must be in [0.0, 1.0], got {}",
                self.deep_check_coverage
            ));
        }
        if self.claim_window == 0 {
            return Err("claim_window must be greater than 0".to_string());
        }
        if self.removal_marker.is_empty() {
            return Err("removal_marker cannot be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
