//! Citation validation types

use serde::{Deserialize, Serialize};
use veracity_domain::{Competitor, ExternalSource, KbDocument};

/// Which idiom a citation was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    /// `[Source: X]`
    SourceNamed,
    /// `[Source N]`
    SourceNumbered,
    /// `[N]`
    Bracketed,
    /// `(Source: X)`
    Parenthetical,
    /// `According to X`
    AccordingTo,
    /// `Per X`
    Per,
    /// Supplied as a structured [`Citation`] rather than found in text
    Structured,
}

impl CitationKind {
    /// Stable name for logs and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationKind::SourceNamed => "source_named",
            CitationKind::SourceNumbered => "source_numbered",
            CitationKind::Bracketed => "bracketed",
            CitationKind::Parenthetical => "parenthetical",
            CitationKind::AccordingTo => "according_to",
            CitationKind::Per => "per",
            CitationKind::Structured => "structured",
        }
    }

    /// Free-text forms whose reference runs into surrounding prose
    pub fn is_narrative(&self) -> bool {
        matches!(self, CitationKind::AccordingTo | CitationKind::Per)
    }
}

/// A structured citation handed over alongside the generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Identifier the answer uses for the source
    pub source_reference: String,

    /// The claim the citation is meant to support
    #[serde(default)]
    pub quoted_text: Option<String>,

    /// Link to the source, if the answer gave one
    #[serde(default)]
    pub url: Option<String>,
}

impl Citation {
    /// Create a citation with only a reference
    pub fn new(source_reference: impl Into<String>) -> Self {
        Self {
            source_reference: source_reference.into(),
            quoted_text: None,
            url: None,
        }
    }

    /// Attach the supported claim
    pub fn with_quote(mut self, quoted_text: impl Into<String>) -> Self {
        self.quoted_text = Some(quoted_text.into());
        self
    }

    /// Attach a URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// The entity a citation resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchedSource {
    /// A knowledge-base document
    KnowledgeBase(KbDocument),
    /// A tracked competitor
    Competitor(Competitor),
    /// A generic internal reference such as "knowledge base"
    Internal {
        /// The reference as configured
        reference: String,
    },
    /// An external source
    External(ExternalSource),
}

impl MatchedSource {
    /// Text the source can be checked against, if it has any
    pub fn content(&self) -> Option<String> {
        let text = match self {
            MatchedSource::KnowledgeBase(doc) => Some(doc.searchable_text()),
            MatchedSource::Competitor(competitor) => competitor.description.clone(),
            MatchedSource::Internal { .. } => None,
            MatchedSource::External(source) => source.content.clone(),
        };
        text.filter(|t| !t.trim().is_empty())
    }

    /// Human label for warnings and logs
    pub fn label(&self) -> String {
        match self {
            MatchedSource::KnowledgeBase(doc) => doc.title.clone().unwrap_or_else(|| doc.id.clone()),
            MatchedSource::Competitor(competitor) => competitor.name.clone(),
            MatchedSource::Internal { reference } => reference.clone(),
            MatchedSource::External(source) => source.name.clone(),
        }
    }
}

/// A citation found in the text or supplied structurally, with its verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationMatch {
    /// Verbatim matched text (the reference itself for structured citations)
    pub full_match: String,

    /// The captured identifier
    pub source_reference: String,

    /// Byte offset in the response, `None` for structured citations
    pub position: Option<usize>,

    /// Idiom the citation was written in
    pub kind: CitationKind,

    /// Whether the reference resolved to a known source
    pub is_valid: bool,

    /// The resolved source
    pub matched_source: Option<MatchedSource>,

    /// Trigram similarity between the claim and the source content
    pub similarity: Option<f64>,

    /// Set when the claim barely resembles the cited source
    pub low_confidence: bool,
}

impl CitationMatch {
    /// Byte span in the response, for in-text citations
    pub fn span(&self) -> Option<(usize, usize)> {
        self.position.map(|start| (start, start + self.full_match.len()))
    }
}

/// Shape of a factual-looking claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// `20%`
    Percentage,
    /// `$5M`
    DollarAmount,
    /// `revenue of $5M`
    FinancialFigure,
    /// `ranked #3`
    Ranking,
    /// `1,500 employees`
    EntityCount,
}

impl ClaimKind {
    /// Stable name for logs and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimKind::Percentage => "percentage",
            ClaimKind::DollarAmount => "dollar_amount",
            ClaimKind::FinancialFigure => "financial_figure",
            ClaimKind::Ranking => "ranking",
            ClaimKind::EntityCount => "entity_count",
        }
    }
}

/// A factual-looking claim with no citation nearby
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsourcedClaim {
    /// Pattern that matched
    pub kind: ClaimKind,

    /// Matched text
    pub text: String,

    /// Byte offset in the response
    pub position: usize,
}

/// Outcome of validating one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// No invalid citations and no unsourced claims
    pub is_valid: bool,

    /// Citations that resolved
    pub valid_citations: Vec<CitationMatch>,

    /// Citations that did not resolve
    pub invalid_citations: Vec<CitationMatch>,

    /// Human-readable findings, including advisory ones
    pub warnings: Vec<String>,

    /// Response with invalid citations replaced by the removal marker
    pub cleaned_response: String,

    /// Claims with no citation nearby
    pub unsourced_claims: Vec<UnsourcedClaim>,

    /// Wall-clock time spent validating
    pub validation_time_ms: f64,
}

impl ValidationResult {
    /// Total citations checked
    pub fn total_citations(&self) -> usize {
        self.valid_citations.len() + self.invalid_citations.len()
    }

    /// Fraction of citations that resolved, 1.0 when there were none
    pub fn citation_accuracy(&self) -> f64 {
        let total = self.total_citations();
        if total == 0 {
            return 1.0;
        }
        self.valid_citations.len() as f64 / total as f64
    }

    /// Citations flagged as weakly supported
    pub fn low_confidence_citations(&self) -> impl Iterator<Item = &CitationMatch> {
        self.valid_citations.iter().filter(|c| c.low_confidence)
    }
}
