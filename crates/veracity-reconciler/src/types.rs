//! Reconciliation result types

use serde::{Deserialize, Serialize};
use veracity_domain::{ConfidenceLevel, SourceRecord};

/// Audit tag recorded on every authority-ranked result
pub const METHOD_AUTHORITY: &str = "authority";

/// Knowledge-base and live observations of one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSources {
    /// Records from the knowledge base
    #[serde(default)]
    pub kb: Vec<SourceRecord>,

    /// Records from live sources
    #[serde(default)]
    pub live: Vec<SourceRecord>,
}

impl FieldSources {
    /// Create a source set
    pub fn new(kb: Vec<SourceRecord>, live: Vec<SourceRecord>) -> Self {
        Self { kb, live }
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.kb.len() + self.live.len()
    }

    /// Whether there are no records at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A candidate record with the score the engine gave it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSource {
    /// The original observation
    pub record: SourceRecord,

    /// Engine score in [0, 100]
    pub score: f64,
}

/// How two values were compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    /// Both values parsed as numbers
    Numeric,
    /// At least one value is not a number; string similarity was used
    Textual,
}

/// Outcome of comparing two candidate values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueComparison {
    /// Comparison method
    pub kind: ComparisonKind,

    /// Relative numeric difference, or `1 - similarity` for text
    pub relative_difference: f64,

    /// Whether the difference exceeds the configured threshold
    pub is_conflict: bool,
}

/// Two sources that disagree about a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// The higher-ranked source
    pub source_a: SourceRecord,

    /// The lower-ranked source
    pub source_b: SourceRecord,

    /// Relative difference between their values
    pub relative_difference: f64,

    /// Comparison method that found the conflict
    pub kind: ComparisonKind,
}

/// One reconciled field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Field being reconciled
    pub field_name: String,

    /// Value of the highest-scoring source (empty when there were none)
    pub best_value: String,

    /// Score of the highest-scoring source [0, 100]
    pub confidence_score: u8,

    /// Band derived from `confidence_score`
    pub confidence_level: ConfidenceLevel,

    /// All candidates, best first
    pub sources_used: Vec<RankedSource>,

    /// Detected disagreements between distinct values
    pub conflicts: Vec<Conflict>,

    /// Material disagreement at the top, or low confidence
    pub needs_review: bool,

    /// Audit tag
    pub reconciliation_method: String,
}

impl ReconciliationResult {
    /// Result for a field nobody reported on
    pub fn empty(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            best_value: String::new(),
            confidence_score: 0,
            confidence_level: ConfidenceLevel::Low,
            sources_used: Vec::new(),
            conflicts: Vec::new(),
            needs_review: true,
            reconciliation_method: METHOD_AUTHORITY.to_string(),
        }
    }

    /// Whether any conflict was detected
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// The source that supplied `best_value`
    pub fn top_source(&self) -> Option<&RankedSource> {
        self.sources_used.first()
    }
}
