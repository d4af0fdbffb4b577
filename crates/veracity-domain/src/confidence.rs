//! Confidence banding shared by reconciliation and citation validation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest score classified as high confidence
pub const HIGH_CONFIDENCE_THRESHOLD: u8 = 70;

/// Lowest score classified as moderate confidence
pub const MODERATE_CONFIDENCE_THRESHOLD: u8 = 40;

/// Three-band classification of a 0-100 confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Score >= 70
    High,
    /// Score in [40, 70)
    Moderate,
    /// Score < 40
    Low,
}

impl ConfidenceLevel {
    /// Classify a score in [0, 100]
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::High
        } else if score >= MODERATE_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Moderate => "moderate",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
