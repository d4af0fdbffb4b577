//! Configuration for source reconciliation

use serde::{Deserialize, Serialize};

/// Score points lost per day of data age
pub const FRESHNESS_DECAY_RATE: f64 = 0.05;

/// Cap on the freshness penalty, in score points
pub const MAX_FRESHNESS_PENALTY: f64 = 30.0;

/// Score points added for human-verified records
pub const VERIFICATION_BONUS: f64 = 10.0;

/// Relative difference above which two values conflict
pub const CONFLICT_THRESHOLD_NUMERIC: f64 = 0.20;

/// Scoring and conflict tunables for the reconciliation engine
///
/// # Examples
///
/// ```
/// use veracity_reconciler::ReconcilerConfig;
///
/// let config = ReconcilerConfig::default();
/// assert_eq!(config.numeric_conflict_threshold, 0.20);
///
/// // Old data loses authority faster
/// let config = ReconcilerConfig::strict();
/// assert!(config.freshness_decay_rate > ReconcilerConfig::default().freshness_decay_rate);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Score points lost per day of age (points/day)
    pub freshness_decay_rate: f64,

    /// Maximum freshness penalty (points)
    pub max_freshness_penalty: f64,

    /// Bonus for human-verified records (points)
    pub verification_bonus: f64,

    /// Relative numeric difference above which values conflict
    pub numeric_conflict_threshold: f64,

    /// `1 - similarity` above which textual values conflict
    #[serde(default = "default_text_conflict_threshold")]
    pub text_conflict_threshold: f64,
}

fn default_text_conflict_threshold() -> f64 {
    CONFLICT_THRESHOLD_NUMERIC
}

impl Default for ReconcilerConfig {
    /// Balanced scoring
    ///
    /// - Decay: 0.05 points/day (about 18 points per year)
    /// - Penalty cap: 30 points
    /// - Verification bonus: 10 points
    /// - Conflict band: 20% for numbers and text
    fn default() -> Self {
        Self {
            freshness_decay_rate: FRESHNESS_DECAY_RATE,
            max_freshness_penalty: MAX_FRESHNESS_PENALTY,
            verification_bonus: VERIFICATION_BONUS,
            numeric_conflict_threshold: CONFLICT_THRESHOLD_NUMERIC,
            text_conflict_threshold: CONFLICT_THRESHOLD_NUMERIC,
        }
    }
}

impl ReconcilerConfig {
    /// Strict preset: faster decay, higher cap, tighter conflict band
    pub fn strict() -> Self {
        Self {
            freshness_decay_rate: 0.1,
            max_freshness_penalty: 40.0,
            verification_bonus: 5.0,
            numeric_conflict_threshold: 0.10,
            text_conflict_threshold: 0.15,
        }
    }

    /// Lenient preset: slow decay, small cap, wider conflict band
    pub fn lenient() -> Self {
        Self {
            freshness_decay_rate: 0.02,
            max_freshness_penalty: 20.0,
            verification_bonus: 15.0,
            numeric_conflict_threshold: 0.30,
            text_conflict_threshold: 0.30,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let finite_non_negative = [
            ("freshness_decay_rate", self.freshness_decay_rate),
            ("max_freshness_penalty", self.max_freshness_penalty),
            ("verification_bonus", self.verification_bonus),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.max_freshness_penalty > 100.0 {
            return Err("max_freshness_penalty cannot exceed 100".to_string());
        }

        let thresholds = [
            ("numeric_conflict_threshold", self.numeric_conflict_threshold),
            ("text_conflict_threshold", self.text_conflict_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0.0, 1.0], got {}", name, value));
            }
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

/// Fields gathered for a unified competitor context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Fields of interest, reconciled in this order
    pub fields: Vec<String>,

    /// Age after which a field's best source is reported as stale
    pub stale_after_days: i64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            fields: [
                "annual_revenue",
                "employee_count",
                "total_funding",
                "headquarters",
                "founded_year",
                "ceo",
                "pricing",
                "market_share",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
            stale_after_days: 365,
        }
    }
}

impl ContextConfig {
    /// Replace the fields of interest
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fields.iter().any(|f| f.trim().is_empty()) {
            return Err("field names cannot be empty".to_string());
        }
        if self.stale_after_days <= 0 {
            return Err("stale_after_days must be greater than 0".to_string());
        }
        Ok(())
    }
}
