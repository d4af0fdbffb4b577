//! Authority-ranked source reconciliation

use crate::config::ReconcilerConfig;
use crate::error::ReconcilerError;
use crate::types::{
    ComparisonKind, Conflict, FieldSources, RankedSource, ReconciliationResult, ValueComparison,
    METHOD_AUTHORITY,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;
use veracity_domain::{
    extract_number, relative_difference, string_similarity, ConfidenceLevel, SourceOrigin,
    SourceRecord,
};

/// Picks a best value per field from conflicting observations
///
/// Every candidate is scored by source authority, minus a capped freshness
/// penalty, plus a bonus for human verification. The top candidate wins;
/// disagreements between distinct values are reported as conflicts.
///
/// The engine holds only its configuration, so one instance can reconcile
/// any number of fields concurrently.
///
/// # Examples
///
/// ```
/// use veracity_domain::{SourceRecord, SourceType};
/// use veracity_reconciler::SourceReconciler;
///
/// let reconciler = SourceReconciler::default_config();
/// let kb = vec![SourceRecord::kb("$12M", SourceType::SecFiling, 1)];
/// let live = vec![SourceRecord::live("$20M", SourceType::NewsArticle, 2)];
///
/// let result = reconciler.reconcile_field("annual_revenue", &kb, &live);
/// assert_eq!(result.best_value, "$12M");
/// assert_eq!(result.conflicts.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SourceReconciler {
    config: ReconcilerConfig,
}

impl SourceReconciler {
    /// Create a reconciler with the given configuration
    pub fn new(config: ReconcilerConfig) -> Result<Self, ReconcilerError> {
        config.validate().map_err(ReconcilerError::Config)?;
        Ok(Self { config })
    }

    /// Create a reconciler with default configuration
    pub fn default_config() -> Self {
        Self {
            config: ReconcilerConfig::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Score a single record as of `now`, in [0, 100]
    pub fn score_source(&self, record: &SourceRecord, now: DateTime<Utc>) -> f64 {
        let freshness_penalty = (record.age_days(now) * self.config.freshness_decay_rate)
            .min(self.config.max_freshness_penalty);

        let verification_bonus = if record.is_verified {
            self.config.verification_bonus
        } else {
            0.0
        };

        (record.source_type.authority() - freshness_penalty + verification_bonus).clamp(0.0, 100.0)
    }

    /// Compare two candidate values
    ///
    /// Numbers (after currency/suffix normalisation) are compared by relative
    /// difference; anything else falls back to string similarity.
    pub fn compare_values(&self, a: &str, b: &str) -> ValueComparison {
        let numbers = (extract_number(a), extract_number(b));

        if a.trim() == b.trim() {
            let kind = match numbers {
                (Some(_), Some(_)) => ComparisonKind::Numeric,
                _ => ComparisonKind::Textual,
            };
            return ValueComparison {
                kind,
                relative_difference: 0.0,
                is_conflict: false,
            };
        }

        match numbers {
            (Some(x), Some(y)) => {
                let diff = relative_difference(x, y);
                ValueComparison {
                    kind: ComparisonKind::Numeric,
                    relative_difference: diff,
                    is_conflict: diff > self.config.numeric_conflict_threshold,
                }
            }
            _ => {
                let diff = 1.0 - string_similarity(a, b);
                ValueComparison {
                    kind: ComparisonKind::Textual,
                    relative_difference: diff,
                    is_conflict: diff > self.config.text_conflict_threshold,
                }
            }
        }
    }

    /// Compare two values, returning the comparison only when they conflict
    pub fn check_conflict(&self, a: &str, b: &str) -> Option<ValueComparison> {
        Some(self.compare_values(a, b)).filter(|c| c.is_conflict)
    }

    /// Reconcile one field as of the current time
    pub fn reconcile_field(
        &self,
        field_name: &str,
        kb_sources: &[SourceRecord],
        live_sources: &[SourceRecord],
    ) -> ReconciliationResult {
        self.reconcile_field_at(field_name, kb_sources, live_sources, Utc::now())
    }

    /// Reconcile one field as of `now`
    ///
    /// Deterministic for identical inputs and `now`.
    pub fn reconcile_field_at(
        &self,
        field_name: &str,
        kb_sources: &[SourceRecord],
        live_sources: &[SourceRecord],
        now: DateTime<Utc>,
    ) -> ReconciliationResult {
        // 1. Merge
        if kb_sources.is_empty() && live_sources.is_empty() {
            debug!("No sources for field '{}'", field_name);
            return ReconciliationResult::empty(field_name);
        }

        // 2. Score and rank; stable sort keeps input order among equals
        let mut ranked: Vec<RankedSource> = kb_sources
            .iter()
            .chain(live_sources)
            .map(|record| RankedSource {
                score: self.score_source(record, now),
                record: record.clone(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| {
                origin_rank(a.record.source_origin).cmp(&origin_rank(b.record.source_origin))
            })
        });

        // 3. Best value
        let top = &ranked[0];
        let best_value = top.record.value.clone();
        let confidence_score = top.score.round().clamp(0.0, 100.0) as u8;
        let confidence_level = ConfidenceLevel::from_score(confidence_score);

        // 4. Pairwise conflicts between distinct values
        let conflicts = self.detect_conflicts(&ranked);

        // 5. Review flag
        let top_two_disagree = ranked
            .get(1)
            .map(|second| {
                self.compare_values(&ranked[0].record.value, &second.record.value)
                    .is_conflict
            })
            .unwrap_or(false);
        let needs_review = (!conflicts.is_empty() && top_two_disagree)
            || confidence_level == ConfidenceLevel::Low;

        debug!(
            "Reconciled '{}': best='{}' score={} level={} candidates={} conflicts={} review={}",
            field_name,
            best_value,
            confidence_score,
            confidence_level,
            ranked.len(),
            conflicts.len(),
            needs_review
        );

        ReconciliationResult {
            field_name: field_name.to_string(),
            best_value,
            confidence_score,
            confidence_level,
            sources_used: ranked,
            conflicts,
            needs_review,
            reconciliation_method: METHOD_AUTHORITY.to_string(),
        }
    }

    /// Reconcile several fields as of `now`
    pub fn reconcile_fields(
        &self,
        fields: &BTreeMap<String, FieldSources>,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, ReconciliationResult> {
        fields
            .iter()
            .map(|(name, sources)| {
                (
                    name.clone(),
                    self.reconcile_field_at(name, &sources.kb, &sources.live, now),
                )
            })
            .collect()
    }

    fn detect_conflicts(&self, ranked: &[RankedSource]) -> Vec<Conflict> {
        // First (highest-ranked) record carrying each distinct value
        let mut distinct: Vec<&SourceRecord> = Vec::new();
        for candidate in ranked {
            let value = candidate.record.value.trim();
            if !distinct.iter().any(|r| r.value.trim() == value) {
                distinct.push(&candidate.record);
            }
        }

        let mut conflicts = Vec::new();
        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i + 1..] {
                if let Some(comparison) = self.check_conflict(&a.value, &b.value) {
                    conflicts.push(Conflict {
                        source_a: (*a).clone(),
                        source_b: (*b).clone(),
                        relative_difference: comparison.relative_difference,
                        kind: comparison.kind,
                    });
                }
            }
        }
        conflicts
    }
}

impl Default for SourceReconciler {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Knowledge-base records win score ties
fn origin_rank(origin: SourceOrigin) -> u8 {
    match origin {
        SourceOrigin::Kb => 0,
        SourceOrigin::Live => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use veracity_domain::SourceType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_undated_record_scores_at_authority() {
        let reconciler = SourceReconciler::default_config();
        for source_type in [
            SourceType::SecFiling,
            SourceType::WebsiteScrape,
            SourceType::NewsArticle,
            SourceType::Unknown,
        ] {
            let record = SourceRecord::kb("1", source_type, 1);
            let score = reconciler.score_source(&record, now());
            assert!((score - source_type.authority()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_year_old_record_scores_lower() {
        let reconciler = SourceReconciler::default_config();
        let fresh = SourceRecord::live("1", SourceType::ApiVerified, 1).with_as_of(now());
        let old = SourceRecord::live("1", SourceType::ApiVerified, 2)
            .with_as_of(now() - Duration::days(365));

        let fresh_score = reconciler.score_source(&fresh, now());
        let old_score = reconciler.score_source(&old, now());
        assert!(old_score < fresh_score);
        // 365 days * 0.05 points/day
        assert!((fresh_score - old_score - 18.25).abs() < 1e-6);
    }

    #[test]
    fn test_freshness_penalty_is_capped() {
        let reconciler = SourceReconciler::default_config();
        let ancient = SourceRecord::kb("1", SourceType::SecFiling, 1)
            .with_as_of(now() - Duration::days(365 * 30));
        let score = reconciler.score_source(&ancient, now());
        assert_eq!(score, 100.0 - MAX_PENALTY);
    }

    const MAX_PENALTY: f64 = crate::config::MAX_FRESHNESS_PENALTY;

    #[test]
    fn test_verification_bonus_and_clamp() {
        let reconciler = SourceReconciler::default_config();
        let scrape = SourceRecord::live("1", SourceType::WebsiteScrape, 1).verified();
        assert_eq!(reconciler.score_source(&scrape, now()), 60.0);

        let sec = SourceRecord::kb("1", SourceType::SecFiling, 1).verified();
        assert_eq!(reconciler.score_source(&sec, now()), 100.0);
    }

    #[test]
    fn test_check_conflict_numeric() {
        let reconciler = SourceReconciler::default_config();

        let conflict = reconciler.check_conflict("$1M", "$5M").unwrap();
        assert_eq!(conflict.kind, ComparisonKind::Numeric);
        assert!((conflict.relative_difference - 0.8).abs() < 1e-9);

        assert!(reconciler.check_conflict("$100", "$110").is_none());
        assert!(reconciler.check_conflict("$1.5M", "1,500,000").is_none());
    }

    #[test]
    fn test_check_conflict_textual() {
        let reconciler = SourceReconciler::default_config();
        assert!(reconciler.check_conflict("Austin, TX", "Berlin, Germany").is_some());
        assert!(reconciler.check_conflict("Jane Doe", "jane doe").is_none());

        let comparison = reconciler.compare_values("Austin", "$5M");
        assert_eq!(comparison.kind, ComparisonKind::Textual);
    }

    #[test]
    fn test_check_conflict_reflexive() {
        let reconciler = SourceReconciler::default_config();
        for value in ["$1M", "Austin, TX", "", "n/a", "1.2.3"] {
            assert!(reconciler.check_conflict(value, value).is_none());
        }
    }

    #[test]
    fn test_sec_beats_news() {
        let reconciler = SourceReconciler::default_config();
        let kb = vec![SourceRecord::kb("$50M", SourceType::SecFiling, 1)];
        let live = vec![SourceRecord::live("$80M", SourceType::NewsArticle, 2)];

        let result = reconciler.reconcile_field_at("annual_revenue", &kb, &live, now());

        assert_eq!(result.best_value, "$50M");
        assert_eq!(result.confidence_score, 100);
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].source_a.value, "$50M");
        assert!(result.needs_review);
        assert_eq!(result.reconciliation_method, "authority");
    }

    #[test]
    fn test_live_source_can_outrank_kb() {
        let reconciler = SourceReconciler::default_config();
        let kb = vec![SourceRecord::kb("120", SourceType::NewsArticle, 1)];
        let live = vec![SourceRecord::live("125", SourceType::ApiVerified, 2)];

        let result = reconciler.reconcile_field_at("employee_count", &kb, &live, now());
        assert_eq!(result.best_value, "125");
        assert!(result.conflicts.is_empty());
        assert!(!result.needs_review);
    }

    #[test]
    fn test_tie_prefers_kb() {
        let reconciler = SourceReconciler::default_config();
        let live = vec![SourceRecord::live("Austin", SourceType::WebsiteScrape, 2)];
        let kb = vec![SourceRecord::kb("Denver", SourceType::WebsiteScrape, 1)];

        let result = reconciler.reconcile_field_at("headquarters", &kb, &live, now());
        assert_eq!(result.best_value, "Denver");
        assert_eq!(result.sources_used[0].record.source_origin, SourceOrigin::Kb);
    }

    #[test]
    fn test_empty_sources() {
        let reconciler = SourceReconciler::default_config();
        let result = reconciler.reconcile_field_at("ceo", &[], &[], now());

        assert_eq!(result.best_value, "");
        assert_eq!(result.confidence_level, ConfidenceLevel::Low);
        assert!(result.sources_used.is_empty());
        assert!(result.needs_review);
    }

    #[test]
    fn test_low_confidence_needs_review_without_conflict() {
        let reconciler = SourceReconciler::default_config();
        let live = vec![SourceRecord::live("42", SourceType::AiExtracted, 1)];

        let result = reconciler.reconcile_field_at("market_share", &[], &live, now());
        assert_eq!(result.confidence_level, ConfidenceLevel::Low);
        assert!(result.conflicts.is_empty());
        assert!(result.needs_review);
    }

    #[test]
    fn test_conflict_below_top_two_is_not_material() {
        let reconciler = SourceReconciler::default_config();
        let kb = vec![
            SourceRecord::kb("$10M", SourceType::SecFiling, 1),
            SourceRecord::kb("$10.5M", SourceType::ClientProvided, 2),
        ];
        let live = vec![SourceRecord::live("$40M", SourceType::NewsArticle, 3)];

        let result = reconciler.reconcile_field_at("annual_revenue", &kb, &live, now());
        assert_eq!(result.best_value, "$10M");
        assert_eq!(result.conflicts.len(), 2);
        assert!(!result.needs_review);
    }

    #[test]
    fn test_duplicate_values_compared_once() {
        let reconciler = SourceReconciler::default_config();
        let kb = vec![
            SourceRecord::kb("$10M", SourceType::SecFiling, 1),
            SourceRecord::kb("$10M", SourceType::ApiVerified, 2),
        ];
        let live = vec![
            SourceRecord::live("$30M", SourceType::NewsArticle, 3),
            SourceRecord::live("$30M", SourceType::WebsiteScrape, 4),
        ];

        let result = reconciler.reconcile_field_at("annual_revenue", &kb, &live, now());
        assert_eq!(result.sources_used.len(), 4);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].source_a.source_id, 1);
        assert_eq!(result.conflicts[0].source_b.source_id, 4);
    }

    #[test]
    fn test_freshness_can_flip_ranking() {
        let reconciler = SourceReconciler::default_config();
        let kb = vec![SourceRecord::kb("200", SourceType::ManualEntry, 1)
            .with_as_of(now() - Duration::days(600))];
        let live = vec![SourceRecord::live("260", SourceType::PressRelease, 2).with_as_of(now())];

        let result = reconciler.reconcile_field_at("employee_count", &kb, &live, now());
        // 80 - 30 (capped) = 50 < 70
        assert_eq!(result.best_value, "260");
        assert_eq!(result.confidence_score, 70);
    }

    #[test]
    fn test_malformed_numbers_fall_back_to_text() {
        let reconciler = SourceReconciler::default_config();
        let kb = vec![SourceRecord::kb("$12..5M", SourceType::SecFiling, 1)];
        let live = vec![SourceRecord::live("twelve million", SourceType::NewsArticle, 2)];

        let result = reconciler.reconcile_field_at("annual_revenue", &kb, &live, now());
        assert_eq!(result.best_value, "$12..5M");
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ComparisonKind::Textual);
    }

    #[test]
    fn test_reconcile_fields_batch() {
        let reconciler = SourceReconciler::default_config();
        let mut fields = BTreeMap::new();
        fields.insert(
            "ceo".to_string(),
            FieldSources::new(vec![SourceRecord::kb("Jane Doe", SourceType::PressRelease, 1)], vec![]),
        );
        fields.insert("pricing".to_string(), FieldSources::default());

        let results = reconciler.reconcile_fields(&fields, now());
        assert_eq!(results.len(), 2);
        assert_eq!(results["ceo"].best_value, "Jane Doe");
        assert_eq!(results["pricing"].confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ReconcilerConfig::default();
        config.max_freshness_penalty = -5.0;
        assert!(matches!(
            SourceReconciler::new(config),
            Err(ReconcilerError::Config(_))
        ));
    }
}
