//! Unified per-competitor context for the generation step
//!
//! Aggregates reconciled fields, knowledge-base retrieval text and live data
//! into a single bundle. Built fresh per request; nothing is persisted here.

use crate::config::ContextConfig;
use crate::engine::SourceReconciler;
use crate::error::ReconcilerError;
use crate::types::{FieldSources, ReconciliationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A knowledge-base document cited by the retrieval step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbCitation {
    /// Document identifier
    pub document_id: String,

    /// Document title, if known
    #[serde(default)]
    pub title: Option<String>,

    /// Retrieval relevance [0.0, 1.0]
    #[serde(default)]
    pub relevance: f64,
}

/// Retrieved knowledge-base text with the documents it came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KbContext {
    /// Concatenated retrieval text
    pub text: String,

    /// Documents the text was drawn from
    pub citations: Vec<KbCitation>,
}

/// Data feed for context building
///
/// Implemented by the retrieval / data-collection layer, which owns all I/O.
#[allow(async_fn_in_trait)]
pub trait ContextSource {
    /// Error type for fetch operations
    type Error: fmt::Display;

    /// Knowledge-base text relevant to `query` for a competitor
    async fn kb_context(&self, competitor_id: i64, query: &str) -> Result<KbContext, Self::Error>;

    /// All observations of one field for a competitor
    async fn field_sources(
        &self,
        competitor_id: i64,
        field_name: &str,
    ) -> Result<FieldSources, Self::Error>;

    /// Raw live data for a competitor
    async fn live_data(&self, competitor_id: i64) -> Result<Map<String, Value>, Self::Error>;
}

/// Conflict overview across all reconciled fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictSummary {
    /// Conflicts across all fields
    pub total_conflicts: usize,

    /// Fields with at least one conflict
    pub fields_with_conflicts: Vec<String>,

    /// Fields flagged for human review
    pub fields_needing_review: Vec<String>,
}

/// Age overview across all reconciled fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreshnessSummary {
    /// Earliest `data_as_of_date` among all candidates
    pub oldest_data_date: Option<DateTime<Utc>>,

    /// Latest `data_as_of_date` among all candidates
    pub newest_data_date: Option<DateTime<Utc>>,

    /// Candidates without a date
    pub undated_sources: usize,

    /// Fields whose winning source is older than the stale threshold
    pub stale_fields: Vec<String>,
}

/// Everything known about one competitor for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedContext {
    /// Competitor identifier
    pub competitor_id: i64,

    /// Competitor display name
    pub competitor_name: String,

    /// Reconciled fields by name
    pub reconciled_fields: BTreeMap<String, ReconciliationResult>,

    /// Knowledge-base retrieval text
    pub kb_context: String,

    /// Documents behind `kb_context`
    pub kb_citations: Vec<KbCitation>,

    /// Raw live data
    pub live_data: Map<String, Value>,

    /// Conflict overview
    pub conflicts_summary: ConflictSummary,

    /// Age overview
    pub freshness_summary: FreshnessSummary,

    /// Candidates considered across all fields
    pub total_sources: usize,

    /// Knowledge-base candidates
    pub kb_sources: usize,

    /// Live candidates
    pub live_sources: usize,
}

impl UnifiedContext {
    /// Render the context as plain text for a generation prompt
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Competitor: {} (id {})\n",
            self.competitor_name, self.competitor_id
        ));
        out.push_str(&format!(
            "Sources: {} total ({} knowledge base, {} live)\n\n",
            self.total_sources, self.kb_sources, self.live_sources
        ));

        if !self.reconciled_fields.is_empty() {
            out.push_str("Reconciled fields:\n");
            for (name, field) in &self.reconciled_fields {
                out.push_str(&format!(
                    "- {}: {} (confidence {}, {})\n",
                    name, field.best_value, field.confidence_score, field.confidence_level
                ));
                for conflict in &field.conflicts {
                    out.push_str(&format!(
                        "  conflict: {} ({}) vs {} ({}), {:.0}% apart\n",
                        conflict.source_a.value,
                        conflict.source_a.source_type,
                        conflict.source_b.value,
                        conflict.source_b.source_type,
                        conflict.relative_difference * 100.0
                    ));
                }
                if field.needs_review {
                    out.push_str("  needs review\n");
                }
            }
            out.push('\n');
        }

        if !self.freshness_summary.stale_fields.is_empty() {
            out.push_str(&format!(
                "Stale fields: {}\n\n",
                self.freshness_summary.stale_fields.join(", ")
            ));
        }

        if !self.kb_context.is_empty() {
            out.push_str("Knowledge base:\n---\n");
            out.push_str(&self.kb_context);
            out.push_str("\n---\n");
        }

        out
    }
}

/// Builds [`UnifiedContext`] bundles from a [`ContextSource`]
///
/// Fields are fetched and reconciled one after another. A field whose fetch
/// fails is logged and left out; a failed knowledge-base or live-data fetch
/// leaves that part empty. Building a context never fails.
pub struct UnifiedContextBuilder<S: ContextSource> {
    source: S,
    reconciler: SourceReconciler,
    config: ContextConfig,
}

impl<S: ContextSource> UnifiedContextBuilder<S> {
    /// Create a builder
    pub fn new(
        source: S,
        reconciler: SourceReconciler,
        config: ContextConfig,
    ) -> Result<Self, ReconcilerError> {
        config.validate().map_err(ReconcilerError::Config)?;
        Ok(Self {
            source,
            reconciler,
            config,
        })
    }

    /// Create a builder with default reconciler and fields
    pub fn with_defaults(source: S) -> Self {
        Self {
            source,
            reconciler: SourceReconciler::default_config(),
            config: ContextConfig::default(),
        }
    }

    /// Active context configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Build the unified context for a competitor as of the current time
    pub async fn get_unified_context(
        &self,
        competitor_id: i64,
        competitor_name: &str,
        query: &str,
    ) -> UnifiedContext {
        self.get_unified_context_at(competitor_id, competitor_name, query, Utc::now())
            .await
    }

    /// Fetch and reconcile one field for a competitor as of `now`
    ///
    /// `Ok(None)` when the source has no observations for the field.
    pub async fn reconcile_competitor_field(
        &self,
        competitor_id: i64,
        field_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ReconciliationResult>, ReconcilerError> {
        let sources = self
            .source
            .field_sources(competitor_id, field_name)
            .await
            .map_err(|e| ReconcilerError::Source(format!("field '{}': {}", field_name, e)))?;

        if sources.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.reconciler.reconcile_field_at(
            field_name,
            &sources.kb,
            &sources.live,
            now,
        )))
    }

    /// Build the unified context for a competitor as of `now`
    pub async fn get_unified_context_at(
        &self,
        competitor_id: i64,
        competitor_name: &str,
        query: &str,
        now: DateTime<Utc>,
    ) -> UnifiedContext {
        let start = Instant::now();

        let mut reconciled_fields = BTreeMap::new();
        for field_name in &self.config.fields {
            match self.reconcile_competitor_field(competitor_id, field_name, now).await {
                Ok(Some(result)) => {
                    reconciled_fields.insert(field_name.clone(), result);
                }
                Ok(None) => debug!("No sources for field '{}', skipping", field_name),
                Err(e) => warn!(
                    "Skipping field '{}' of competitor {}: {}",
                    field_name, competitor_id, e
                ),
            }
        }

        let kb = match self.source.kb_context(competitor_id, query).await {
            Ok(kb) => kb,
            Err(e) => {
                warn!(
                    "Knowledge-base retrieval failed for competitor {}: {}",
                    competitor_id, e
                );
                KbContext::default()
            }
        };

        let live_data = match self.source.live_data(competitor_id).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Live data fetch failed for competitor {}: {}", competitor_id, e);
                Map::new()
            }
        };

        let (kb_sources, live_sources) = count_by_origin(&reconciled_fields);
        let conflicts_summary = summarize_conflicts(&reconciled_fields);
        let freshness_summary =
            summarize_freshness(&reconciled_fields, now, self.config.stale_after_days);

        info!(
            "Built context for '{}' ({}): {} fields, {} sources, {} conflicts in {}ms",
            competitor_name,
            competitor_id,
            reconciled_fields.len(),
            kb_sources + live_sources,
            conflicts_summary.total_conflicts,
            start.elapsed().as_millis()
        );

        UnifiedContext {
            competitor_id,
            competitor_name: competitor_name.to_string(),
            reconciled_fields,
            kb_context: kb.text,
            kb_citations: kb.citations,
            live_data,
            conflicts_summary,
            freshness_summary,
            total_sources: kb_sources + live_sources,
            kb_sources,
            live_sources,
        }
    }
}

fn count_by_origin(fields: &BTreeMap<String, ReconciliationResult>) -> (usize, usize) {
    use veracity_domain::SourceOrigin;

    fields
        .values()
        .flat_map(|field| &field.sources_used)
        .fold((0, 0), |(kb, live), ranked| match ranked.record.source_origin {
            SourceOrigin::Kb => (kb + 1, live),
            SourceOrigin::Live => (kb, live + 1),
        })
}

fn summarize_conflicts(fields: &BTreeMap<String, ReconciliationResult>) -> ConflictSummary {
    let mut summary = ConflictSummary::default();
    for (name, field) in fields {
        summary.total_conflicts += field.conflicts.len();
        if field.has_conflicts() {
            summary.fields_with_conflicts.push(name.clone());
        }
        if field.needs_review {
            summary.fields_needing_review.push(name.clone());
        }
    }
    summary
}

fn summarize_freshness(
    fields: &BTreeMap<String, ReconciliationResult>,
    now: DateTime<Utc>,
    stale_after_days: i64,
) -> FreshnessSummary {
    let mut summary = FreshnessSummary::default();

    for (name, field) in fields {
        for ranked in &field.sources_used {
            match ranked.record.data_as_of_date {
                Some(date) => {
                    summary.oldest_data_date =
                        Some(summary.oldest_data_date.map_or(date, |d| d.min(date)));
                    summary.newest_data_date =
                        Some(summary.newest_data_date.map_or(date, |d| d.max(date)));
                }
                None => summary.undated_sources += 1,
            }
        }

        if let Some(top) = field.top_source() {
            if top.record.age_days(now) > stale_after_days as f64 {
                summary.stale_fields.push(name.clone());
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use veracity_domain::{SourceRecord, SourceType};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct MockSource {
        fields: HashMap<String, FieldSources>,
        failing_fields: Vec<String>,
        kb: Option<KbContext>,
        live: Option<Map<String, Value>>,
    }

    impl ContextSource for MockSource {
        type Error = String;

        async fn kb_context(&self, _competitor_id: i64, _query: &str) -> Result<KbContext, String> {
            self.kb.clone().ok_or_else(|| "vector store unavailable".to_string())
        }

        async fn field_sources(&self, _competitor_id: i64, field: &str) -> Result<FieldSources, String> {
            if self.failing_fields.iter().any(|f| f == field) {
                return Err(format!("timeout fetching {}", field));
            }
            Ok(self.fields.get(field).cloned().unwrap_or_default())
        }

        async fn live_data(&self, _competitor_id: i64) -> Result<Map<String, Value>, String> {
            self.live.clone().ok_or_else(|| "provider down".to_string())
        }
    }

    fn populated_source() -> MockSource {
        let mut fields = HashMap::new();
        fields.insert(
            "annual_revenue".to_string(),
            FieldSources::new(
                vec![SourceRecord::kb("$50M", SourceType::SecFiling, 1)
                    .with_as_of(now() - Duration::days(400))],
                vec![SourceRecord::live("$90M", SourceType::NewsArticle, 2).with_as_of(now())],
            ),
        );
        fields.insert(
            "headquarters".to_string(),
            FieldSources::new(vec![], vec![SourceRecord::live("Austin, TX", SourceType::ApiVerified, 3)]),
        );

        let mut live = Map::new();
        live.insert("website".to_string(), Value::String("https://acme.example".to_string()));

        MockSource {
            fields,
            failing_fields: vec!["employee_count".to_string()],
            kb: Some(KbContext {
                text: "Acme sells anvils.".to_string(),
                citations: vec![KbCitation {
                    document_id: "7".to_string(),
                    title: Some("Acme 10-K".to_string()),
                    relevance: 0.9,
                }],
            }),
            live: Some(live),
        }
    }

    #[tokio::test]
    async fn test_builds_context_and_skips_failed_fields() {
        let builder = UnifiedContextBuilder::with_defaults(populated_source());
        let context = builder
            .get_unified_context_at(42, "Acme", "revenue", now())
            .await;

        assert_eq!(context.competitor_id, 42);
        assert_eq!(context.reconciled_fields.len(), 2);
        assert!(!context.reconciled_fields.contains_key("employee_count"));
        assert_eq!(context.reconciled_fields["annual_revenue"].best_value, "$50M");

        assert_eq!(context.total_sources, 3);
        assert_eq!(context.kb_sources, 1);
        assert_eq!(context.live_sources, 2);

        assert_eq!(context.kb_context, "Acme sells anvils.");
        assert_eq!(context.kb_citations.len(), 1);
        assert!(context.live_data.contains_key("website"));
    }

    #[tokio::test]
    async fn test_field_fetch_error_is_returned() {
        let builder = UnifiedContextBuilder::with_defaults(populated_source());

        let err = builder
            .reconcile_competitor_field(42, "employee_count", now())
            .await
            .unwrap_err();
        match err {
            ReconcilerError::Source(message) => {
                assert!(message.contains("employee_count"));
                assert!(message.contains("timeout"));
            }
            other => panic!("expected source error, got {:?}", other),
        }

        let missing = builder.reconcile_competitor_field(42, "ceo", now()).await.unwrap();
        assert!(missing.is_none());

        let revenue = builder
            .reconcile_competitor_field(42, "annual_revenue", now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(revenue.best_value, "$50M");
    }

    #[tokio::test]
    async fn test_summaries() {
        let builder = UnifiedContextBuilder::with_defaults(populated_source());
        let context = builder
            .get_unified_context_at(42, "Acme", "revenue", now())
            .await;

        assert_eq!(context.conflicts_summary.total_conflicts, 1);
        assert_eq!(context.conflicts_summary.fields_with_conflicts, vec!["annual_revenue"]);
        assert_eq!(context.conflicts_summary.fields_needing_review, vec!["annual_revenue"]);

        let freshness = &context.freshness_summary;
        assert_eq!(freshness.oldest_data_date, Some(now() - Duration::days(400)));
        assert_eq!(freshness.newest_data_date, Some(now()));
        assert_eq!(freshness.undated_sources, 1);
        assert_eq!(freshness.stale_fields, vec!["annual_revenue"]);
    }

    #[tokio::test]
    async fn test_failed_retrieval_degrades_to_empty() {
        let source = MockSource::default();
        let builder = UnifiedContextBuilder::with_defaults(source);
        let context = builder.get_unified_context_at(1, "Nobody", "", now()).await;

        assert!(context.reconciled_fields.is_empty());
        assert!(context.kb_context.is_empty());
        assert!(context.live_data.is_empty());
        assert_eq!(context.total_sources, 0);
    }

    #[tokio::test]
    async fn test_render_mentions_conflicts() {
        let builder = UnifiedContextBuilder::with_defaults(populated_source());
        let context = builder
            .get_unified_context_at(42, "Acme", "revenue", now())
            .await;
        let text = context.render();

        assert!(text.contains("Competitor: Acme (id 42)"));
        assert!(text.contains("- annual_revenue: $50M"));
        assert!(text.contains("conflict: $50M (sec_filing) vs $90M (news_article)"));
        assert!(text.contains("Stale fields: annual_revenue"));
        assert!(text.contains("Acme sells anvils."));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ContextConfig::default().with_fields(Vec::<String>::new());
        assert!(UnifiedContextBuilder::new(MockSource::default(), SourceReconciler::default(), config).is_ok());

        let mut config = ContextConfig::default();
        config.stale_after_days = -1;
        assert!(UnifiedContextBuilder::new(MockSource::default(), SourceReconciler::default(), config).is_err());
    }
}
