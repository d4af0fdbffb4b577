//! Veracity Reconciler
//!
//! Picks a single best value for each field of a competitor profile out of
//! conflicting observations, and bundles the results into a unified context
//! for the generation step.
//!
//! # Overview
//!
//! ```text
//! SourceRecords (KB + live) → SourceReconciler → ReconciliationResult
//!                                      ↓
//!           ContextSource → UnifiedContextBuilder → UnifiedContext
//! ```
//!
//! Scoring per candidate:
//!
//! | Term | Value |
//! |------|-------|
//! | Authority | fixed per source type (SEC filing 100 ... unknown 10) |
//! | Freshness penalty | age in days × decay rate, capped |
//! | Verification bonus | added for human-verified records |
//!
//! Two values conflict when their relative difference (numeric) or
//! dissimilarity (text) exceeds 20%.
//!
//! # Example
//!
//! ```
//! use veracity_domain::{SourceRecord, SourceType, ConfidenceLevel};
//! use veracity_reconciler::{ReconcilerConfig, SourceReconciler};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reconciler = SourceReconciler::new(ReconcilerConfig::default())?;
//!
//! let kb = vec![SourceRecord::kb("1,200", SourceType::ClientProvided, 10)];
//! let live = vec![SourceRecord::live("1,250", SourceType::WebsiteScrape, 11)];
//! let result = reconciler.reconcile_field("employee_count", &kb, &live);
//!
//! assert_eq!(result.best_value, "1,200");
//! assert_eq!(result.confidence_level, ConfidenceLevel::High);
//! assert!(!result.needs_review);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! freshness_decay_rate = 0.05
//! max_freshness_penalty = 30.0
//! verification_bonus = 10.0
//! numeric_conflict_threshold = 0.2
//! text_conflict_threshold = 0.2
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod engine;
mod error;
mod types;

pub use config::{
    ContextConfig, ReconcilerConfig, CONFLICT_THRESHOLD_NUMERIC, FRESHNESS_DECAY_RATE,
    MAX_FRESHNESS_PENALTY, VERIFICATION_BONUS,
};
pub use context::{
    ConflictSummary, ContextSource, FreshnessSummary, KbCitation, KbContext, UnifiedContext,
    UnifiedContextBuilder,
};
pub use engine::SourceReconciler;
pub use error::ReconcilerError;
pub use types::{
    ComparisonKind, Conflict, FieldSources, RankedSource, ReconciliationResult, ValueComparison,
    METHOD_AUTHORITY,
};
