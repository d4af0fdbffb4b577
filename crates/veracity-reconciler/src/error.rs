//! Reconciler error types

use thiserror::Error;

/// Errors that can occur when setting up reconciliation or fetching a field
///
/// Data problems such as unparseable values or empty candidate sets never
/// surface here; they lower confidence instead. A full context build logs
/// field fetch errors and drops the field.
#[derive(Error, Debug)]
pub enum ReconcilerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Context source (retrieval collaborator) error
    #[error("Context source error: {0}")]
    Source(String),
}
