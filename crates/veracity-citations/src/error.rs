//! Citation validator error types

use thiserror::Error;

/// Errors that can occur when constructing a validator
///
/// Validation itself never fails: unresolved citations and unsourced claims
/// are reported in the result.
#[derive(Error, Debug)]
pub enum CitationError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A built-in pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(String),
}
