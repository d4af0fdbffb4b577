//! Veracity Citation Validator
//!
//! The last check before a generated answer reaches a user: every source the
//! answer claims is looked up in the corpus it was generated from, citations
//! that point nowhere are replaced with a neutral marker, and factual-looking
//! figures with no citation nearby are flagged.
//!
//! ## Recognised citations
//!
//! | Idiom            | Example                          |
//! |------------------|----------------------------------|
//! | `[Source: X]`    | `[Source: KB-3]`                 |
//! | `[Source N]`     | `[Source 2]`                     |
//! | `[N]`            | `[4]`                            |
//! | `(Source: X)`    | `(Source: Acme 10-K)`            |
//! | `According to X` | `..., according to Gartner, ...` |
//! | `Per X`          | `Per Gartner, ...`               |
//!
//! References resolve against knowledge-base documents (by id, `KB-{id}`,
//! title or position), competitors (by name, id or partial name), a short
//! list of generic internal references, and external sources (by URL or name).
//!
//! ## Example
//!
//! ```
//! use veracity_citations::CitationValidator;
//! use veracity_domain::{KbDocument, SourceCorpus};
//!
//! let corpus = SourceCorpus::new()
//!     .with_document(KbDocument::new("1", "Revenue was $5M."))
//!     .with_document(KbDocument::new("2", "Headcount is 40."));
//! let validator = CitationValidator::with_defaults(corpus).unwrap();
//!
//! let ok = validator.validate("Acme made $5M in revenue [Source: KB-1].", None);
//! assert!(ok.is_valid);
//!
//! let bad = validator.validate("Acme made $5M in revenue [Source: KB-7].", None);
//! assert!(!bad.is_valid);
//! assert_eq!(bad.cleaned_response, "Acme made $5M in revenue [citation removed].");
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! low_similarity_threshold = 0.30
//! claim_window = 100
//! max_unsourced_claims = 5
//! deep_check_min_words = 5
//! deep_check_coverage = 0.80
//! removal_marker = "[citation removed]"
//! detect_unsourced_claims = true
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod lookup;
mod patterns;
mod types;
mod validator;

pub use config::{CitationConfig, CITATION_REMOVED_MARKER, DEFAULT_GENERIC_REFERENCES};
pub use error::CitationError;
pub use lookup::{normalize_key, SourceLookup};
pub use types::{
    Citation, CitationKind, CitationMatch, ClaimKind, MatchedSource, UnsourcedClaim, ValidationResult,
};
pub use validator::CitationValidator;
