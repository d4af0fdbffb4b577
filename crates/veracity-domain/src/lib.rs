//! Veracity Domain Layer
//!
//! Shared vocabulary for the data trust layer. Both engines (source
//! reconciliation and citation validation) depend on this crate; it has no
//! knowledge of either engine and performs no I/O.
//!
//! ## Key Concepts
//!
//! - **Source record**: one observation of one field from one source
//! - **Source type**: an authority class with a fixed base score
//! - **Confidence level**: the high / moderate / low banding used everywhere
//! - **Corpus**: the knowledge-base, competitor and external-source snapshot
//!   citations are checked against
//! - **Value parsing / similarity**: number extraction from free-form values,
//!   string and trigram similarity

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod corpus;
pub mod similarity;
pub mod source;
pub mod value;

// Re-exports for convenience
pub use confidence::ConfidenceLevel;
pub use corpus::{Competitor, ExternalSource, KbDocument, SourceCorpus};
pub use similarity::{string_similarity, trigram_similarity};
pub use source::{SourceOrigin, SourceRecord, SourceType};
pub use value::{extract_number, relative_difference};
