//! Read-only snapshot of the sources a generated answer may cite
//!
//! The retrieval collaborator owns storage and search; these types are the
//! shape it hands over when a validator is constructed.

use serde::{Deserialize, Serialize};

/// A knowledge-base document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbDocument {
    /// Document identifier
    pub id: String,

    /// Optional human title
    #[serde(default)]
    pub title: Option<String>,

    /// Document text
    #[serde(default)]
    pub content: String,

    /// Analyst notes attached to the document
    #[serde(default)]
    pub notes: Option<String>,
}

impl KbDocument {
    /// Create a document with content only
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            content: content.into(),
            notes: None,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Content and notes joined, as used for content checks
    pub fn searchable_text(&self) -> String {
        match &self.notes {
            Some(notes) if !notes.is_empty() => format!("{}\n{}", self.content, notes),
            _ => self.content.clone(),
        }
    }
}

/// A tracked competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    /// Competitor identifier
    pub id: i64,

    /// Display name
    pub name: String,

    /// Profile text, if any
    #[serde(default)]
    pub description: Option<String>,
}

impl Competitor {
    /// Create a competitor entry
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
        }
    }

    /// Set the profile text
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An external (web) source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSource {
    /// Source URL
    pub url: String,

    /// Publisher or page name
    pub name: String,

    /// Captured page text, if any
    #[serde(default)]
    pub content: Option<String>,
}

impl ExternalSource {
    /// Create an external source entry
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            content: None,
        }
    }

    /// Set the captured page text
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Everything a citation may legitimately point at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCorpus {
    /// Knowledge-base documents, in retrieval order
    #[serde(default)]
    pub documents: Vec<KbDocument>,

    /// Competitor roster
    #[serde(default)]
    pub competitors: Vec<Competitor>,

    /// External sources
    #[serde(default)]
    pub external_sources: Vec<ExternalSource>,
}

impl SourceCorpus {
    /// Create an empty corpus
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a knowledge-base document
    pub fn with_document(mut self, document: KbDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Add a competitor
    pub fn with_competitor(mut self, competitor: Competitor) -> Self {
        self.competitors.push(competitor);
        self
    }

    /// Add an external source
    pub fn with_external_source(mut self, source: ExternalSource) -> Self {
        self.external_sources.push(source);
        self
    }

    /// Total number of entries across all tables
    pub fn len(&self) -> usize {
        self.documents.len() + self.competitors.len() + self.external_sources.len()
    }

    /// Whether the corpus has no entries at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
