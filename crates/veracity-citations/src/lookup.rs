//! Alias tables mapping every way a source might be cited to the source itself

use crate::types::MatchedSource;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use veracity_domain::{Competitor, SourceCorpus};

/// Minimum reference length for competitor substring matching
const MIN_SUBSTRING_LEN: usize = 3;

/// Normalise a reference for lookup: case, whitespace, wrapping quotes,
/// trailing punctuation and a leading "the " are ignored.
pub fn normalize_key(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let trimmed = collapsed
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’'))
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
        .trim();
    trimmed.strip_prefix("the ").unwrap_or(trimmed).trim().to_string()
}

/// URL form used for matching: no scheme, no `www.`, no trailing slash
fn normalize_url(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.trim_end_matches('/').to_string()
}

/// Normalised key → entry index. The first registration of a key wins.
#[derive(Debug, Default)]
struct AliasTable {
    entries: HashMap<String, usize>,
}

impl AliasTable {
    fn register(&mut self, alias: &str, index: usize) {
        let key = normalize_key(alias);
        if key.is_empty() {
            return;
        }
        self.entries.entry(key).or_insert(index);
    }

    fn get(&self, reference: &str) -> Option<usize> {
        self.entries.get(&normalize_key(reference)).copied()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Resolves citation references against a corpus snapshot
///
/// Built once per validator; lookups never fail, an unknown reference is
/// simply `None`.
#[derive(Debug)]
pub struct SourceLookup {
    corpus: SourceCorpus,
    knowledge_base: AliasTable,
    competitors: AliasTable,
    external: AliasTable,
    generic: HashSet<String>,
}

impl SourceLookup {
    /// Index a corpus. `generic_references` are accepted as internal sources.
    pub fn new(corpus: SourceCorpus, generic_references: &[String]) -> Self {
        let mut knowledge_base = AliasTable::default();
        for (index, doc) in corpus.documents.iter().enumerate() {
            knowledge_base.register(&doc.id, index);
            knowledge_base.register(&format!("kb-{}", doc.id), index);
            knowledge_base.register(&format!("doc-{}", doc.id), index);
            if let Some(title) = &doc.title {
                knowledge_base.register(title, index);
            }
        }
        // Ordinal aliases come last so a literal id always takes precedence
        for index in 0..corpus.documents.len() {
            let ordinal = index + 1;
            knowledge_base.register(&format!("source {}", ordinal), index);
            knowledge_base.register(&format!("source{}", ordinal), index);
            knowledge_base.register(&format!("kb-{}", ordinal), index);
            knowledge_base.register(&ordinal.to_string(), index);
        }

        let mut competitors = AliasTable::default();
        for (index, competitor) in corpus.competitors.iter().enumerate() {
            competitors.register(&competitor.name, index);
            competitors.register(&competitor.id.to_string(), index);
        }

        let mut external = AliasTable::default();
        for (index, source) in corpus.external_sources.iter().enumerate() {
            external.register(&source.url, index);
            external.register(&normalize_url(&source.url), index);
            external.register(&source.name, index);
        }

        let generic = generic_references
            .iter()
            .map(|r| normalize_key(r))
            .filter(|r| !r.is_empty())
            .collect();

        debug!(
            kb_aliases = knowledge_base.len(),
            competitor_aliases = competitors.len(),
            external_aliases = external.len(),
            "Built citation lookup tables"
        );

        Self {
            corpus,
            knowledge_base,
            competitors,
            external,
            generic,
        }
    }

    /// The indexed corpus
    pub fn corpus(&self) -> &SourceCorpus {
        &self.corpus
    }

    /// Resolve a reference: knowledge base, competitor, generic internal
    /// reference, competitor substring, then external source.
    pub fn resolve(&self, reference: &str) -> Option<MatchedSource> {
        let key = normalize_key(reference);
        if key.is_empty() {
            return None;
        }

        if let Some(doc) = self.knowledge_base.get(&key).and_then(|i| self.corpus.documents.get(i)) {
            return Some(MatchedSource::KnowledgeBase(doc.clone()));
        }

        if let Some(competitor) = self.competitors.get(&key).and_then(|i| self.corpus.competitors.get(i)) {
            return Some(MatchedSource::Competitor(competitor.clone()));
        }

        if self.generic.contains(&key) {
            return Some(MatchedSource::Internal { reference: key });
        }

        if let Some(competitor) = self.competitor_by_substring(&key) {
            return Some(MatchedSource::Competitor(competitor.clone()));
        }

        self.external
            .get(&key)
            .or_else(|| self.external.get(&normalize_url(&key)))
            .and_then(|i| self.corpus.external_sources.get(i))
            .map(|source| MatchedSource::External(source.clone()))
    }

    fn competitor_by_substring(&self, key: &str) -> Option<&Competitor> {
        if key.chars().count() < MIN_SUBSTRING_LEN {
            return None;
        }
        self.corpus.competitors.iter().find(|competitor| {
            let name = normalize_key(&competitor.name);
            name.chars().count() >= MIN_SUBSTRING_LEN && (name.contains(key) || key.contains(&name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENERIC_REFERENCES;
    use veracity_domain::{ExternalSource, KbDocument};

    fn generic() -> Vec<String> {
        DEFAULT_GENERIC_REFERENCES.iter().map(|s| s.to_string()).collect()
    }

    fn corpus() -> SourceCorpus {
        SourceCorpus::new()
            .with_document(KbDocument::new("101", "Acme revenue was $48M in 2024.").with_title("Acme 10-K"))
            .with_document(KbDocument::new("102", "Globex has 1,500 employees."))
            .with_document(KbDocument::new("3", "Initech pricing starts at $99."))
            .with_competitor(Competitor::new(7, "Acme Corp"))
            .with_competitor(Competitor::new(8, "Globex"))
            .with_external_source(ExternalSource::new("https://www.example.com/report/", "Example Research"))
    }

    fn kb_id(source: Option<MatchedSource>) -> Option<String> {
        match source {
            Some(MatchedSource::KnowledgeBase(doc)) => Some(doc.id),
            _ => None,
        }
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  KB-3 "), "kb-3");
        assert_eq!(normalize_key("The   Knowledge Base."), "knowledge base");
        assert_eq!(normalize_key("\"Acme Corp\""), "acme corp");
        assert_eq!(normalize_key("..."), "");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://www.Example.com/report/"), "example.com/report");
        assert_eq!(normalize_url("http://example.com"), "example.com");
    }

    #[test]
    fn test_kb_aliases() {
        let lookup = SourceLookup::new(corpus(), &generic());
        assert_eq!(kb_id(lookup.resolve("101")), Some("101".to_string()));
        assert_eq!(kb_id(lookup.resolve("KB-101")), Some("101".to_string()));
        assert_eq!(kb_id(lookup.resolve("doc-102")), Some("102".to_string()));
        assert_eq!(kb_id(lookup.resolve("acme 10-k")), Some("101".to_string()));
        assert_eq!(kb_id(lookup.resolve("Source 2")), Some("102".to_string()));
        assert_eq!(kb_id(lookup.resolve("source2")), Some("102".to_string()));
    }

    #[test]
    fn test_literal_id_beats_ordinal() {
        let lookup = SourceLookup::new(corpus(), &generic());
        // "3" is both the id of the third document and its ordinal
        assert_eq!(kb_id(lookup.resolve("3")), Some("3".to_string()));
        // "1" is only an ordinal
        assert_eq!(kb_id(lookup.resolve("1")), Some("101".to_string()));
        assert_eq!(kb_id(lookup.resolve("KB-3")), Some("3".to_string()));
        assert_eq!(lookup.resolve("KB-4"), None);
    }

    #[test]
    fn test_competitor_lookup() {
        let lookup = SourceLookup::new(corpus(), &generic());
        assert!(matches!(lookup.resolve("Acme Corp"), Some(MatchedSource::Competitor(c)) if c.id == 7));
        assert!(matches!(lookup.resolve("8"), Some(MatchedSource::Competitor(c)) if c.id == 8));
        // Substring, either direction
        assert!(matches!(lookup.resolve("Acme"), Some(MatchedSource::Competitor(c)) if c.id == 7));
        assert!(matches!(
            lookup.resolve("Globex annual report"),
            Some(MatchedSource::Competitor(c)) if c.id == 8
        ));
        // Too short for substring matching
        assert_eq!(lookup.resolve("Ac"), None);
    }

    #[test]
    fn test_generic_references() {
        let lookup = SourceLookup::new(corpus(), &generic());
        assert!(matches!(
            lookup.resolve("the knowledge base"),
            Some(MatchedSource::Internal { reference }) if reference == "knowledge base"
        ));

        let strict = SourceLookup::new(corpus(), &[]);
        assert_eq!(strict.resolve("internal database"), None);
    }

    #[test]
    fn test_external_lookup() {
        let lookup = SourceLookup::new(corpus(), &generic());
        for reference in [
            "https://www.example.com/report/",
            "example.com/report",
            "http://example.com/report",
            "Example Research",
        ] {
            assert!(
                matches!(lookup.resolve(reference), Some(MatchedSource::External(_))),
                "{reference} should resolve"
            );
        }
    }

    #[test]
    fn test_unknown_reference() {
        let lookup = SourceLookup::new(corpus(), &generic());
        assert_eq!(lookup.resolve("Bloomberg"), None);
        assert_eq!(lookup.resolve(""), None);
        assert_eq!(lookup.resolve("  "), None);
    }

    #[test]
    fn test_empty_corpus() {
        let lookup = SourceLookup::new(SourceCorpus::new(), &generic());
        assert_eq!(lookup.resolve("1"), None);
        assert!(lookup.resolve("competitor database").is_some());
    }
}
