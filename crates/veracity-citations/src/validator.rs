//! Citation validation: resolve every citation, flag unsourced claims,
//! and strip what cannot be backed by a real source.

use crate::config::CitationConfig;
use crate::error::CitationError;
use crate::lookup::SourceLookup;
use crate::patterns::{self, CitationSpan};
use crate::types::{Citation, CitationKind, CitationMatch, MatchedSource, UnsourcedClaim, ValidationResult};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use veracity_domain::{trigram_similarity, SourceCorpus};

/// Validates the citations in generated answers against a source corpus
///
/// The corpus is indexed once at construction. `validate` never fails: every
/// data problem becomes a flag, a warning or a removal in the result.
#[derive(Debug)]
pub struct CitationValidator {
    config: CitationConfig,
    lookup: SourceLookup,
}

impl CitationValidator {
    /// Create a validator for `corpus`
    pub fn new(corpus: SourceCorpus, config: CitationConfig) -> Result<Self, CitationError> {
        config.validate().map_err(CitationError::Config)?;
        if let Some(name) = patterns::first_broken_pattern() {
            return Err(CitationError::Pattern(format!("pattern '{}' failed to compile", name)));
        }

        let lookup = SourceLookup::new(corpus, &config.generic_references);
        Ok(Self { config, lookup })
    }

    /// Create a validator with the default configuration
    pub fn with_defaults(corpus: SourceCorpus) -> Result<Self, CitationError> {
        Self::new(corpus, CitationConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &CitationConfig {
        &self.config
    }

    /// Get the indexed corpus
    pub fn corpus(&self) -> &SourceCorpus {
        self.lookup.corpus()
    }

    /// Validate a generated response and any structured citations that came with it
    pub fn validate(&self, response_text: &str, citations: Option<&[Citation]>) -> ValidationResult {
        let started = Instant::now();
        let mut warnings = Vec::new();
        let mut valid_citations = Vec::new();
        let mut invalid_citations = Vec::new();

        for span in patterns::find_citations(response_text) {
            let citation = self.check_in_text(span);
            if citation.is_valid {
                valid_citations.push(citation);
            } else {
                warnings.push(unknown_source_warning(&citation.source_reference));
                invalid_citations.push(citation);
            }
        }

        for structured in citations.unwrap_or_default() {
            let citation = self.check_structured(structured);
            if !citation.is_valid {
                warnings.push(unknown_source_warning(&citation.source_reference));
                invalid_citations.push(citation);
                continue;
            }
            if citation.low_confidence {
                warnings.push(format!(
                    "Low-confidence citation '{}': claim similarity {:.2} to source content",
                    citation.source_reference,
                    citation.similarity.unwrap_or(0.0)
                ));
            }
            valid_citations.push(citation);
        }

        let unsourced_claims = if self.config.detect_unsourced_claims {
            self.find_unsourced_claims(response_text, &valid_citations)
        } else {
            Vec::new()
        };
        for claim in &unsourced_claims {
            warnings.push(format!("Unsourced claim: '{}' has no citation nearby", claim.text));
        }

        let cleaned_response = self.clean_response(response_text, &invalid_citations);
        let is_valid = invalid_citations.is_empty() && unsourced_claims.is_empty();
        let validation_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            valid = valid_citations.len(),
            invalid = invalid_citations.len(),
            unsourced = unsourced_claims.len(),
            is_valid,
            validation_time_ms,
            "Validated response citations"
        );

        ValidationResult {
            is_valid,
            valid_citations,
            invalid_citations,
            warnings,
            cleaned_response,
            unsourced_claims,
            validation_time_ms,
        }
    }

    /// Check that a citation's quote actually appears in the cited source
    ///
    /// The quote is the citation's own quoted text or, failing that, the
    /// sentence of `response_text` that mentions the reference. Short quotes
    /// pass; otherwise most of the quote's words must occur in the source.
    pub fn validate_citation_references_real_content(&self, citation: &Citation, response_text: &str) -> bool {
        let Some(source) = self.resolve_structured(citation) else {
            debug!(reference = %citation.source_reference, "Deep check: source not found");
            return false;
        };

        let quote = match &citation.quoted_text {
            Some(text) => text.clone(),
            None => citing_sentence(response_text, &citation.source_reference),
        };
        let quote_words = words(&quote);
        if quote_words.len() < self.config.deep_check_min_words {
            return true;
        }

        let Some(content) = source.content() else {
            debug!(source = %source.label(), "Deep check: source has no content");
            return false;
        };
        let source_words: HashSet<String> = words(&content).into_iter().collect();

        let present = quote_words.iter().filter(|w| source_words.contains(*w)).count();
        let coverage = present as f64 / quote_words.len() as f64;

        debug!(
            reference = %citation.source_reference,
            coverage,
            required = self.config.deep_check_coverage,
            "Deep content check"
        );
        coverage >= self.config.deep_check_coverage
    }

    fn check_in_text(&self, span: CitationSpan) -> CitationMatch {
        let (span, matched_source) = self.resolve_span(span);
        debug!(
            reference = %span.reference,
            kind = span.kind.as_str(),
            resolved = matched_source.is_some(),
            "Resolved citation"
        );

        CitationMatch {
            is_valid: matched_source.is_some(),
            full_match: span.full_match,
            source_reference: span.reference,
            position: Some(span.start),
            kind: span.kind,
            matched_source,
            similarity: None,
            low_confidence: false,
        }
    }

    /// Resolve an in-text citation. A narrative reference that does not
    /// resolve whole is cut back to its longest resolvable word prefix, or
    /// failing that to the words that read as a name, so the prose after it
    /// is neither looked up nor removed.
    fn resolve_span(&self, span: CitationSpan) -> (CitationSpan, Option<MatchedSource>) {
        if let Some(source) = self.lookup.resolve(&span.reference) {
            return (span, Some(source));
        }
        if !span.kind.is_narrative() {
            return (span, None);
        }

        let word_ends: Vec<usize> = patterns::word_spans(&span.reference).iter().map(|&(_, end)| end).collect();
        for &end in word_ends.iter().rev().skip(1) {
            let prefix = &span.reference[..end];
            // A bare number here is a quantity ("3 analysts"), not an ordinal citation
            if prefix.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Some(source) = self.lookup.resolve(prefix) {
                return (span.truncated(end), Some(source));
            }
        }

        let name_len = patterns::plausible_name_len(&span.reference);
        (span.truncated(name_len), None)
    }

    fn check_structured(&self, citation: &Citation) -> CitationMatch {
        let matched_source = self.resolve_structured(citation);
        debug!(
            reference = %citation.source_reference,
            resolved = matched_source.is_some(),
            "Resolved structured citation"
        );

        let similarity = match (&matched_source, &citation.quoted_text) {
            (Some(source), Some(claim)) => source.content().map(|content| trigram_similarity(claim, &content)),
            _ => None,
        };
        let low_confidence = similarity.is_some_and(|s| s < self.config.low_similarity_threshold);

        CitationMatch {
            full_match: citation.source_reference.clone(),
            source_reference: citation.source_reference.clone(),
            position: None,
            kind: CitationKind::Structured,
            is_valid: matched_source.is_some(),
            matched_source,
            similarity,
            low_confidence,
        }
    }

    fn resolve_structured(&self, citation: &Citation) -> Option<MatchedSource> {
        self.lookup
            .resolve(&citation.source_reference)
            .or_else(|| citation.url.as_deref().and_then(|url| self.lookup.resolve(url)))
    }

    fn find_unsourced_claims(&self, text: &str, valid_citations: &[CitationMatch]) -> Vec<UnsourcedClaim> {
        let cited_spans: Vec<(usize, usize)> = valid_citations.iter().filter_map(CitationMatch::span).collect();

        patterns::find_claims(text)
            .into_iter()
            .filter(|claim| {
                let window_start = floor_char_boundary(text, claim.start.saturating_sub(self.config.claim_window));
                let window_end = ceil_char_boundary(text, claim.end.saturating_add(self.config.claim_window));
                !cited_spans
                    .iter()
                    .any(|&(start, end)| start < window_end && end > window_start)
            })
            .take(self.config.max_unsourced_claims)
            .map(|claim| UnsourcedClaim {
                kind: claim.kind,
                text: claim.text,
                position: claim.start,
            })
            .collect()
    }

    fn clean_response(&self, text: &str, invalid_citations: &[CitationMatch]) -> String {
        let mut spans: Vec<(usize, usize)> = invalid_citations.iter().filter_map(CitationMatch::span).collect();
        if spans.is_empty() {
            return text.to_string();
        }
        spans.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start < last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let mut cleaned = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end) in merged {
            cleaned.push_str(&text[cursor..start]);
            cleaned.push_str(&self.config.removal_marker);
            cursor = end;
        }
        cleaned.push_str(&text[cursor..]);

        warn!(removed = invalid_citations.len(), "Removed invalid citations from response");
        cleaned
    }
}

fn unknown_source_warning(reference: &str) -> String {
    format!("Citation references unknown source: '{}'", reference)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Lowercased alphanumeric words
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// The sentence containing `reference`, with citation markup removed.
/// Empty when the reference does not occur in the text.
fn citing_sentence(text: &str, reference: &str) -> String {
    if reference.trim().is_empty() {
        return String::new();
    }
    let Some(position) = text.find(reference) else {
        return String::new();
    };

    let start = text[..position]
        .char_indices()
        .rev()
        .find(|&(i, c)| is_sentence_end(text, i, c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let after = position + reference.len();
    let end = text[after..]
        .char_indices()
        .find(|&(i, c)| is_sentence_end(text, after + i, c))
        .map(|(i, _)| after + i)
        .unwrap_or(text.len());

    let sentence = &text[start..end];
    let mut spans = patterns::find_citations(sentence);
    spans.sort_by_key(|span| (span.start, std::cmp::Reverse(span.end)));

    let mut stripped = String::with_capacity(sentence.len());
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor {
            continue;
        }
        stripped.push_str(&sentence[cursor..span.start]);
        stripped.push(' ');
        cursor = span.end;
    }
    stripped.push_str(&sentence[cursor..]);
    stripped
}

/// `.`, `!` or `?` followed by whitespace or end of text, or a newline
fn is_sentence_end(text: &str, index: usize, c: char) -> bool {
    match c {
        '\n' => true,
        '.' | '!' | '?' => text[index + c.len_utf8()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace),
        _ => false,
    }
}
