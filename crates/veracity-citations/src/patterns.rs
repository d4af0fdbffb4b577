//! Citation idioms and factual-claim shapes, as ordered pattern tables
//!
//! Adding a citation idiom or a claim shape means adding a regex and a table
//! entry; the validator walks the tables without knowing individual patterns.

use crate::types::{CitationKind, ClaimKind};
use regex::Regex;
use std::sync::LazyLock;

/// A compiled citation pattern; capture group 1 is the source reference.
pub struct CitationPattern {
    pub kind: CitationKind,
    pub regex: &'static LazyLock<Option<Regex>>,
}

/// A compiled claim pattern.
pub struct ClaimPattern {
    pub kind: ClaimKind,
    pub regex: &'static LazyLock<Option<Regex>>,
}

macro_rules! text_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ── Citations ──────────────────────────────────────────────────────────────
text_pattern!(RE_SOURCE_NAMED, r"(?i)\[source:\s*([^\]]+?)\s*\]");
text_pattern!(RE_SOURCE_NUMBERED, r"(?i)\[source\s+(\d+)\]");
text_pattern!(RE_BRACKETED, r"\[(\d+)\]");
text_pattern!(RE_PARENTHETICAL, r"(?i)\(source:\s*([^)]+?)\s*\)");

// Narrative forms stop at clause punctuation and never end on whitespace.
// A lowercase "per" only counts before "the", so "per seat" is prose.
text_pattern!(
    RE_ACCORDING_TO,
    r"\b(?i:according\s+to)\s+([^,.;:!?\n\[\]()]{0,79}[^,.;:!?\n\[\]()\s])"
);
text_pattern!(
    RE_PER,
    r"\b(?:Per\s+|per\s+the\s+)((?:the\s+)?[A-Z0-9](?:[^,.;:!?\n\[\]()]{0,78}[^,.;:!?\n\[\]()\s])?)"
);

// ── Claims ─────────────────────────────────────────────────────────────────
text_pattern!(RE_PERCENTAGE, r"\b\d+(?:\.\d+)?\s?%");
text_pattern!(
    RE_DOLLAR_AMOUNT,
    r"\$\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:[KkMmBb]n?|thousand|million|billion)\b)?"
);
text_pattern!(
    RE_FINANCIAL_FIGURE,
    r"(?i)\b(?:revenue|profit|market share|valuation|funding|earnings)\s+(?:of\s+|was\s+|is\s+|reached\s+|grew to\s+|totaled\s+|at\s+)?\$?\d[\d,]*(?:\.\d+)?"
);
text_pattern!(RE_RANKING, r"(?i)\branked\s+(?:#\s?|no\.\s?|number\s+)?\d+");
text_pattern!(
    RE_ENTITY_COUNT,
    r"(?i)\b\d[\d,]*\+?\s+(?:employees|customers|users|clients|stores|locations|offices|countries|partners|subscribers)\b"
);

/// Citation idioms in extraction order.
pub fn citation_patterns() -> Vec<CitationPattern> {
    vec![
        CitationPattern {
            kind: CitationKind::SourceNamed,
            regex: &RE_SOURCE_NAMED,
        },
        CitationPattern {
            kind: CitationKind::SourceNumbered,
            regex: &RE_SOURCE_NUMBERED,
        },
        CitationPattern {
            kind: CitationKind::Bracketed,
            regex: &RE_BRACKETED,
        },
        CitationPattern {
            kind: CitationKind::Parenthetical,
            regex: &RE_PARENTHETICAL,
        },
        CitationPattern {
            kind: CitationKind::AccordingTo,
            regex: &RE_ACCORDING_TO,
        },
        CitationPattern {
            kind: CitationKind::Per,
            regex: &RE_PER,
        },
    ]
}

/// Claim shapes in detection order.
pub fn claim_patterns() -> Vec<ClaimPattern> {
    vec![
        ClaimPattern {
            kind: ClaimKind::Percentage,
            regex: &RE_PERCENTAGE,
        },
        ClaimPattern {
            kind: ClaimKind::DollarAmount,
            regex: &RE_DOLLAR_AMOUNT,
        },
        ClaimPattern {
            kind: ClaimKind::FinancialFigure,
            regex: &RE_FINANCIAL_FIGURE,
        },
        ClaimPattern {
            kind: ClaimKind::Ranking,
            regex: &RE_RANKING,
        },
        ClaimPattern {
            kind: ClaimKind::EntityCount,
            regex: &RE_ENTITY_COUNT,
        },
    ]
}

/// A citation occurrence before lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSpan {
    pub kind: CitationKind,
    pub full_match: String,
    pub reference: String,
    pub start: usize,
    pub end: usize,
    /// Byte offset of `reference` in the scanned text
    pub reference_start: usize,
}

impl CitationSpan {
    /// The same citation with its reference cut to `reference_len` bytes.
    /// `reference_len` must fall on a char boundary of the reference.
    pub fn truncated(&self, reference_len: usize) -> CitationSpan {
        let reference_len = reference_len.min(self.reference.len());
        let end = self.reference_start + reference_len;
        CitationSpan {
            kind: self.kind,
            full_match: self.full_match[..end - self.start].to_string(),
            reference: self.reference[..reference_len].to_string(),
            start: self.start,
            end,
            reference_start: self.reference_start,
        }
    }
}

/// A claim occurrence before the proximity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSpan {
    pub kind: ClaimKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Every citation in `text`, pattern by pattern. Overlaps are kept.
pub fn find_citations(text: &str) -> Vec<CitationSpan> {
    let mut found = Vec::new();
    for pattern in citation_patterns() {
        let Some(re) = pattern.regex.as_ref() else {
            continue;
        };
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let raw = reference.as_str();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            found.push(CitationSpan {
                kind: pattern.kind,
                full_match: whole.as_str().to_string(),
                reference: trimmed.to_string(),
                start: whole.start(),
                end: whole.end(),
                reference_start: reference.start() + (raw.len() - raw.trim_start().len()),
            });
        }
    }
    found
}

/// Every claim in `text`, ordered by position. Where claims overlap the
/// earliest (then longest) one is kept.
pub fn find_claims(text: &str) -> Vec<ClaimSpan> {
    let mut found = Vec::new();
    for pattern in claim_patterns() {
        let Some(re) = pattern.regex.as_ref() else {
            continue;
        };
        for m in re.find_iter(text) {
            found.push(ClaimSpan {
                kind: pattern.kind,
                text: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            });
        }
    }

    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<ClaimSpan> = Vec::with_capacity(found.len());
    for claim in found {
        if kept.last().is_some_and(|last| claim.start < last.end) {
            continue;
        }
        kept.push(claim);
    }
    kept
}

/// Words that end a narrative source name
const NAME_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "that", "which", "who", "is", "was", "are", "were", "has", "have", "had", "said",
    "says", "reported", "reports", "shows", "showed", "found", "expects", "estimates", "grew",
];

/// Lowercase words allowed inside a capitalised name ("Bank of America")
const NAME_CONNECTORS: &[&str] = &["of", "and", "&", "for"];

const MAX_CAPITALISED_NAME_WORDS: usize = 6;
const MAX_LOWERCASE_NAME_WORDS: usize = 3;

/// Byte spans of the whitespace-separated words in `text`
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn starts_capitalised(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
}

/// Length of the leading part of a narrative reference that reads as a name
///
/// "Bloomberg Intelligence the market grew" yields the length of
/// "Bloomberg Intelligence"; "industry analysts the market grew" yields
/// "industry analysts". A leading "the" is kept with the name.
pub fn plausible_name_len(reference: &str) -> usize {
    let words = word_spans(reference);
    let first = match words.first() {
        Some(&(s, e)) if reference[s..e].eq_ignore_ascii_case("the") => 1,
        _ => 0,
    };
    let Some(&(s, mut end)) = words.get(first) else {
        return reference.len();
    };

    let capitalised = starts_capitalised(&reference[s..end]);
    let max_words = if capitalised {
        MAX_CAPITALISED_NAME_WORDS
    } else {
        MAX_LOWERCASE_NAME_WORDS
    };

    for (offset, &(ws, we)) in words.iter().enumerate().skip(first + 1) {
        if offset - first >= max_words {
            break;
        }
        let word = &reference[ws..we];
        let lower = word.to_lowercase();
        if NAME_STOP_WORDS.contains(&lower.as_str()) {
            break;
        }
        if !capitalised || starts_capitalised(word) {
            end = we;
            continue;
        }
        let next_capitalised = words
            .get(offset + 1)
            .is_some_and(|&(ns, ne)| starts_capitalised(&reference[ns..ne]));
        if !(NAME_CONNECTORS.contains(&lower.as_str()) && next_capitalised) {
            break;
        }
    }
    end
}

/// Name of the first pattern that failed to compile, if any
pub fn first_broken_pattern() -> Option<&'static str> {
    citation_patterns()
        .into_iter()
        .find(|p| p.regex.is_none())
        .map(|p| p.kind.as_str())
        .or_else(|| {
            claim_patterns()
                .into_iter()
                .find(|p| p.regex.is_none())
                .map(|p| p.kind.as_str())
        })
}
