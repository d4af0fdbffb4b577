//! Lightweight, embedding-free text similarity

use std::collections::{HashMap, HashSet};

/// Case-fold and collapse whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity of two short field values in [0.0, 1.0]
///
/// The larger of normalised Levenshtein similarity and token Jaccard
/// overlap, so that both small typos ("Acme Inc" / "Acme Inc.") and
/// reordered tokens ("San Francisco, CA" / "CA, San Francisco") score high.
/// Identical strings always score 1.0.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let edit = strsim::normalized_levenshtein(&a, &b);
    edit.max(token_jaccard(&a, &b)).clamp(0.0, 1.0)
}

fn token_jaccard(a: &str, b: &str) -> f64 {
    let tokens = |s: &str| -> HashSet<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    };
    let a_tokens = tokens(a);
    let b_tokens = tokens(b);

    let union = a_tokens.union(&b_tokens).count();
    if union == 0 {
        return 0.0;
    }
    a_tokens.intersection(&b_tokens).count() as f64 / union as f64
}

fn trigram_counts(text: &str) -> HashMap<[char; 3], u64> {
    let chars: Vec<char> = text.chars().collect();
    let mut counts = HashMap::new();
    for window in chars.windows(3) {
        *counts.entry([window[0], window[1], window[2]]).or_insert(0) += 1;
    }
    counts
}

/// Character-trigram cosine similarity in [0.0, 1.0]
///
/// Builds trigram frequency vectors of both (case-folded) texts and returns
/// their cosine. Empty input, or input too short to yield a trigram, scores
/// 0.0; identical non-empty input scores 1.0. Symmetric.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let a_counts = trigram_counts(&a);
    let b_counts = trigram_counts(&b);
    if a_counts.is_empty() || b_counts.is_empty() {
        return 0.0;
    }

    // Integer dot product keeps the result independent of argument order.
    let dot: u64 = a_counts
        .iter()
        .filter_map(|(gram, count)| b_counts.get(gram).map(|other| count * other))
        .sum();
    if dot == 0 {
        return 0.0;
    }

    let magnitude = |counts: &HashMap<[char; 3], u64>| -> f64 {
        (counts.values().map(|c| c * c).sum::<u64>() as f64).sqrt()
    };

    (dot as f64 / (magnitude(&a_counts) * magnitude(&b_counts))).clamp(0.0, 1.0)
}
