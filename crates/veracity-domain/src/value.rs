//! Numeric value extraction from free-form field values

use regex::Regex;
use std::sync::LazyLock;

/// Number with optional currency, sign, thousands separators, percent and
/// magnitude suffix.
static NUMBER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?P<sign>[-+])?
        \s*(?:usd|eur|gbp)?\s*
        [$€£¥]?
        \s*(?P<num>\d[\d,]*(?:\.\d+)?|\.\d+)
        \s*(?P<suffix>k|m|mm|b|bn|t|thousand|million|billion|trillion)?
        \s*%?
        $",
    )
    .ok()
});

/// Parse a field value as a number
///
/// Handles currency symbols, thousands separators and `K`/`M`/`B`/`T`
/// magnitude suffixes: `"$1.5M"` becomes `1_500_000.0`. Anything that does
/// not look like a single number yields `None`; this never panics.
pub fn extract_number(value: &str) -> Option<f64> {
    let caps = NUMBER_RE.as_ref()?.captures(value.trim())?;

    let digits: String = caps.name("num")?.as_str().chars().filter(|c| *c != ',').collect();
    let mut number: f64 = digits.parse().ok()?;

    if let Some(suffix) = caps.name("suffix") {
        number *= match suffix.as_str().to_lowercase().as_str() {
            "k" | "thousand" => 1e3,
            "m" | "mm" | "million" => 1e6,
            "b" | "bn" | "billion" => 1e9,
            "t" | "trillion" => 1e12,
            _ => 1.0,
        };
    }

    if caps.name("sign").map(|s| s.as_str()) == Some("-") {
        number = -number;
    }

    number.is_finite().then_some(number)
}

/// Relative difference `|a - b| / max(|a|, |b|)`, 0.0 when both are zero
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let denominator = a.abs().max(b.abs());
    if denominator == 0.0 {
        return 0.0;
    }
    (a - b).abs() / denominator
}
