//! Anchor clause matching
//!
//! Confirmations usually open with a sentence of the form
//! `... entered into between: <Party A> and <Party B>` followed by a line
//! break. When that clause is present it is the strongest signal we have,
//! so it takes precedence over every other heuristic.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{normalize, trim_list_markers};

/// `entered into between:` followed by two lazily captured spans split on
/// the first standalone "and". The right span stops at the first line break
/// or at the end of the text.
static BETWEEN_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)entered\s+into\s+between:\s*(.+?)\s+and\s+(.+?)(?:[\r\n]|\z)")
        .expect("between clause pattern is valid")
});

/// `(the "Counterparty")` style defined-term annotations, with straight or
/// curly quotes and an optional "the".
static DEFINED_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\(\s*["'“”‘’]?\s*(?:the\s+)?["'“”‘’]?\s*counterparty"#)
        .expect("defined term pattern is valid")
});

/// Find the first `entered into between: X and Y` clause.
///
/// Returns the cleaned left and right spans in document order, or `None`
/// when the anchor phrase does not occur. The split is lazy: a party whose
/// legal name contains a standalone "and" is cut at that word.
pub fn match_between_clause(text: &str) -> Option<(String, String)> {
    let caps = BETWEEN_CLAUSE.captures(text)?;
    let left = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let right = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    Some((clean_span(left), clean_span(right)))
}

/// Normalize a captured span, cut it at a defined-term marker and strip
/// list markers from both ends.
pub fn clean_span(span: &str) -> String {
    let normalized = normalize(span);
    let truncated = strip_defined_term(&normalized);
    trim_list_markers(truncated).to_string()
}

/// Everything before the first defined-term marker, or the whole input
pub fn strip_defined_term(text: &str) -> &str {
    match DEFINED_TERM.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}
