//! Fallback line scanner
//!
//! Used when a confirmation has no anchor clause. Party names in signature
//! blocks and headers tend to sit on their own line in capitals, so lines
//! that look like an entity name are collected in document order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::clean_candidate;
use crate::MAX_COUNTERPARTIES;

/// An uppercase letter followed only by capitals, digits and entity punctuation
static ENTITY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9 .,&'/\-]+$").expect("entity line pattern is valid"));

/// Whether a line (trailing whitespace already removed) looks like an entity name
pub fn is_entity_line(line: &str, min_line_len: usize) -> bool {
    line.chars().count() >= min_line_len && ENTITY_LINE.is_match(line)
}

/// Collect the first two unique entity-like lines in document order.
///
/// Lines are split on `\n`, `\r\n` and bare `\r`. Qualifying lines are
/// cleaned (list markers stripped, whitespace normalized) before the
/// uniqueness check, so repeated headers collapse to one candidate.
pub fn scan_entity_lines(text: &str, min_line_len: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::with_capacity(MAX_COUNTERPARTIES);

    for line in text.split(['\n', '\r']) {
        let line = line.trim_end();
        if !is_entity_line(line, min_line_len) {
            continue;
        }

        let candidate = clean_candidate(line);
        if seen.insert(candidate.clone()) {
            found.push(candidate);
            if found.len() == MAX_COUNTERPARTIES {
                break;
            }
        }
    }

    found
}
