//! cpty extractor - counterparty extraction from swap confirmations
//!
//! Locates the two named parties in text already extracted from a
//! confirmation document. Two strategies run in order:
//! - Anchor clause: `entered into between: <A> and <B>`
//! - Fallback: the first two unique entity-like (all caps) lines
//!
//! Every candidate is normalized, deduplicated and length-filtered before
//! it is returned. Extraction is pure and never fails.
//!
//! ```
//! use cpty_extractor::extract_counterparties;
//!
//! let result = extract_counterparties(
//!     "This Transaction is entered into between: Acme Corp (the \"Counterparty\") and Beta LLC\n",
//! );
//! assert_eq!(result.counterparties, vec!["Acme Corp", "Beta LLC"]);
//! assert_eq!(result.count, 2);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use cpty_core::ExtractorConfig;

pub mod anchor;
pub mod lines;
pub mod metrics;
pub mod normalize;

pub use anchor::match_between_clause;
pub use lines::scan_entity_lines;
pub use normalize::normalize;

/// A confirmation names exactly two parties
pub const MAX_COUNTERPARTIES: usize = 2;

/// Which strategy produced a result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// `entered into between:` clause
    Anchor,
    /// Entity-like lines
    LineScan,
    /// Nothing usable found
    #[default]
    None,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anchor => "anchor",
            Self::LineScan => "line_scan",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counterparties found in one document.
///
/// Serializes as `{"counterparties": [...], "count": N}`. Anchor results are
/// in left/right clause order, line-scan results in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub counterparties: Vec<String>,
    pub count: usize,
    #[serde(skip)]
    pub source: MatchSource,
}

impl ExtractionResult {
    /// Build a result, keeping `count` in step with the names
    pub fn new(counterparties: Vec<String>, source: MatchSource) -> Self {
        let source = if counterparties.is_empty() {
            MatchSource::None
        } else {
            source
        };
        Self {
            count: counterparties.len(),
            counterparties,
            source,
        }
    }

    /// No counterparties found
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.counterparties.is_empty()
    }

    /// Serialize as the `{"counterparties": [...], "count": N}` object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "counterparties": self.counterparties,
            "count": self.count,
        })
    }
}

/// Trait for counterparty extractors
pub trait PartyExtractor: Send + Sync {
    fn extract(&self, text: &str) -> ExtractionResult;
}

/// Heuristic extractor: anchor clause first, entity-like lines second.
///
/// Holds only its thresholds; patterns are compiled once per process and
/// shared, so one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct CounterpartyExtractor {
    config: ExtractorConfig,
}

impl CounterpartyExtractor {
    /// Create with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom thresholds
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run both stages and filter the candidates
    pub fn extract_counterparties(&self, text: &str) -> ExtractionResult {
        let (candidates, source) = match match_between_clause(text) {
            Some((left, right)) => {
                debug!(left = %left, right = %right, "matched between clause");
                (vec![left, right], MatchSource::Anchor)
            }
            None => {
                let lines = scan_entity_lines(text, self.config.min_line_len);
                debug!(found = lines.len(), "no between clause, scanned entity lines");
                (lines, MatchSource::LineScan)
            }
        };

        let counterparties = self.filter_candidates(candidates);
        ExtractionResult::new(counterparties, source)
    }

    /// Drop short names and repeats, first occurrence wins
    fn filter_candidates(&self, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|name| {
                let long_enough = name.chars().count() >= self.config.min_entity_len;
                if !long_enough {
                    trace!(candidate = %name, "discarding short candidate");
                }
                long_enough
            })
            .filter(|name| seen.insert(name.clone()))
            .take(MAX_COUNTERPARTIES)
            .collect()
    }
}

impl PartyExtractor for CounterpartyExtractor {
    fn extract(&self, text: &str) -> ExtractionResult {
        self.extract_counterparties(text)
    }
}

/// Extract counterparties with default thresholds
pub fn extract_counterparties(text: &str) -> ExtractionResult {
    CounterpartyExtractor::new().extract_counterparties(text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_takes_precedence() {
        let text = "ACME HOLDINGS\nGLOBAL BANK N.A.\n\
                    This Transaction is entered into between: Acme Corp and Beta LLC\n\
                    THIRD ENTITY INC\n";
        let result = extract_counterparties(text);

        assert_eq!(result.counterparties, vec!["Acme Corp", "Beta LLC"]);
        assert_eq!(result.count, 2);
        assert_eq!(result.source, MatchSource::Anchor);
    }

    #[test]
    fn test_fallback_when_no_anchor() {
        let text = "ACME CORP\nsome body text\nGLOBAL BANK N.A.\nGLOBAL BANK N.A.\nTHIRD ENTITY INC\n";
        let result = extract_counterparties(text);

        assert_eq!(result.counterparties, vec!["ACME CORP", "GLOBAL BANK N.A."]);
        assert_eq!(result.source, MatchSource::LineScan);
    }

    #[test]
    fn test_defined_term_stripping() {
        let text = "entered into between: Acme Corp (the \"Counterparty\") and Beta LLC (the \"Counterparty\")\n";
        let result = extract_counterparties(text);
        assert_eq!(result.counterparties, vec!["Acme Corp", "Beta LLC"]);
    }

    #[test]
    fn test_short_candidates_dropped() {
        let result = extract_counterparties("entered into between: AB and Beta LLC\n");
        assert_eq!(result.counterparties, vec!["Beta LLC"]);
        assert_eq!(result.count, 1);

        let result = extract_counterparties("entered into between: AB and C\n");
        assert!(result.is_empty());
        assert_eq!(result.count, 0);
        assert_eq!(result.source, MatchSource::None);
    }

    #[test]
    fn test_short_line_candidate_dropped_after_cleaning() {
        // "A - -" qualifies as a line but cleans down to "A"
        let result = extract_counterparties("A - -\nBETA LLC\n");
        assert_eq!(result.counterparties, vec!["BETA LLC"]);
    }

    #[test]
    fn test_anchor_with_same_party_twice() {
        let result = extract_counterparties("entered into between: Acme Corp and Acme  Corp\n");
        assert_eq!(result.counterparties, vec!["Acme Corp"]);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_empty_input() {
        let result = extract_counterparties("");
        assert!(result.counterparties.is_empty());
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_lowercase_prose_only() {
        let result = extract_counterparties("this agreement sets out the terms\nof the swap.\n");
        assert_eq!(result, ExtractionResult::empty());
    }

    #[test]
    fn test_replacement_characters() {
        let garbage = String::from_utf8_lossy(&[0xff, 0xfe, b'\n', 0x80, b'A']).into_owned();
        let result = extract_counterparties(&garbage);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_custom_thresholds() {
        let extractor = CounterpartyExtractor::with_config(ExtractorConfig {
            min_line_len: 4,
            min_entity_len: 9,
        });
        let result = extractor.extract_counterparties("entered into between: Acme Corp and Beta LLC\n");
        assert_eq!(result.counterparties, vec!["Acme Corp"]);

        let extractor = CounterpartyExtractor::with_config(ExtractorConfig {
            min_line_len: 10,
            min_entity_len: 3,
        });
        let result = extractor.extract_counterparties("ACME CORP\nGLOBAL BANK N.A.\n");
        assert_eq!(result.counterparties, vec!["GLOBAL BANK N.A."]);
    }

    #[test]
    fn test_config_reports_thresholds() {
        assert_eq!(CounterpartyExtractor::new().config(), &ExtractorConfig::default());

        let config = ExtractorConfig {
            min_line_len: 6,
            min_entity_len: 5,
        };
        let extractor = CounterpartyExtractor::with_config(config.clone());
        assert_eq!(extractor.config(), &config);
    }

    #[test]
    fn test_json_shape() {
        let result = extract_counterparties("entered into between: Acme Corp and Beta LLC\n");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"counterparties": ["Acme Corp", "Beta LLC"], "count": 2})
        );
        assert_eq!(value, result.to_json());
    }

    #[test]
    fn test_match_source_display() {
        assert_eq!(MatchSource::Anchor.to_string(), "anchor");
        assert_eq!(MatchSource::LineScan.as_str(), "line_scan");
    }

    #[test]
    fn test_shared_across_threads() {
        let extractor = std::sync::Arc::new(CounterpartyExtractor::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let extractor = std::sync::Arc::clone(&extractor);
                std::thread::spawn(move || {
                    let text = format!("entered into between: Party {i} Inc and Other {i} Ltd\n");
                    extractor.extract(&text)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert_eq!(
                result.counterparties,
                vec![format!("Party {i} Inc"), format!("Other {i} Ltd")]
            );
        }
    }
}
