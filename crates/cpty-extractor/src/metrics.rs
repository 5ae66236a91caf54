//! Quality Metrics module
//!
//! Measures how well the heuristics recover labelled counterparties:
//! precision, recall and F1 over names, plus per-document exact matches.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cpty_core::{CptyError, Result};

use crate::{ExtractionResult, MatchSource};

// ============================================================================
// Name Metrics
// ============================================================================

/// Counts for counterparty name extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    /// Predicted names that match a gold name
    pub true_positives: usize,
    /// Predicted names with no gold counterpart
    pub false_positives: usize,
    /// Gold names that were not predicted
    pub false_negatives: usize,
    /// Total names in gold standard
    pub gold_total: usize,
    /// Total names predicted
    pub predicted_total: usize,
}

impl ExtractionMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Every gold name found and nothing extra
    pub fn is_exact(&self) -> bool {
        self.false_positives == 0 && self.false_negatives == 0
    }
}

fn ratio(numerator: usize, denominator: usize) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

// ============================================================================
// Gold Standard
// ============================================================================

/// A labelled document, either inline text or a path to a text file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoldDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub counterparties: Vec<String>,
}

impl GoldDocument {
    /// Check that exactly one of `path` and `text` is set
    pub fn validate(&self, index: usize) -> Result<()> {
        match (&self.path, &self.text) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(CptyError::Manifest(format!(
                "entry {index}: set either \"path\" or \"text\", not both"
            ))),
            (None, None) => Err(CptyError::Manifest(format!(
                "entry {index}: missing \"path\" or \"text\""
            ))),
        }
    }
}

/// Parse and validate a JSON manifest (an array of gold documents)
pub fn parse_manifest(json: &str) -> Result<Vec<GoldDocument>> {
    let documents: Vec<GoldDocument> = serde_json::from_str(json)?;
    for (index, document) in documents.iter().enumerate() {
        document.validate(index)?;
    }
    Ok(documents)
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluator for extraction quality
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Position must match (left party first)
    ordered: bool,
    /// Compare names ignoring case
    ignore_case: bool,
}

impl Evaluator {
    /// Create a new evaluator with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Require predicted[i] to equal gold[i]
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// Enable/disable case-insensitive comparison
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    fn names_match(&self, predicted: &str, gold: &str) -> bool {
        if self.ignore_case {
            predicted.to_lowercase() == gold.to_lowercase()
        } else {
            predicted == gold
        }
    }

    /// Evaluate one document's result against its gold names
    pub fn evaluate(&self, predicted: &ExtractionResult, gold: &[String]) -> ExtractionMetrics {
        let predicted = &predicted.counterparties;

        let true_positives = if self.ordered {
            predicted
                .iter()
                .zip(gold)
                .filter(|(p, g)| self.names_match(p, g))
                .count()
        } else {
            let mut matched_gold = vec![false; gold.len()];
            let mut hits = 0;
            for pred in predicted {
                let hit = gold
                    .iter()
                    .enumerate()
                    .find(|(idx, g)| !matched_gold[*idx] && self.names_match(pred, g));
                if let Some((idx, _)) = hit {
                    matched_gold[idx] = true;
                    hits += 1;
                }
            }
            hits
        };

        ExtractionMetrics {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: gold.len() - true_positives,
            gold_total: gold.len(),
            predicted_total: predicted.len(),
        }
    }
}

// ============================================================================
// Aggregate Metrics
// ============================================================================

/// Aggregate metrics for a batch of evaluations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub metrics: ExtractionMetrics,
    pub num_documents: usize,
    /// Documents where the prediction matched gold exactly
    pub exact_documents: usize,
    pub anchor_documents: usize,
    pub line_scan_documents: usize,
}

impl AggregateMetrics {
    /// Add one document's outcome
    pub fn add(&mut self, metrics: &ExtractionMetrics, source: MatchSource) {
        self.metrics.true_positives += metrics.true_positives;
        self.metrics.false_positives += metrics.false_positives;
        self.metrics.false_negatives += metrics.false_negatives;
        self.metrics.gold_total += metrics.gold_total;
        self.metrics.predicted_total += metrics.predicted_total;

        self.num_documents += 1;
        if metrics.is_exact() {
            self.exact_documents += 1;
        }
        match source {
            MatchSource::Anchor => self.anchor_documents += 1,
            MatchSource::LineScan => self.line_scan_documents += 1,
            MatchSource::None => {}
        }
    }

    /// Share of documents extracted exactly
    pub fn exact_rate(&self) -> f32 {
        ratio(self.exact_documents, self.num_documents)
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        format!(
            "=== Counterparty Extraction Report ===\n\n\
             Documents evaluated: {}\n\
             Exact matches:       {} ({:.1}%)\n\
             Via anchor clause:   {}\n\
             Via line scan:       {}\n\n\
             Names:\n\
               Precision: {:.1}%\n\
               Recall:    {:.1}%\n\
               F1 Score:  {:.1}%\n\
               Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n",
            self.num_documents,
            self.exact_documents,
            self.exact_rate() * 100.0,
            self.anchor_documents,
            self.line_scan_documents,
            self.metrics.precision() * 100.0,
            self.metrics.recall() * 100.0,
            self.metrics.f1_score() * 100.0,
            self.metrics.gold_total,
            self.metrics.predicted_total,
            self.metrics.true_positives,
            self.metrics.false_positives,
            self.metrics.false_negatives,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn result(names: &[&str], source: MatchSource) -> ExtractionResult {
        ExtractionResult::new(names.iter().map(|s| s.to_string()).collect(), source)
    }

    fn gold(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_metrics_precision_recall_f1() {
        let metrics = ExtractionMetrics {
            true_positives: 80,
            false_positives: 20,
            false_negatives: 20,
            gold_total: 100,
            predicted_total: 100,
        };

        assert!((metrics.precision() - 0.8).abs() < 0.001);
        assert!((metrics.recall() - 0.8).abs() < 0.001);
        assert!((metrics.f1_score() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_metrics_zero_denominators() {
        let metrics = ExtractionMetrics::default();
        assert_eq!(metrics.precision(), 0.0);
        assert_eq!(metrics.recall(), 0.0);
        assert_eq!(metrics.f1_score(), 0.0);
        assert!(metrics.is_exact());
    }

    #[test]
    fn test_evaluate_perfect() {
        let evaluator = Evaluator::new();
        let metrics = evaluator.evaluate(
            &result(&["Acme Corp", "Beta LLC"], MatchSource::Anchor),
            &gold(&["Beta LLC", "Acme Corp"]),
        );

        assert_eq!(metrics.true_positives, 2);
        assert!(metrics.is_exact());
    }

    #[test]
    fn test_evaluate_ordered() {
        let evaluator = Evaluator::new().ordered();
        let metrics = evaluator.evaluate(
            &result(&["Acme Corp", "Beta LLC"], MatchSource::Anchor),
            &gold(&["Beta LLC", "Acme Corp"]),
        );

        assert_eq!(metrics.true_positives, 0);
        assert_eq!(metrics.false_positives, 2);
        assert_eq!(metrics.false_negatives, 2);
    }

    #[test]
    fn test_evaluate_partial() {
        let evaluator = Evaluator::new();
        let metrics = evaluator.evaluate(
            &result(&["ACME CORP", "SCHEDULE A"], MatchSource::LineScan),
            &gold(&["ACME CORP", "Beta LLC"]),
        );

        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.false_negatives, 1);
        assert!((metrics.precision() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_evaluate_ignore_case() {
        let predicted = result(&["ACME CORP"], MatchSource::LineScan);
        let expected = gold(&["Acme Corp"]);

        assert_eq!(Evaluator::new().evaluate(&predicted, &expected).true_positives, 0);
        assert_eq!(
            Evaluator::new()
                .with_ignore_case(true)
                .evaluate(&predicted, &expected)
                .true_positives,
            1
        );
    }

    #[test]
    fn test_aggregate_report() {
        let evaluator = Evaluator::new();
        let mut aggregate = AggregateMetrics::default();

        let exact = result(&["Acme Corp", "Beta LLC"], MatchSource::Anchor);
        aggregate.add(
            &evaluator.evaluate(&exact, &gold(&["Acme Corp", "Beta LLC"])),
            exact.source,
        );
        let missed = ExtractionResult::empty();
        aggregate.add(
            &evaluator.evaluate(&missed, &gold(&["Gamma SA", "Delta AG"])),
            missed.source,
        );

        assert_eq!(aggregate.num_documents, 2);
        assert_eq!(aggregate.exact_documents, 1);
        assert_eq!(aggregate.anchor_documents, 1);
        assert_eq!(aggregate.line_scan_documents, 0);
        assert!((aggregate.metrics.recall() - 0.5).abs() < 0.001);

        let report = aggregate.report();
        assert!(report.contains("Documents evaluated: 2"));
        assert!(report.contains("Exact matches:       1 (50.0%)"));
    }

    #[test]
    fn test_parse_manifest() {
        let json = r#"[
            {"path": "deals/one.txt", "counterparties": ["Acme Corp", "Beta LLC"]},
            {"text": "ACME CORP\nBETA LLC\n", "counterparties": ["ACME CORP", "BETA LLC"]}
        ]"#;
        let documents = parse_manifest(json).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].path, Some(PathBuf::from("deals/one.txt")));
        assert!(documents[1].text.is_some());
    }

    #[test]
    fn test_parse_manifest_rejects_ambiguous_entries() {
        let both = r#"[{"path": "a.txt", "text": "x", "counterparties": []}]"#;
        assert!(matches!(parse_manifest(both), Err(CptyError::Manifest(_))));

        let neither = r#"[{"counterparties": []}]"#;
        assert!(matches!(parse_manifest(neither), Err(CptyError::Manifest(_))));

        assert!(matches!(parse_manifest("{"), Err(CptyError::Json(_))));
    }
}
