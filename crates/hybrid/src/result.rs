//! Hybrid verdict types and scoring.

use serde::{Deserialize, Serialize};

use screening_llm::{FieldEvaluation, FieldSubmission, JudgeVerdict};
use screening_rules::RuleSetResult;

/// Where the unstructured verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnstructuredSource {
    /// The configured model answered.
    Llm,
    /// The heuristic judge was the configured judge.
    Heuristic,
    /// The configured judge failed or timed out; heuristics answered instead.
    HeuristicFallback,
    /// No judge call was needed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnstructuredResult {
    pub passed: bool,
    pub overall_reasoning: String,
    pub field_evaluations: Vec<FieldEvaluation>,
    pub raw_response: String,
    pub source: UnstructuredSource,
}

impl UnstructuredResult {
    pub(crate) fn from_verdict(verdict: JudgeVerdict, source: UnstructuredSource) -> Self {
        Self {
            passed: verdict.passed,
            overall_reasoning: verdict.overall_reasoning,
            field_evaluations: verdict.field_evaluations,
            raw_response: verdict.raw_response,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub structured_passed: bool,
    pub unstructured_passed: bool,
    pub structured_score: f64,
    pub total_structured_rules: usize,
    pub failed_structured_rules: usize,
    pub unstructured_fields_evaluated: usize,
}

/// Merged verdict over one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridResult {
    pub overall_passed: bool,
    pub overall_score: f64,
    pub structured_evaluation: RuleSetResult,
    pub unstructured_evaluation: UnstructuredResult,
    /// Unstructured fields that had a value, as sent to the judge.
    pub unstructured_data_found: Vec<FieldSubmission>,
    pub summary: Summary,
}

impl HybridResult {
    pub fn merge(
        structured: RuleSetResult,
        unstructured: UnstructuredResult,
        data_found: Vec<FieldSubmission>,
    ) -> Self {
        let summary = Summary {
            structured_passed: structured.passed,
            unstructured_passed: unstructured.passed,
            structured_score: structured.score(),
            total_structured_rules: structured.total(),
            failed_structured_rules: structured.failed_count(),
            unstructured_fields_evaluated: data_found.len(),
        };
        Self {
            overall_passed: structured.passed && unstructured.passed,
            overall_score: hybrid_score(&structured, unstructured.passed),
            structured_evaluation: structured,
            unstructured_evaluation: unstructured,
            unstructured_data_found: data_found,
            summary,
        }
    }
}

/// The unstructured verdict counts as one more binary rule.
pub fn hybrid_score(structured: &RuleSetResult, unstructured_passed: bool) -> f64 {
    let binary = if unstructured_passed { 1.0 } else { 0.0 };
    let total = structured.total();
    if total == 0 {
        binary
    } else {
        (structured.passed_count() as f64 + binary) / (total as f64 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use screening_rules::RuleSetEvaluator;

    fn structured(passing: usize, failing: usize) -> RuleSetResult {
        let mut rules = vec![json!({"field": "age", "type": "min", "min": 0}); passing];
        rules.extend(vec![json!({"field": "age", "type": "min", "min": 100}); failing]);
        let rules = serde_json::from_value::<Vec<screening_rules::Rule>>(json!(rules)).unwrap();
        RuleSetEvaluator::evaluate(&json!({"age": 30}), &rules)
    }

    #[test]
    fn unstructured_is_one_extra_rule() {
        assert_eq!(hybrid_score(&structured(3, 1), true), 0.8);
        assert_eq!(hybrid_score(&structured(3, 1), false), 0.6);
        assert_eq!(hybrid_score(&structured(0, 0), true), 1.0);
        assert_eq!(hybrid_score(&structured(0, 0), false), 0.0);
    }

    #[test]
    fn merge_fills_summary() {
        let unstructured = UnstructuredResult {
            passed: true,
            overall_reasoning: String::new(),
            field_evaluations: Vec::new(),
            raw_response: String::new(),
            source: UnstructuredSource::Skipped,
        };
        let result = HybridResult::merge(structured(3, 1), unstructured, Vec::new());
        assert!(!result.overall_passed);
        assert_eq!(result.overall_score, 0.8);
        assert_eq!(
            result.summary,
            Summary {
                structured_passed: false,
                unstructured_passed: true,
                structured_score: 0.75,
                total_structured_rules: 4,
                failed_structured_rules: 1,
                unstructured_fields_evaluated: 0,
            }
        );
    }

    #[test]
    fn source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(UnstructuredSource::HeuristicFallback).unwrap(),
            json!("heuristic_fallback")
        );
    }
}
