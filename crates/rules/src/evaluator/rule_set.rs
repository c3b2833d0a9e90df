//! Top-level driver over a list of rules.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::schema::Rule;

use super::{evaluate_rule, Outcome};

/// Verdict for one top-level rule, echoing the rule definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationDetail {
    pub rule: Rule,
    pub passed: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_results: Vec<Outcome>,
}

/// Structured verdict: one detail per input rule, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetResult {
    /// AND over every detail.
    pub passed: bool,
    pub details: Vec<EvaluationDetail>,
}

impl RuleSetResult {
    pub fn total(&self) -> usize {
        self.details.len()
    }

    pub fn passed_count(&self) -> usize {
        self.details.iter().filter(|d| d.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    /// Fraction of passing rules; 0 when there are no rules.
    pub fn score(&self) -> f64 {
        if self.details.is_empty() {
            0.0
        } else {
            self.passed_count() as f64 / self.total() as f64
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &EvaluationDetail> {
        self.details.iter().filter(|d| !d.passed)
    }
}

/// Evaluates rule lists against records.
pub struct RuleSetEvaluator;

impl RuleSetEvaluator {
    /// Evaluate every rule against `record`.
    ///
    /// A rule that errors becomes a failed detail with reason
    /// `Rule evaluation error: ...`; the remaining rules still run.
    pub fn evaluate(record: &Value, rules: &[Rule]) -> RuleSetResult {
        let details: Vec<EvaluationDetail> = rules
            .iter()
            .map(|rule| match evaluate_rule(record, rule) {
                Ok(outcome) => EvaluationDetail {
                    rule: rule.clone(),
                    passed: outcome.passed,
                    reason: outcome.reason,
                    sub_results: outcome.sub_results,
                },
                Err(e) => {
                    error!(
                        kind = rule.kind(),
                        field = rule.field().map(|f| f.as_str()).unwrap_or(""),
                        error = %e,
                        "error evaluating rule"
                    );
                    EvaluationDetail {
                        rule: rule.clone(),
                        passed: false,
                        reason: format!("Rule evaluation error: {e}"),
                        sub_results: Vec::new(),
                    }
                }
            })
            .collect();

        let passed = details.iter().all(|d| d.passed);
        debug!(
            rules = details.len(),
            failed = details.iter().filter(|d| !d.passed).count(),
            passed,
            "rule set evaluated"
        );
        RuleSetResult { passed, details }
    }

    /// Evaluate many independent records in parallel. Results keep input order.
    pub fn evaluate_batch(records: &[Value], rules: &[Rule]) -> Vec<RuleSetResult> {
        records
            .par_iter()
            .map(|record| Self::evaluate(record, rules))
            .collect()
    }
}
