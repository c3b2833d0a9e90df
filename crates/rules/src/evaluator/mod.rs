//! Structured rule evaluation.
//!
//! Walks a [`Rule`] tree against a JSON record:
//! - [`resolve`]: dotted-path lookup with indices and `*` fan-out
//! - predicates: typed leaf checks
//! - composition: `and` / `or` / `not` / `optional_and`
//! - wildcard: first-match search inside nested arrays
//! - [`RuleSetEvaluator`]: per-rule failure boundary and aggregation
//!
//! Evaluation is pure and synchronous; records and rules are only read.

mod composition;
mod predicates;
mod resolve;
mod rule_set;
mod wildcard;


use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{PredicateRule, Rule, ShapeProblem};

use composition::evaluate_combinator;
use predicates::evaluate_predicate;
use wildcard::evaluate_match;

pub use resolve::{is_present, resolve};
pub use rule_set::{EvaluationDetail, RuleSetEvaluator, RuleSetResult};

// ── Outcome ─────────────────────────────────────────────────────────

/// Verdict of one rule, with the verdicts of its children for combinators
/// and `nested_field_validation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub passed: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_results: Vec<Outcome>,
}

impl Outcome {
    pub fn new(passed: bool, reason: impl Into<String>) -> Self {
        Self {
            passed,
            reason: reason.into(),
            sub_results: Vec::new(),
        }
    }

    pub fn pass(reason: impl Into<String>) -> Self {
        Self::new(true, reason)
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self::new(false, reason)
    }

    pub fn with_sub_results(mut self, sub_results: Vec<Outcome>) -> Self {
        self.sub_results = sub_results;
        self
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// Failure inside a single rule's evaluation.
///
/// Contained by [`RuleSetEvaluator`], which turns it into a failed detail.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("malformed rule: {0}")]
    RuleShape(#[from] ShapeProblem),

    #[error("cannot compare {left} with {right} for field '{field}'")]
    TypeMismatch {
        field: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Evaluate one rule against `record`.
///
/// An `optional` rule whose field is absent passes before anything else is
/// looked at. Unknown rule types fail normally; other malformed rules are an
/// [`EvalError::RuleShape`].
pub fn evaluate_rule(record: &Value, rule: &Rule) -> Result<Outcome, EvalError> {
    if let Some(field) = rule.optional_field() {
        if !is_present(record, field) {
            return Ok(Outcome::pass(format!(
                "Optional field '{field}' not present - skipping validation."
            )));
        }
    }

    match rule {
        Rule::Combinator(combinator) => evaluate_combinator(record, combinator),
        Rule::Match(rule) => Ok(evaluate_match(record, rule)),
        Rule::Predicate(rule) => evaluate_leaf(record, rule),
        Rule::Unstructured(u) => Ok(Outcome::pass(format!(
            "Unstructured field '{}' - handled by LLM evaluation",
            u.field
        ))),
        Rule::Invalid(invalid) => match &invalid.problem {
            ShapeProblem::UnknownKind(kind) => {
                Ok(Outcome::fail(format!("Unknown rule type: {kind}")))
            }
            problem => Err(problem.clone().into()),
        },
    }
}

/// A wildcard path without a match triple hands the whole fanned-out
/// sequence to the predicate.
fn evaluate_leaf(record: &Value, rule: &PredicateRule) -> Result<Outcome, EvalError> {
    let value = resolve(record, &rule.field);
    if value.is_none() && rule.field.has_wildcard() {
        return Ok(Outcome::fail(format!("Field {} missing.", rule.field)));
    }
    evaluate_predicate(record, &rule.field, &rule.predicate, value.as_deref())
}
