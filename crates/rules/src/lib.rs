//! Declarative eligibility rule engine for semi-structured records.
//!
//! This crate provides:
//! - A closed rule model (predicates, match rules, combinators, unstructured markers)
//! - Dotted path resolution with indices and `*` wildcard fan-out
//! - Per-rule evaluation with human-readable reasons and a failure boundary
//! - JSON/YAML rules file loading and structural linting
//! - Parallel batch evaluation over independent records

pub mod evaluator;
pub mod loader;
pub mod schema;
pub mod validation;

pub use evaluator::{evaluate_rule, EvalError, EvaluationDetail, Outcome, RuleSetEvaluator, RuleSetResult};
pub use loader::{load_rules_file, parse_rules, split_rules, LoadError, RuleFile};
pub use schema::{FieldPath, Rule, UnstructuredField};
pub use validation::{validate_rules, ValidationResult};
