//! Structural rule linting with located errors and suggestions.
//!
//! Walks a rule list and reports every malformed node with a path such as
//! `rules[4].rules[1]`. Errors mark rules that can never evaluate normally;
//! warnings flag definitions that evaluate but probably do not mean what the
//! author intended. Evaluation never depends on this pass.

pub(crate) mod fuzzy;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::*;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A rule that cannot evaluate normally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location in the rule list, e.g. `"rules[4].rules[1]"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Lint a rule list.
pub fn validate_rules(rules: &[Rule]) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (i, rule) in rules.iter().enumerate() {
        check_rule(rule, &format!("rules[{i}]"), true, &mut result);
    }
    result
}

fn check_rule(rule: &Rule, path: &str, top_level: bool, result: &mut ValidationResult) {
    match rule {
        Rule::Invalid(invalid) => check_invalid(invalid, path, result),
        Rule::Predicate(p) => check_predicate(&p.predicate, path, result),
        Rule::Match(m) => {
            if m.values.is_empty() {
                result.warn(path, "match rule has no allowed 'values' and can never pass");
            }
        }
        Rule::Combinator(Combinator::Not(inner)) => {
            check_rule(inner, &format!("{path}.rule"), false, result)
        }
        Rule::Combinator(c) => {
            for (j, child) in c.children().iter().enumerate() {
                check_rule(child, &format!("{path}.rules[{j}]"), false, result);
            }
        }
        Rule::Unstructured(u) => {
            if !top_level {
                result.warn(
                    path,
                    format!(
                        "unstructured field '{}' is only sent for judgment at the top level; here it always passes",
                        u.field
                    ),
                );
            }
        }
    }
}

fn check_invalid(invalid: &InvalidRule, path: &str, result: &mut ValidationResult) {
    let message = invalid.problem.to_string();
    if let ShapeProblem::UnknownKind(kind) = &invalid.problem {
        let known: Vec<&str> = PREDICATE_KINDS
            .iter()
            .chain(COMBINATOR_KINDS)
            .chain(std::iter::once(&UNSTRUCTURED_KIND))
            .copied()
            .collect();
        if let Some(suggestion) = fuzzy::fuzzy_match(kind, &known) {
            result.error_with_suggestion(path, message, format!("Did you mean '{suggestion}'?"));
            return;
        }
    }
    result.error(path, message);
}

fn check_predicate(predicate: &Predicate, path: &str, result: &mut ValidationResult) {
    match predicate {
        Predicate::Regex { pattern } => {
            if let Err(e) = pattern.anchored() {
                result.error(path, format!("invalid regex pattern '{pattern}': {e}"));
            }
        }
        Predicate::Range { min, max } => {
            if let (Some(lo), Some(hi)) = (min.as_f64(), max.as_f64()) {
                if lo > hi {
                    result.warn(path, format!("range min {lo} is greater than max {hi}"));
                }
            } else if !same_scalar_type(min, max) {
                result.warn(path, "range bounds are not both numbers or both strings");
            }
        }
        Predicate::LengthCheck {
            min_length,
            max_length,
        }
        | Predicate::ArrayLength {
            min_length,
            max_length,
        } => {
            if let (Some(lo), Some(hi)) = (min_length, max_length) {
                if lo > hi {
                    result.warn(path, format!("min_length {lo} is greater than max_length {hi}"));
                }
            }
        }
        Predicate::DateBefore { before } => check_date(before, path, result),
        Predicate::DateAfter { after } => check_date(after, path, result),
        Predicate::DateRange { after, before } => {
            for bound in [after, before].into_iter().flatten() {
                check_date(bound, path, result);
            }
        }
        Predicate::OneOf { values } if values.is_empty() => {
            result.warn(path, "one_of with an empty 'values' list can never pass");
        }
        Predicate::NestedFieldValidation { nested_rules } => {
            for (j, child) in nested_rules.iter().enumerate() {
                check_rule(child, &format!("{path}.nested_rules[{j}]"), false, result);
            }
        }
        _ => {}
    }
}

fn same_scalar_type(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_))
    )
}

/// Dates compare as plain strings, so only `YYYY-MM-DD` orders correctly.
fn check_date(bound: &str, path: &str, result: &mut ValidationResult) {
    if !is_iso_date(bound) {
        result.warn(
            path,
            format!("date bound '{bound}' is not YYYY-MM-DD; comparison is lexical"),
        );
    }
}

fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lint(value: serde_json::Value) -> ValidationResult {
        let rules: Vec<Rule> = serde_json::from_value(value).unwrap();
        validate_rules(&rules)
    }

    #[test]
    fn well_formed_rules_are_valid() {
        let result = lint(json!([
            {"field": "age", "type": "range", "min": 18, "max": 45},
            {"type": "or", "rules": [
                {"field": "phone_office", "type": "exists"},
                {"field": "phone_mobile", "type": "exists"}
            ]},
            {"field": "notes", "type": "unstructured", "evaluation_criteria": "x"}
        ]));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn nested_problems_are_located() {
        let result = lint(json!([
            {"field": "age", "type": "exists"},
            {"type": "and", "rules": [
                {"field": "a", "type": "exists"},
                {"type": "not", "rule": {"field": "b", "type": "range", "min": 1}}
            ]}
        ]));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "rules[1].rules[1].rule");
        assert_eq!(result.errors[0].message, "range rule must have 'max'");
    }

    #[test]
    fn unknown_kind_gets_suggestion() {
        let result = lint(json!([{"field": "x", "type": "optinal_and"}]));
        assert_eq!(
            result.errors[0].suggestion.as_deref(),
            Some("Did you mean 'optional_and'?")
        );
    }

    #[test]
    fn bad_regex_is_an_error() {
        let result = lint(json!([{"field": "x", "type": "regex", "pattern": "[a-"}]));
        assert!(!result.valid);
        assert!(result.errors[0].message.starts_with("invalid regex pattern"));
    }

    #[test]
    fn suspicious_definitions_warn() {
        let result = lint(json!([
            {"field": "age", "type": "range", "min": 45, "max": 18},
            {"field": "dob", "type": "date_before", "before": "01/01/2000"},
            {"field": "name", "type": "length_check", "min_length": 10, "max_length": 2},
            {"type": "and", "rules": [
                {"field": "notes", "type": "unstructured", "evaluation_criteria": "x"}
            ]},
            {"field": "emp", "type": "nested_field_validation", "nested_rules": [
                {"field": "emp.start", "type": "date_range", "after": "1990"}
            ]}
        ]));
        assert!(result.valid);
        let paths: Vec<&str> = result.warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "rules[0]",
                "rules[1]",
                "rules[2]",
                "rules[3].rules[0]",
                "rules[4].nested_rules[0]"
            ]
        );
    }

    #[test]
    fn iso_dates() {
        assert!(is_iso_date("2024-02-29"));
        assert!(!is_iso_date("2024-2-29"));
        assert!(!is_iso_date("2024/02/29"));
    }
}
