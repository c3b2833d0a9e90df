//! Leaf predicate evaluation.
//!
//! Each predicate receives the already-resolved value (`None` when absent)
//! and produces an [`Outcome`]. Reasons are the same whether the check passes
//! or fails, so a detail trail always says what was checked.

use std::cmp::Ordering;

use serde_json::Value;

use crate::schema::{FieldPath, Predicate};

use super::{evaluate_rule, EvalError, Outcome};

pub(crate) fn evaluate_predicate(
    record: &Value,
    field: &FieldPath,
    predicate: &Predicate,
    value: Option<&Value>,
) -> Result<Outcome, EvalError> {
    let outcome = match predicate {
        Predicate::Exists => Outcome::new(value.is_some(), format!("Field '{field}' must exist.")),
        Predicate::NotExists => {
            Outcome::new(value.is_none(), format!("Field '{field}' must not exist."))
        }
        Predicate::ExactMatch { value: expected } => {
            let actual = value.unwrap_or(&Value::Null);
            Outcome::new(
                values_equal(actual, expected),
                format!("Expected {}, got {}.", display(expected), display(actual)),
            )
        }
        Predicate::OneOf { values } => {
            let actual = value.unwrap_or(&Value::Null);
            Outcome::new(
                contains(values, actual),
                format!("{} not in allowed set.", display(actual)),
            )
        }
        Predicate::NotIn { values } => {
            let actual = value.unwrap_or(&Value::Null);
            Outcome::new(
                !contains(values, actual),
                format!("{} is disallowed.", display(actual)),
            )
        }
        Predicate::Range { min, max } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let within = compare(field, min, v)? != Ordering::Greater
                && compare(field, v, max)? != Ordering::Greater;
            Outcome::new(
                within,
                format!(
                    "{field}={} not in range {}-{}.",
                    display(v),
                    display(min),
                    display(max)
                ),
            )
        }
        Predicate::Min { min } => {
            let Some(v) = value else { return Ok(missing(field)) };
            Outcome::new(
                compare(field, v, min)? != Ordering::Less,
                format!("{field}={} < {}", display(v), display(min)),
            )
        }
        Predicate::Max { max } => {
            let Some(v) = value else { return Ok(missing(field)) };
            Outcome::new(
                compare(field, v, max)? != Ordering::Greater,
                format!("{field}={} > {}", display(v), display(max)),
            )
        }
        Predicate::Regex { pattern } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let anchored = pattern.anchored().map_err(|source| EvalError::InvalidPattern {
                pattern: pattern.to_string(),
                source: source.clone(),
            })?;
            Outcome::new(
                anchored.is_match(&display(v)),
                format!("{field} does not match {pattern}."),
            )
        }
        Predicate::Boolean { value: expected } => {
            let actual = value.unwrap_or(&Value::Null);
            Outcome::new(
                actual.as_bool() == Some(*expected),
                format!("Expected {expected}, got {}.", display(actual)),
            )
        }
        Predicate::DateBefore { before } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let date = display(v);
            Outcome::new(
                date.as_str() < before.as_str(),
                format!("{date} is not before {before}."),
            )
        }
        Predicate::DateAfter { after } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let date = display(v);
            Outcome::new(
                date.as_str() > after.as_str(),
                format!("{date} is not after {after}."),
            )
        }
        Predicate::DateRange { after, before } => {
            let Some(v) = value else { return Ok(missing(field)) };
            date_range(field, &display(v), after.as_deref(), before.as_deref())
        }
        Predicate::StringContains {
            values,
            case_insensitive,
        } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let haystack = display(v);
            let found = if *case_insensitive {
                let haystack = haystack.to_lowercase();
                values.iter().any(|n| haystack.contains(&n.to_lowercase()))
            } else {
                values.iter().any(|n| haystack.contains(n.as_str()))
            };
            Outcome::new(
                found,
                format!("{field} must contain one of {}.", display_list(values)),
            )
        }
        Predicate::LengthCheck {
            min_length,
            max_length,
        } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let len = display(v).chars().count();
            Outcome::new(
                within_length(len, *min_length, *max_length),
                format!(
                    "{field} length {len} not in range {}.",
                    length_bounds(*min_length, *max_length)
                ),
            )
        }
        Predicate::ArrayLength {
            min_length,
            max_length,
        } => {
            let Some(v) = value else { return Ok(missing(field)) };
            let Some(items) = v.as_array() else {
                return Ok(Outcome::fail(format!("{field} is not an array.")));
            };
            Outcome::new(
                within_length(items.len(), *min_length, *max_length),
                format!(
                    "{field} array length {} not in range {}.",
                    items.len(),
                    length_bounds(*min_length, *max_length)
                ),
            )
        }
        Predicate::NestedFieldValidation { nested_rules } => {
            let sub_results = nested_rules
                .iter()
                .map(|rule| evaluate_rule(record, rule))
                .collect::<Result<Vec<_>, _>>()?;
            let failures: Vec<&str> = sub_results
                .iter()
                .filter(|o| !o.passed)
                .map(|o| o.reason.as_str())
                .collect();
            let reason = if failures.is_empty() {
                "All nested validations passed.".to_string()
            } else {
                failures.join("; ")
            };
            Outcome::new(failures.is_empty(), reason).with_sub_results(sub_results)
        }
    };
    Ok(outcome)
}

fn missing(field: &FieldPath) -> Outcome {
    Outcome::fail(format!("{field} missing."))
}

fn date_range(field: &FieldPath, date: &str, after: Option<&str>, before: Option<&str>) -> Outcome {
    let mut violations = Vec::new();
    if let Some(after) = after {
        if date <= after {
            violations.push(format!("{date} not after {after}."));
        }
    }
    if let Some(before) = before {
        if date >= before {
            violations.push(format!("{date} not before {before}."));
        }
    }
    if violations.is_empty() {
        Outcome::pass(format!("{field} date is valid."))
    } else {
        Outcome::fail(violations.join(" "))
    }
}

fn within_length(len: usize, min: Option<f64>, max: Option<f64>) -> bool {
    let len = len as f64;
    len >= min.unwrap_or(0.0) && max.map_or(true, |max| len <= max)
}

fn length_bounds(min: Option<f64>, max: Option<f64>) -> String {
    let min = format_number(min.unwrap_or(0.0));
    let max = max.map_or_else(|| "inf".to_string(), format_number);
    format!("{min}-{max}")
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ── Value helpers ───────────────────────────────────────────────────

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

pub(crate) fn contains(values: &[Value], needle: &Value) -> bool {
    values.iter().any(|v| values_equal(v, needle))
}

/// Order two values of the same scalar type. Numbers and strings compare
/// naturally; any other pairing is a [`EvalError::TypeMismatch`].
fn compare(field: &FieldPath, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.ok_or_else(|| EvalError::TypeMismatch {
        field: field.to_string(),
        left: type_name(left),
        right: type_name(right),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings render bare; everything else as compact JSON.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn display_list<T: serde::Serialize>(values: &[T]) -> String {
    serde_json::to_string(values).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn check(predicate: Predicate, value: Option<Value>) -> Outcome {
        let field = FieldPath::parse("f");
        evaluate_predicate(&json!({}), &field, &predicate, value.as_ref()).unwrap()
    }

    #[test]
    fn range_is_inclusive() {
        let range = || Predicate::Range {
            min: json!(18),
            max: json!(45),
        };
        assert!(check(range(), Some(json!(18))).passed);
        assert!(check(range(), Some(json!(45))).passed);
        assert!(check(range(), Some(json!(30.5))).passed);
        let out = check(range(), Some(json!(46)));
        assert!(!out.passed);
        assert_eq!(out.reason, "f=46 not in range 18-45.");
    }

    #[test]
    fn range_on_absent_value_fails_without_error() {
        let out = check(
            Predicate::Range {
                min: json!(1),
                max: json!(2),
            },
            None,
        );
        assert!(!out.passed);
        assert_eq!(out.reason, "f missing.");
    }

    #[test]
    fn comparing_string_with_number_is_an_error() {
        let field = FieldPath::parse("age");
        let err = evaluate_predicate(
            &json!({}),
            &field,
            &Predicate::Min { min: json!(18) },
            Some(&json!("twenty")),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "cannot compare string with number for field 'age'"
        );
    }

    #[test]
    fn min_and_max_bounds() {
        assert!(check(Predicate::Min { min: json!(5) }, Some(json!(5))).passed);
        assert!(!check(Predicate::Min { min: json!(5) }, Some(json!(4))).passed);
        assert!(check(Predicate::Max { max: json!(5) }, Some(json!(5.0))).passed);
        let out = check(Predicate::Max { max: json!(5) }, Some(json!(6)));
        assert_eq!(out.reason, "f=6 > 5");
    }

    #[test]
    fn regex_matches_from_start_only() {
        let pattern = || Predicate::Regex {
            pattern: "[0-9]{3}".into(),
        };
        assert!(check(pattern(), Some(json!("123abc"))).passed);
        assert!(!check(pattern(), Some(json!("abc123"))).passed);
        // Numbers are matched against their text.
        assert!(check(pattern(), Some(json!(5234567))).passed);
    }

    #[test]
    fn regex_alternation_stays_anchored() {
        let out = check(
            Predicate::Regex {
                pattern: "a|b".into(),
            },
            Some(json!("xb")),
        );
        assert!(!out.passed);
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let field = FieldPath::parse("f");
        let err = evaluate_predicate(
            &json!({}),
            &field,
            &Predicate::Regex {
                pattern: "(".into(),
            },
            Some(&json!("x")),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InvalidPattern { .. }));
    }

    #[test]
    fn boolean_requires_identity_not_truthiness() {
        let yes = || Predicate::Boolean { value: true };
        assert!(check(yes(), Some(json!(true))).passed);
        assert!(!check(yes(), Some(json!(1))).passed);
        assert!(!check(yes(), Some(json!("true"))).passed);
        assert_eq!(check(yes(), None).reason, "Expected true, got null.");
    }

    #[test]
    fn exact_match_and_set_membership() {
        let out = check(
            Predicate::ExactMatch {
                value: json!("Mauritian"),
            },
            Some(json!("British")),
        );
        assert!(!out.passed);
        assert_eq!(out.reason, "Expected Mauritian, got British.");

        let allowed = || Predicate::OneOf {
            values: vec![json!(1), json!("two")],
        };
        assert!(check(allowed(), Some(json!(1.0))).passed);
        assert_eq!(check(allowed(), Some(json!(3))).reason, "3 not in allowed set.");

        let banned = Predicate::NotIn {
            values: vec![json!("Dismissed")],
        };
        assert!(check(banned.clone(), None).passed);
        assert!(!check(banned, Some(json!("Dismissed"))).passed);
    }

    #[test]
    fn date_comparisons_are_lexical() {
        let before = || Predicate::DateBefore {
            before: "2005-01-01".into(),
        };
        assert!(check(before(), Some(json!("1990-05-17"))).passed);
        let out = check(before(), Some(json!("2010-01-01")));
        assert_eq!(out.reason, "2010-01-01 is not before 2005-01-01.");
        assert!(!check(before(), None).passed);

        let after = Predicate::DateAfter {
            after: "2020-01-01".into(),
        };
        assert!(check(after, Some(json!("2024-03-01"))).passed);
    }

    #[test]
    fn date_range_collects_violated_bounds() {
        let range = |after: Option<&str>, before: Option<&str>| Predicate::DateRange {
            after: after.map(str::to_string),
            before: before.map(str::to_string),
        };
        let ok = check(range(Some("2020-01-01"), Some("2030-01-01")), Some(json!("2024-06-30")));
        assert!(ok.passed);
        assert_eq!(ok.reason, "f date is valid.");

        let both = check(range(Some("2030-01-01"), Some("2020-01-01")), Some(json!("2024-06-30")));
        assert!(!both.passed);
        assert_eq!(
            both.reason,
            "2024-06-30 not after 2030-01-01. 2024-06-30 not before 2020-01-01."
        );

        // Bounds are exclusive.
        assert!(!check(range(Some("2024-06-30"), None), Some(json!("2024-06-30"))).passed);
        assert!(check(range(None, None), Some(json!("anything"))).passed);
        assert!(!check(range(None, None), None).passed);
    }

    #[test]
    fn string_contains_respects_case_flag() {
        let contains = |ci| Predicate::StringContains {
            values: vec!["Street".into(), "Road".into()],
            case_insensitive: ci,
        };
        assert!(check(contains(false), Some(json!("12 Royal Road"))).passed);
        assert!(!check(contains(false), Some(json!("12 royal road"))).passed);
        assert!(check(contains(true), Some(json!("12 royal road"))).passed);
        assert_eq!(
            check(contains(false), Some(json!("x"))).reason,
            r#"f must contain one of ["Street","Road"]."#
        );
    }

    #[test]
    fn length_check_defaults_to_open_bounds() {
        let out = check(
            Predicate::LengthCheck {
                min_length: Some(2.0),
                max_length: None,
            },
            Some(json!("A")),
        );
        assert!(!out.passed);
        assert_eq!(out.reason, "f length 1 not in range 2-inf.");

        let unicode = check(
            Predicate::LengthCheck {
                min_length: None,
                max_length: Some(4.0),
            },
            Some(json!("Zoë")),
        );
        assert!(unicode.passed);
    }

    #[test]
    fn array_length_requires_sequence() {
        let bounds = || Predicate::ArrayLength {
            min_length: Some(1.0),
            max_length: Some(3.0),
        };
        assert!(check(bounds(), Some(json!([1, 2]))).passed);
        assert!(!check(bounds(), Some(json!([]))).passed);
        assert_eq!(check(bounds(), Some(json!("ab"))).reason, "f is not an array.");
        assert_eq!(
            check(bounds(), Some(json!([1, 2, 3, 4]))).reason,
            "f array length 4 not in range 1-3."
        );
    }

    #[test]
    fn values_equal_is_numeric_aware_and_structural() {
        assert!(values_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }
}
