//! Match rules: first-match search for an element inside nested arrays.
//!
//! `ordinary_level_exams.*.subjects` with `match_field: subject`,
//! `match_value: Mathematics`, `check_field: grade` passes when any exam has
//! a Mathematics subject whose grade is one of `values`.

use std::borrow::Cow;

use serde_json::Value;

use crate::schema::{MatchRule, Segment};

use super::predicates::{contains, display, display_list, values_equal};
use super::resolve::{resolve, resolve_segments};
use super::Outcome;

pub(crate) fn evaluate_match(record: &Value, rule: &MatchRule) -> Outcome {
    match rule.field.split_at_wildcard() {
        Some((prefix, suffix)) => across_containers(record, rule, prefix, suffix),
        None => within_resolved(record, rule),
    }
}

/// Walk `prefix` through mappings only, then scan the inner sequence of
/// every container found at the wildcard. Inner values that are not
/// sequences are skipped.
fn across_containers(
    record: &Value,
    rule: &MatchRule,
    prefix: &[Segment],
    suffix: &[Segment],
) -> Outcome {
    let mut current = record;
    for segment in prefix {
        match current.as_object().and_then(|m| m.get(&segment.as_key())) {
            Some(next) => current = next,
            None => return Outcome::fail(format!("Path {} not found in data", rule.field)),
        }
    }

    if let Some(containers) = current.as_array() {
        for container in containers {
            let inner = if suffix.is_empty() {
                Some(Cow::Borrowed(container))
            } else {
                resolve_segments(container, suffix)
            };
            let found = inner
                .as_deref()
                .and_then(Value::as_array)
                .and_then(|items| items.iter().find_map(|item| check_element(rule, item)));
            if let Some(found) = found {
                return found;
            }
        }
    }
    not_found(rule)
}

/// No wildcard: the field itself resolves to the array of candidates, whose
/// elements are either records or sequences of records.
fn within_resolved(record: &Value, rule: &MatchRule) -> Outcome {
    let Some(value) = resolve(record, &rule.field) else {
        return Outcome::fail(format!("{} missing.", rule.field));
    };
    let Some(items) = value.as_array() else {
        return Outcome::fail(format!(
            "Field {} is not an array for matching rule.",
            rule.field
        ));
    };
    items
        .iter()
        .find_map(|item| scan(rule, item))
        .unwrap_or_else(|| not_found(rule))
}

/// A record is checked directly; a sequence is searched for its first
/// matching record.
fn scan(rule: &MatchRule, value: &Value) -> Option<Outcome> {
    match value {
        Value::Array(items) => items.iter().find_map(|item| check_element(rule, item)),
        Value::Object(_) => check_element(rule, value),
        _ => None,
    }
}

fn check_element(rule: &MatchRule, item: &Value) -> Option<Outcome> {
    let element = item.as_object()?;
    let matched = element.get(&rule.match_field).unwrap_or(&Value::Null);
    if !values_equal(matched, &rule.match_value) {
        return None;
    }
    let checked = element.get(&rule.check_field).unwrap_or(&Value::Null);
    contains(&rule.values, checked).then(|| {
        Outcome::pass(format!(
            "Found {} with acceptable {}: {}",
            display(&rule.match_value),
            rule.check_field,
            display(checked)
        ))
    })
}

fn not_found(rule: &MatchRule) -> Outcome {
    Outcome::fail(format!(
        "Could not find {} with acceptable {} in {}",
        display(&rule.match_value),
        rule.check_field,
        display_list(&rule.values)
    ))
}
