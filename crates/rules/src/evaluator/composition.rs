//! Combinator evaluation: `and`, `or`, `not`, `optional_and`.
//!
//! Every child is evaluated, in declaration order, so the sub-result trail is
//! complete. Reasons summarize the combinator; child reasons live in
//! `sub_results`.

use serde_json::Value;

use crate::schema::{Combinator, Rule};

use super::resolve::is_present;
use super::{evaluate_rule, EvalError, Outcome};

pub(crate) fn evaluate_combinator(
    record: &Value,
    combinator: &Combinator,
) -> Result<Outcome, EvalError> {
    let outcome = match combinator {
        Combinator::All(rules) => {
            let subs = evaluate_all(record, rules)?;
            Outcome::new(subs.iter().all(|o| o.passed), "All subrules must pass.")
                .with_sub_results(subs)
        }
        Combinator::Any(rules) => {
            let subs = evaluate_all(record, rules)?;
            Outcome::new(
                subs.iter().any(|o| o.passed),
                "At least one subrule must pass.",
            )
            .with_sub_results(subs)
        }
        Combinator::Not(rule) => {
            let inner = evaluate_rule(record, rule)?;
            Outcome::new(!inner.passed, "Negated rule result.").with_sub_results(vec![inner])
        }
        Combinator::OptionalAll(rules) => {
            let any_present = rules
                .iter()
                .filter_map(Rule::field)
                .any(|field| is_present(record, field));
            if !any_present {
                return Ok(Outcome::pass("Optional group - no fields present."));
            }
            let subs = evaluate_all(record, rules)?;
            Outcome::new(
                subs.iter().all(|o| o.passed),
                "All subrules in optional group must pass when present.",
            )
            .with_sub_results(subs)
        }
    };
    Ok(outcome)
}

fn evaluate_all(record: &Value, rules: &[Rule]) -> Result<Vec<Outcome>, EvalError> {
    rules.iter().map(|rule| evaluate_rule(record, rule)).collect()
}
