//! Shape-checking conversion from plain JSON into [`Rule`] trees.

use serde_json::{Map, Value};

use super::path::FieldPath;
use super::pattern::Pattern;
use super::rule::*;

impl Rule {
    /// Interpret one rule definition.
    ///
    /// Never fails: malformed definitions become [`Rule::Invalid`] carrying
    /// the original value and the reason it was rejected.
    pub fn from_value(value: &Value) -> Rule {
        let Some(obj) = value.as_object() else {
            return invalid(value, None, None, false, ShapeProblem::NotAnObject);
        };

        let kind = obj
            .get("type")
            .or_else(|| obj.get("kind"))
            .and_then(Value::as_str);
        let field = obj
            .get("field")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(FieldPath::parse);
        let optional = obj.get("optional").and_then(Value::as_bool).unwrap_or(false);

        let Some(kind) = kind else {
            // An untyped rule that still carries the match triple is a match rule.
            if let (Some(field), true) = (&field, has_match_triple(obj)) {
                return parse_match(value, obj, "", field.clone(), optional);
            }
            return invalid(value, None, field, optional, ShapeProblem::MissingKind);
        };

        let fields = Params { obj, kind };
        let parsed = match kind {
            "and" => fields.rules("rules").map(Combinator::All),
            "or" => fields.rules("rules").map(Combinator::Any),
            "optional_and" => fields.rules("rules").map(Combinator::OptionalAll),
            "not" => fields.negated().map(|r| Combinator::Not(Box::new(r))),
            UNSTRUCTURED_KIND => {
                return match parse_unstructured(&fields, field.clone()) {
                    Ok(u) => Rule::Unstructured(u),
                    Err(problem) => invalid(value, Some(kind), field, optional, problem),
                };
            }
            _ => {
                let Some(field) = field else {
                    let problem = if PREDICATE_KINDS.contains(&kind) || has_match_triple(obj) {
                        ShapeProblem::MissingField { kind: kind.to_string() }
                    } else {
                        ShapeProblem::UnknownKind(kind.to_string())
                    };
                    return invalid(value, Some(kind), None, optional, problem);
                };
                let known = PREDICATE_KINDS.contains(&kind);
                if has_match_triple(obj) && (field.has_wildcard() || !known) {
                    return parse_match(value, obj, kind, field, optional);
                }
                return match fields.predicate() {
                    Ok(predicate) => Rule::Predicate(PredicateRule {
                        field,
                        optional,
                        predicate,
                    }),
                    Err(problem) => invalid(value, Some(kind), Some(field), optional, problem),
                };
            }
        };

        match parsed {
            Ok(combinator) => Rule::Combinator(combinator),
            Err(problem) => invalid(value, Some(kind), field, optional, problem),
        }
    }
}

fn invalid(
    raw: &Value,
    kind: Option<&str>,
    field: Option<FieldPath>,
    optional: bool,
    problem: ShapeProblem,
) -> Rule {
    Rule::Invalid(InvalidRule {
        raw: raw.clone(),
        kind: kind.map(str::to_string),
        field,
        optional,
        problem,
    })
}

fn has_match_triple(obj: &Map<String, Value>) -> bool {
    ["match_field", "match_value", "check_field"]
        .iter()
        .all(|k| obj.contains_key(*k))
}

fn parse_match(
    raw: &Value,
    obj: &Map<String, Value>,
    kind: &str,
    field: FieldPath,
    optional: bool,
) -> Rule {
    match match_rule(&Params { obj, kind }, &field, optional) {
        Ok(rule) => Rule::Match(rule),
        Err(problem) => invalid(raw, Some(kind), Some(field), optional, problem),
    }
}

fn match_rule(
    params: &Params<'_>,
    field: &FieldPath,
    optional: bool,
) -> Result<MatchRule, ShapeProblem> {
    Ok(MatchRule {
        field: field.clone(),
        optional,
        kind: params.kind.to_string(),
        match_field: params.string("match_field")?,
        match_value: params.obj.get("match_value").cloned().unwrap_or(Value::Null),
        check_field: params.string("check_field")?,
        values: params.list_or_empty("values")?,
    })
}

fn parse_unstructured(
    params: &Params<'_>,
    field: Option<FieldPath>,
) -> Result<UnstructuredField, ShapeProblem> {
    let field = field.ok_or_else(|| ShapeProblem::MissingField {
        kind: UNSTRUCTURED_KIND.to_string(),
    })?;
    Ok(UnstructuredField {
        field,
        description: params.optional_string("description")?.unwrap_or_default(),
        evaluation_criteria: params.string("evaluation_criteria")?,
    })
}

// ── Parameter access ────────────────────────────────────────────────

struct Params<'a> {
    obj: &'a Map<String, Value>,
    kind: &'a str,
}

impl Params<'_> {
    fn missing(&self, param: &'static str) -> ShapeProblem {
        ShapeProblem::MissingParam {
            kind: self.kind.to_string(),
            param,
        }
    }

    fn wrong(&self, param: &'static str, expected: &'static str) -> ShapeProblem {
        ShapeProblem::InvalidParam {
            kind: self.kind.to_string(),
            param,
            expected,
        }
    }

    /// A present, non-null parameter.
    fn get(&self, param: &str) -> Option<&Value> {
        self.obj.get(param).filter(|v| !v.is_null())
    }

    fn required(&self, param: &'static str) -> Result<Value, ShapeProblem> {
        self.get(param).cloned().ok_or_else(|| self.missing(param))
    }

    fn string(&self, param: &'static str) -> Result<String, ShapeProblem> {
        self.optional_string(param)?
            .ok_or_else(|| self.missing(param))
    }

    /// Empty strings count as absent, so `"after": ""` disables that bound.
    fn optional_string(&self, param: &'static str) -> Result<Option<String>, ShapeProblem> {
        match self.get(param) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.wrong(param, "a string")),
        }
    }

    fn list(&self, param: &'static str) -> Result<Vec<Value>, ShapeProblem> {
        match self.get(param) {
            None => Err(self.missing(param)),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(self.wrong(param, "a list")),
        }
    }

    fn list_or_empty(&self, param: &'static str) -> Result<Vec<Value>, ShapeProblem> {
        match self.get(param) {
            None => Ok(Vec::new()),
            Some(_) => self.list(param),
        }
    }

    fn string_list(&self, param: &'static str) -> Result<Vec<String>, ShapeProblem> {
        self.list(param)?
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(self.wrong(param, "a list of strings")),
            })
            .collect()
    }

    fn length(&self, param: &'static str) -> Result<Option<f64>, ShapeProblem> {
        match self.get(param) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.wrong(param, "a number")),
        }
    }

    fn flag(&self, param: &'static str) -> Result<bool, ShapeProblem> {
        match self.get(param) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.wrong(param, "a boolean")),
        }
    }

    fn rules(&self, param: &'static str) -> Result<Vec<Rule>, ShapeProblem> {
        let items = self.list(param)?;
        if items.is_empty() {
            return Err(ShapeProblem::EmptyRules {
                kind: self.kind.to_string(),
            });
        }
        Ok(items.iter().map(Rule::from_value).collect())
    }

    /// `not` takes a single `rule`; a one-element `rules` list is accepted too.
    fn negated(&self) -> Result<Rule, ShapeProblem> {
        if let Some(rule) = self.get("rule") {
            return Ok(Rule::from_value(rule));
        }
        match self.get("rules").and_then(Value::as_array) {
            Some(items) if items.len() == 1 => Ok(Rule::from_value(&items[0])),
            Some(_) => Err(self.wrong("rules", "exactly one sub-rule")),
            None => Err(self.missing("rule")),
        }
    }

    fn predicate(&self) -> Result<Predicate, ShapeProblem> {
        let predicate = match self.kind {
            "exists" => Predicate::Exists,
            "not_exists" => Predicate::NotExists,
            "exact_match" => Predicate::ExactMatch {
                value: self.obj.get("value").cloned().unwrap_or(Value::Null),
            },
            "one_of" => Predicate::OneOf {
                values: self.list("values")?,
            },
            "not_in" => Predicate::NotIn {
                values: self.list("values")?,
            },
            "range" => Predicate::Range {
                min: self.required("min")?,
                max: self.required("max")?,
            },
            "min" => Predicate::Min {
                min: self.required("min")?,
            },
            "max" => Predicate::Max {
                max: self.required("max")?,
            },
            "regex" => Predicate::Regex {
                pattern: Pattern::new(self.string("pattern")?),
            },
            "boolean" => match self.get("value") {
                Some(Value::Bool(b)) => Predicate::Boolean { value: *b },
                Some(_) => return Err(self.wrong("value", "a boolean")),
                None => return Err(self.missing("value")),
            },
            "date_before" => Predicate::DateBefore {
                before: self.string("before")?,
            },
            "date_after" => Predicate::DateAfter {
                after: self.string("after")?,
            },
            "date_range" => Predicate::DateRange {
                after: self.optional_string("after")?,
                before: self.optional_string("before")?,
            },
            "string_contains" => Predicate::StringContains {
                values: self.string_list("values")?,
                case_insensitive: self.flag("case_insensitive")?,
            },
            "length_check" => Predicate::LengthCheck {
                min_length: self.length("min_length")?,
                max_length: self.length("max_length")?,
            },
            "array_length" => Predicate::ArrayLength {
                min_length: self.length("min_length")?,
                max_length: self.length("max_length")?,
            },
            "nested_field_validation" => Predicate::NestedFieldValidation {
                nested_rules: self
                    .list_or_empty("nested_rules")?
                    .iter()
                    .map(Rule::from_value)
                    .collect(),
            },
            other => return Err(ShapeProblem::UnknownKind(other.to_string())),
        };
        Ok(predicate)
    }
}
