//! Rule tree types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::path::FieldPath;
use super::pattern::Pattern;

/// Every predicate `type` the engine understands.
pub const PREDICATE_KINDS: &[&str] = &[
    "exists",
    "not_exists",
    "exact_match",
    "one_of",
    "not_in",
    "range",
    "min",
    "max",
    "regex",
    "boolean",
    "date_before",
    "date_after",
    "date_range",
    "string_contains",
    "length_check",
    "array_length",
    "nested_field_validation",
];

/// Combinator `type` names.
pub const COMBINATOR_KINDS: &[&str] = &["and", "or", "not", "optional_and"];

/// Marker `type` for fields judged outside the structured engine.
pub const UNSTRUCTURED_KIND: &str = "unstructured";

// ── Rule ────────────────────────────────────────────────────────────

/// One node of a declarative rule tree.
///
/// Rules are read from plain JSON (or YAML) and never fail to deserialize:
/// anything that does not fit a known shape becomes [`Rule::Invalid`] and
/// fails when evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Predicate(PredicateRule),
    Match(MatchRule),
    Combinator(Combinator),
    Unstructured(UnstructuredField),
    Invalid(InvalidRule),
}

impl Rule {
    /// The field this rule addresses, if any.
    pub fn field(&self) -> Option<&FieldPath> {
        match self {
            Rule::Predicate(p) => Some(&p.field),
            Rule::Match(m) => Some(&m.field),
            Rule::Unstructured(u) => Some(&u.field),
            Rule::Invalid(i) => i.field.as_ref(),
            Rule::Combinator(_) => None,
        }
    }

    /// Field of a rule flagged `optional: true`.
    pub fn optional_field(&self) -> Option<&FieldPath> {
        let optional = match self {
            Rule::Predicate(p) => p.optional,
            Rule::Match(m) => m.optional,
            Rule::Invalid(i) => i.optional,
            Rule::Combinator(_) | Rule::Unstructured(_) => false,
        };
        if optional {
            self.field().filter(|f| !f.is_empty())
        } else {
            None
        }
    }

    /// Discriminator as written in the rule source.
    pub fn kind(&self) -> &str {
        match self {
            Rule::Predicate(p) => p.predicate.kind(),
            Rule::Match(m) => &m.kind,
            Rule::Combinator(c) => c.kind(),
            Rule::Unstructured(_) => UNSTRUCTURED_KIND,
            Rule::Invalid(i) => i.kind.as_deref().unwrap_or(""),
        }
    }

    pub fn is_unstructured(&self) -> bool {
        matches!(self, Rule::Unstructured(_))
    }

    /// Render back to the plain JSON shape the rule was read from.
    pub fn to_value(&self) -> Value {
        match self {
            Rule::Predicate(p) => p.to_value(),
            Rule::Match(m) => m.to_value(),
            Rule::Combinator(c) => c.to_value(),
            Rule::Unstructured(u) => json!({
                "field": u.field.as_str(),
                "type": UNSTRUCTURED_KIND,
                "description": u.description,
                "evaluation_criteria": u.evaluation_criteria,
            }),
            Rule::Invalid(i) => i.raw.clone(),
        }
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Rule::from_value(&v))
    }
}

fn with_field(field: &FieldPath, kind: &str, optional: bool) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("field".into(), Value::String(field.as_str().to_string()));
    if !kind.is_empty() {
        map.insert("type".into(), Value::String(kind.to_string()));
    }
    if optional {
        map.insert("optional".into(), Value::Bool(true));
    }
    map
}

// ── Predicates ──────────────────────────────────────────────────────

/// A leaf rule testing the value at `field`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateRule {
    pub field: FieldPath,
    pub optional: bool,
    pub predicate: Predicate,
}

impl PredicateRule {
    pub fn new(field: &str, predicate: Predicate) -> Self {
        Self {
            field: FieldPath::parse(field),
            optional: false,
            predicate,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn to_value(&self) -> Value {
        let mut map = with_field(&self.field, self.predicate.kind(), self.optional);
        self.predicate.write_params(&mut map);
        Value::Object(map)
    }
}

/// The closed set of predicate kinds and their parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Exists,
    NotExists,
    ExactMatch { value: Value },
    OneOf { values: Vec<Value> },
    NotIn { values: Vec<Value> },
    /// Inclusive on both ends.
    Range { min: Value, max: Value },
    Min { min: Value },
    Max { max: Value },
    /// Matched from the start of the string, not anywhere in it.
    Regex { pattern: Pattern },
    Boolean { value: bool },
    DateBefore { before: String },
    DateAfter { after: String },
    DateRange {
        after: Option<String>,
        before: Option<String>,
    },
    StringContains {
        values: Vec<String>,
        case_insensitive: bool,
    },
    LengthCheck {
        min_length: Option<f64>,
        max_length: Option<f64>,
    },
    ArrayLength {
        min_length: Option<f64>,
        max_length: Option<f64>,
    },
    NestedFieldValidation { nested_rules: Vec<Rule> },
}

impl Predicate {
    pub fn kind(&self) -> &'static str {
        match self {
            Predicate::Exists => "exists",
            Predicate::NotExists => "not_exists",
            Predicate::ExactMatch { .. } => "exact_match",
            Predicate::OneOf { .. } => "one_of",
            Predicate::NotIn { .. } => "not_in",
            Predicate::Range { .. } => "range",
            Predicate::Min { .. } => "min",
            Predicate::Max { .. } => "max",
            Predicate::Regex { .. } => "regex",
            Predicate::Boolean { .. } => "boolean",
            Predicate::DateBefore { .. } => "date_before",
            Predicate::DateAfter { .. } => "date_after",
            Predicate::DateRange { .. } => "date_range",
            Predicate::StringContains { .. } => "string_contains",
            Predicate::LengthCheck { .. } => "length_check",
            Predicate::ArrayLength { .. } => "array_length",
            Predicate::NestedFieldValidation { .. } => "nested_field_validation",
        }
    }

    fn write_params(&self, map: &mut Map<String, Value>) {
        let mut put = |key: &str, value: Value| {
            map.insert(key.to_string(), value);
        };
        match self {
            Predicate::Exists | Predicate::NotExists => {}
            Predicate::ExactMatch { value } => put("value", value.clone()),
            Predicate::OneOf { values } | Predicate::NotIn { values } => {
                put("values", Value::Array(values.clone()))
            }
            Predicate::Range { min, max } => {
                put("min", min.clone());
                put("max", max.clone());
            }
            Predicate::Min { min } => put("min", min.clone()),
            Predicate::Max { max } => put("max", max.clone()),
            Predicate::Regex { pattern } => put("pattern", json!(pattern.as_str())),
            Predicate::Boolean { value } => put("value", json!(value)),
            Predicate::DateBefore { before } => put("before", json!(before)),
            Predicate::DateAfter { after } => put("after", json!(after)),
            Predicate::DateRange { after, before } => {
                if let Some(after) = after {
                    put("after", json!(after));
                }
                if let Some(before) = before {
                    put("before", json!(before));
                }
            }
            Predicate::StringContains {
                values,
                case_insensitive,
            } => {
                put("values", json!(values));
                if *case_insensitive {
                    put("case_insensitive", Value::Bool(true));
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
                if let Some(min) = min_length {
                    put("min_length", length_value(*min));
                }
                if let Some(max) = max_length {
                    put("max_length", length_value(*max));
                }
            }
            Predicate::NestedFieldValidation { nested_rules } => put(
                "nested_rules",
                Value::Array(nested_rules.iter().map(Rule::to_value).collect()),
            ),
        }
    }
}

/// Whole-number bounds render as integers, as they are usually written.
fn length_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

// ── Match predicate ─────────────────────────────────────────────────

/// Searches an array of records for an element whose `match_field` equals
/// `match_value`, then requires its `check_field` to be one of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRule {
    pub field: FieldPath,
    pub optional: bool,
    /// Declared `type` (usually `one_of`); kept for round-tripping.
    pub kind: String,
    pub match_field: String,
    pub match_value: Value,
    pub check_field: String,
    pub values: Vec<Value>,
}

impl MatchRule {
    fn to_value(&self) -> Value {
        let mut map = with_field(&self.field, &self.kind, self.optional);
        map.insert("match_field".into(), json!(self.match_field));
        map.insert("match_value".into(), self.match_value.clone());
        map.insert("check_field".into(), json!(self.check_field));
        map.insert("values".into(), Value::Array(self.values.clone()));
        Value::Object(map)
    }
}

// ── Combinators ─────────────────────────────────────────────────────

/// Composite rules over sub-rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Combinator {
    /// `and`
    All(Vec<Rule>),
    /// `or`
    Any(Vec<Rule>),
    /// `not`
    Not(Box<Rule>),
    /// `optional_and`: `and`, but only when at least one sub-rule's field is present.
    OptionalAll(Vec<Rule>),
}

impl Combinator {
    pub fn kind(&self) -> &'static str {
        match self {
            Combinator::All(_) => "and",
            Combinator::Any(_) => "or",
            Combinator::Not(_) => "not",
            Combinator::OptionalAll(_) => "optional_and",
        }
    }

    /// Direct children, in declaration order.
    pub fn children(&self) -> &[Rule] {
        match self {
            Combinator::All(rules) | Combinator::Any(rules) | Combinator::OptionalAll(rules) => {
                rules
            }
            Combinator::Not(rule) => std::slice::from_ref(rule.as_ref()),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Combinator::Not(rule) => json!({ "type": "not", "rule": rule.to_value() }),
            other => json!({
                "type": other.kind(),
                "rules": other.children().iter().map(Rule::to_value).collect::<Vec<_>>(),
            }),
        }
    }
}

// ── Unstructured marker ─────────────────────────────────────────────

/// A free-text field handed to the unstructured judge.
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredField {
    pub field: FieldPath,
    pub description: String,
    pub evaluation_criteria: String,
}

// ── Malformed rules ─────────────────────────────────────────────────

/// A rule whose shape could not be understood.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRule {
    /// The definition exactly as supplied.
    pub raw: Value,
    pub kind: Option<String>,
    pub field: Option<FieldPath>,
    pub optional: bool,
    pub problem: ShapeProblem,
}

/// Why a rule definition is malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeProblem {
    #[error("rule must be an object")]
    NotAnObject,

    #[error("rule must have a 'type' field")]
    MissingKind,

    #[error("unknown rule type: {0}")]
    UnknownKind(String),

    #[error("{kind} rule must have a non-empty 'field'")]
    MissingField { kind: String },

    #[error("{kind} rule must have '{param}'")]
    MissingParam { kind: String, param: &'static str },

    #[error("{kind} rule has invalid '{param}': expected {expected}")]
    InvalidParam {
        kind: String,
        param: &'static str,
        expected: &'static str,
    },

    #[error("{kind} rule must have a non-empty 'rules' list")]
    EmptyRules { kind: String },
}
