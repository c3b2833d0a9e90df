//! Rules file loading.
//!
//! A rules source is either a bare list of rule objects or an object
//! `{"rules": [...], "metadata": {...}}`, written as JSON or YAML. Structured
//! rules and `unstructured` field definitions live in the same list and are
//! separated with [`split_rules`].

mod error;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::schema::{Rule, UnstructuredField};

pub use self::error::{LoadError, Result};

/// Rules read from one source.
#[derive(Debug, Clone, Serialize)]
pub struct RuleFile {
    pub rules: Vec<Rule>,
    /// Free-form `metadata` object, when the source carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Load a `.json`, `.yml` or `.yaml` rules file. Other extensions are read as JSON.
pub fn load_rules_file(path: &Path) -> Result<RuleFile> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"));
    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    let file = parse_rules(value)?;
    info!(
        path = %path.display(),
        rules = file.rules.len(),
        "loaded rules file"
    );
    Ok(file)
}

/// Interpret an in-memory rules source.
pub fn parse_rules(value: Value) -> Result<RuleFile> {
    let (list, metadata) = match value {
        Value::Array(list) => (list, None),
        Value::Object(mut obj) => match obj.remove("rules") {
            Some(Value::Array(list)) => (list, obj.remove("metadata")),
            Some(other) => {
                return Err(LoadError::NotAList {
                    found: type_name(&other),
                })
            }
            None => return Err(LoadError::NotAList { found: "object" }),
        },
        other => {
            return Err(LoadError::NotAList {
                found: type_name(&other),
            })
        }
    };

    Ok(RuleFile {
        rules: list.iter().map(Rule::from_value).collect(),
        metadata,
    })
}

/// Separate structured rules from top-level `unstructured` field definitions.
pub fn split_rules(rules: Vec<Rule>) -> (Vec<Rule>, Vec<UnstructuredField>) {
    let mut structured = Vec::with_capacity(rules.len());
    let mut unstructured = Vec::new();
    for rule in rules {
        match rule {
            Rule::Unstructured(field) => unstructured.push(field),
            other => structured.push(other),
        }
    }
    (structured, unstructured)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
