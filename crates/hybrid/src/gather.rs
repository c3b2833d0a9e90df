//! Collect what the judge gets to see from a record.

use serde_json::Value;

use screening_llm::FieldSubmission;
use screening_rules::evaluator::resolve;
use screening_rules::{FieldPath, UnstructuredField};

/// Values of the declared unstructured fields that are present in `record`,
/// in declaration order. Absent and null fields are left out.
pub fn gather_unstructured(record: &Value, fields: &[UnstructuredField]) -> Vec<FieldSubmission> {
    fields
        .iter()
        .filter_map(|def| {
            resolve(record, &def.field).map(|value| FieldSubmission {
                field: def.field.to_string(),
                value: value.into_owned(),
                description: def.description.clone(),
                evaluation_criteria: def.evaluation_criteria.clone(),
            })
        })
        .collect()
}

/// Free-text context for the judge, e.g. the post applied for. Empty when
/// the field is absent.
pub fn context_hint(record: &Value, field: &FieldPath) -> String {
    match resolve(record, field) {
        Some(value) => match value.as_ref() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        None => String::new(),
    }
}
