//! Read-only path resolution over nested records.
//!
//! `null` anywhere along the path is treated as absent, so callers only ever
//! see `None` or a concrete value.

use std::borrow::Cow;

use serde_json::Value;

use crate::schema::{FieldPath, Segment};

/// Resolve `path` against `record`.
///
/// - the empty path yields the whole record
/// - `*` stops descent and yields the sequence it was applied to
/// - a digit-only segment indexes into a sequence
/// - a key applied to a sequence collects that key from every mapping element
///   that has it, `null` entries included
///
/// Collected values are owned; everything else borrows from `record`.
pub fn resolve<'a>(record: &'a Value, path: &FieldPath) -> Option<Cow<'a, Value>> {
    resolve_segments(record, path.segments())
}

/// Whether `path` resolves to a present value.
pub fn is_present(record: &Value, path: &FieldPath) -> bool {
    resolve(record, path).is_some()
}

pub(crate) fn resolve_segments<'a>(
    record: &'a Value,
    segments: &[Segment],
) -> Option<Cow<'a, Value>> {
    let mut current = Cow::Borrowed(record);
    for segment in segments {
        if current.is_null() {
            return None;
        }
        if *segment == Segment::Wildcard {
            return current.is_array().then_some(current);
        }
        current = match current {
            Cow::Borrowed(value) => step(value, segment)?,
            Cow::Owned(value) => Cow::Owned(step(&value, segment)?.into_owned()),
        };
    }
    (!current.is_null()).then_some(current)
}

fn step<'a>(value: &'a Value, segment: &Segment) -> Option<Cow<'a, Value>> {
    match (segment, value) {
        (Segment::Index(i), Value::Array(items)) => items.get(*i).map(Cow::Borrowed),
        (Segment::Index(_), _) => None,
        (Segment::Key(key), Value::Object(map)) => map.get(key).map(Cow::Borrowed),
        (Segment::Key(key), Value::Array(items)) => {
            let collected: Vec<Value> = items
                .iter()
                .filter_map(|item| item.as_object()?.get(key))
                .cloned()
                .collect();
            (!collected.is_empty()).then(|| Cow::Owned(Value::Array(collected)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn get(record: &Value, path: &str) -> Option<Value> {
        resolve(record, &FieldPath::parse(path)).map(Cow::into_owned)
    }

    fn application() -> Value {
        json!({
            "surname": "Doe",
            "middle_name": null,
            "current_government_employment": {"post": "Clerk", "ministry": "Health"},
            "ordinary_level_exams": [
                {"year": 2015, "subjects": [{"subject": "English", "grade": "C"}]},
                {"year": 2016, "subjects": [{"subject": "Mathematics", "grade": "B"}]},
                {"year": 2017}
            ]
        })
    }

    #[test]
    fn empty_path_is_whole_record() {
        let record = application();
        assert_eq!(get(&record, ""), Some(record.clone()));
    }

    #[test]
    fn nested_keys_descend() {
        assert_eq!(
            get(&application(), "current_government_employment.post"),
            Some(json!("Clerk"))
        );
        assert_eq!(get(&application(), "current_government_employment.grade"), None);
    }

    #[test]
    fn null_is_absent() {
        assert_eq!(get(&application(), "middle_name"), None);
        assert_eq!(get(&application(), "middle_name.first"), None);
    }

    #[test]
    fn index_requires_sequence_and_bounds() {
        let record = application();
        assert_eq!(get(&record, "ordinary_level_exams.1.year"), Some(json!(2016)));
        assert_eq!(get(&record, "ordinary_level_exams.9.year"), None);
        assert_eq!(get(&record, "surname.0"), None);
    }

    #[test]
    fn wildcard_returns_sequence_and_stops() {
        let record = application();
        let exams = get(&record, "ordinary_level_exams.*.subjects").unwrap();
        assert_eq!(exams, record["ordinary_level_exams"]);
        assert_eq!(get(&record, "surname.*"), None);
    }

    #[test]
    fn key_over_sequence_collects_from_mappings() {
        let subjects = get(&application(), "ordinary_level_exams.subjects").unwrap();
        assert_eq!(
            subjects,
            json!([
                [{"subject": "English", "grade": "C"}],
                [{"subject": "Mathematics", "grade": "B"}]
            ])
        );
        assert_eq!(get(&application(), "ordinary_level_exams.board"), None);
    }

    #[test]
    fn collected_nulls_are_kept() {
        let record = json!({"items": [{"note": null}, {"note": "late"}, {"other": 1}]});
        assert_eq!(get(&record, "items.note"), Some(json!([null, "late"])));
        assert_eq!(get(&json!({"items": [{"note": null}]}), "items.note"), Some(json!([null])));
    }

    #[test]
    fn collected_values_keep_descending() {
        let years = get(&application(), "ordinary_level_exams.year.0").unwrap();
        assert_eq!(years, json!(2015));
    }

    #[test]
    fn digit_segment_is_index_even_for_mapping_with_digit_key() {
        let record = json!({"codes": {"0": "zero"}});
        assert_eq!(get(&record, "codes.0"), None);
    }
}
