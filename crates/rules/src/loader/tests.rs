//! Tests for rules file loading.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use super::*;

const RULES_YAML: &str = r#"
rules:
  - field: nationality
    type: exact_match
    value: Mauritian
  - type: or
    rules:
      - field: phone_office
        type: exists
      - field: phone_mobile
        type: exists
  - field: conviction_details
    type: unstructured
    description: Details about any court conviction
    evaluation_criteria: Evaluate seriousness
metadata:
  version: 3
"#;

#[test]
fn load_yaml_rules_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.yml");
    fs::write(&path, RULES_YAML).unwrap();

    let file = load_rules_file(&path).unwrap();
    assert_eq!(file.rules.len(), 3);
    assert_eq!(file.rules[1].kind(), "or");
    assert_eq!(file.metadata, Some(json!({"version": 3})));
}

#[test]
fn load_bare_json_list() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(
        &path,
        r#"[{"field": "age", "type": "range", "min": 18, "max": 45}, {"field": "x"}]"#,
    )
    .unwrap();

    let file = load_rules_file(&path).unwrap();
    assert_eq!(file.rules.len(), 2);
    assert!(file.metadata.is_none());
    // Malformed entries are kept, not rejected.
    assert!(matches!(file.rules[1], Rule::Invalid(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_rules_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn undecodable_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(load_rules_file(&path), Err(LoadError::Json(_))));
}

#[test]
fn non_list_sources_are_fatal() {
    assert!(matches!(
        parse_rules(json!("rules")),
        Err(LoadError::NotAList { found: "a string" })
    ));
    assert!(matches!(
        parse_rules(json!({"metadata": {}})),
        Err(LoadError::NotAList { found: "object" })
    ));
    assert!(matches!(
        parse_rules(json!({"rules": {"field": "age"}})),
        Err(LoadError::NotAList { found: "an object" })
    ));
}

#[test]
fn split_separates_unstructured_fields() {
    let file = parse_rules(serde_yaml::from_str(RULES_YAML).unwrap()).unwrap();
    let (structured, unstructured) = split_rules(file.rules);
    assert_eq!(structured.len(), 2);
    assert_eq!(unstructured.len(), 1);
    assert_eq!(unstructured[0].field.as_str(), "conviction_details");
    assert_eq!(unstructured[0].description, "Details about any court conviction");
}
