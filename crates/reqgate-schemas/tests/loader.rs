//! Schema file loading tests

use reqgate_core::{ExtraFields, Schema, SchemaOptions};
use reqgate_schemas::{load_schema, schema_from_document, SchemaError, SchemaKind};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const STRICT: SchemaOptions = SchemaOptions {
    extra: ExtraFields::Forbid,
    coerce: false,
};

#[test]
fn test_load_field_schema_from_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signup.yaml");
    fs::write(
        &path,
        "fields:\n  - name: username\n    type: str\n  - name: age\n    type: int\n",
    )
    .unwrap();

    let schema = load_schema(&path).unwrap();
    assert_eq!(schema.id(), "signup");
    assert!(schema.is_known_field("age"));

    let input = json!({"username": "a", "age": 1});
    assert!(schema.validate(input.as_object().unwrap(), STRICT).is_ok());
}

#[test]
fn test_load_json_schema_from_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("order.json");
    fs::write(
        &path,
        serde_json::to_string(&json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "urn:order",
            "type": "object",
            "properties": {"qty": {"type": "integer"}},
            "required": ["qty"]
        }))
        .unwrap(),
    )
    .unwrap();

    let schema = load_schema(&path).unwrap();
    assert_eq!(schema.id(), "urn:order");

    let failures = schema
        .validate(json!({}).as_object().unwrap(), STRICT)
        .unwrap_err();
    assert_eq!(failures[0].field, "qty");
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.txt");
    fs::write(&path, "{}").unwrap();

    assert!(matches!(
        load_schema(&path),
        Err(SchemaError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        load_schema(&dir.path().join("absent.json")),
        Err(SchemaError::Io { .. })
    ));
}

#[test]
fn test_malformed_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yml");
    fs::write(&path, "fields: [unclosed").unwrap();

    assert!(matches!(
        load_schema(&path),
        Err(SchemaError::YamlParse { .. })
    ));
}

#[test]
fn test_kind_detection() {
    assert_eq!(SchemaKind::detect(&json!({"type": "object"})), SchemaKind::JsonSchema);
    assert_eq!(SchemaKind::detect(&json!({"properties": {}})), SchemaKind::JsonSchema);
    assert_eq!(
        SchemaKind::detect(&json!({"id": "x", "fields": []})),
        SchemaKind::Fields
    );
}

#[test]
fn test_field_schema_with_unknown_type_is_invalid() {
    let result = schema_from_document(
        json!({"id": "x", "fields": [{"name": "a", "type": "datetime"}]}),
        "x",
    );
    assert!(matches!(result, Err(SchemaError::InvalidDefinition { .. })));
}
