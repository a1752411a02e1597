//! Tests for pre/post validators and the built-in normalizers

use super::built_in;
use super::types::*;
use crate::types::{FieldMap, POST_VALIDATION_ERROR_CODE, PRE_VALIDATION_ERROR_CODE, ROOT_FIELD};
use serde_json::json;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_normalize_email() {
    let out = built_in::normalize_email()
        .run(fields(json!({
            "email": "  EMAIL@X.COM ",
            "backup_email": "Other@Y.org",
            "name": "  Alice  ",
            "contact_email": 5
        })))
        .unwrap();

    assert_eq!(out["email"], json!("email@x.com"));
    assert_eq!(out["backup_email"], json!("other@y.org"));
    assert_eq!(out["name"], json!("  Alice  "));
    assert_eq!(out["contact_email"], json!(5));
}

#[test]
fn test_sanitize_strings() {
    let out = built_in::sanitize_strings()
        .run(fields(json!({
            "bio": "  <b>Hello</b>\u{0007}   world \n\n again ",
            "age": 3
        })))
        .unwrap();

    assert_eq!(out["bio"], json!("Hello world again"));
    assert_eq!(out["age"], json!(3));
}

#[test]
fn test_trim_and_lowercase() {
    let trimmed = built_in::trim_strings().run(fields(json!({"a": " x ", "b": [" y "]}))).unwrap();
    assert_eq!(trimmed["a"], json!("x"));
    assert_eq!(trimmed["b"], json!([" y "]));

    let lowered = built_in::lowercase_fields(["code"])
        .run(fields(json!({"code": "ABC", "other": "DEF"})))
        .unwrap();
    assert_eq!(lowered["code"], json!("abc"));
    assert_eq!(lowered["other"], json!("DEF"));
}

#[test]
fn test_require_non_empty() {
    let validator = built_in::require_non_empty(["username"]);
    assert!(validator.run(fields(json!({"username": "bob"}))).is_ok());
    assert!(validator.run(fields(json!({}))).is_ok());

    let err = validator.run(fields(json!({"username": "   "}))).unwrap_err();
    assert_eq!(err.field.as_deref(), Some("username"));
    assert_eq!(err.validator, "require_non_empty(username)");

    let gateway = err.to_gateway_error();
    assert_eq!(gateway.code(), PRE_VALIDATION_ERROR_CODE);
    assert_eq!(gateway.details()[0].field, "username");
}

#[test]
fn test_pre_validator_panic_becomes_failure() {
    let validator = PreValidator::new("explodes", |_fields| -> Result<FieldMap, PreValidatorError> {
        panic!("boom")
    });

    let err = validator.run(FieldMap::new()).unwrap_err();
    assert_eq!(err.validator, "explodes");
    assert!(err.message.contains("boom"));
    assert_eq!(err.to_gateway_error().details()[0].field, ROOT_FIELD);
}

#[test]
fn test_post_validator_error_codes() {
    let default_code = PostValidatorError::new("too young").with_field("age");
    let gateway = default_code.to_gateway_error();
    assert_eq!(gateway.code(), POST_VALIDATION_ERROR_CODE);
    assert_eq!(gateway.error(), POST_VALIDATION_ERROR_LABEL);
    assert_eq!(gateway.details()[0].field, "age");
    assert_eq!(gateway.details()[0].kind, POST_VALIDATION_ERROR_CODE);

    let custom = PostValidatorError::new("username taken").with_code("conflict");
    assert_eq!(custom.to_gateway_error().code(), "conflict");
    assert_eq!(custom.to_gateway_error().details()[0].field, ROOT_FIELD);
}

#[test]
fn test_post_validator_run() {
    let adult = PostValidator::new("adult", |value| {
        if value["age"].as_i64().unwrap_or(0) >= 18 {
            Ok(value)
        } else {
            Err(PostValidatorError::new("must be an adult").with_field("age"))
        }
    });

    assert!(adult.run(json!({"age": 30})).is_ok());
    assert_eq!(adult.run(json!({"age": 3})).unwrap_err().message, "must be an adult");
    assert_eq!(adult.name(), "adult");

    let panicking = PostValidator::new("panics", |_value| -> Result<serde_json::Value, PostValidatorError> {
        panic!("nope")
    });
    assert!(panicking.run(json!({})).unwrap_err().message.contains("nope"));
}
