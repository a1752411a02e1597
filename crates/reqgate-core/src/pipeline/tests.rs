//! Tests for merge order and the validator pipeline

use super::*;
use crate::cache::{CacheConfig, IdempotencyCache};
use crate::config::{EndpointConfig, GatewaySettings};
use crate::schema::{Fallback, FieldFailure, Schema, SchemaOptions, SchemaOutcome};
use crate::test_support::StubSchema;
use crate::types::*;
use crate::validators::{built_in, PostValidator, PostValidatorError, PreValidator, PreValidatorError};
use crate::ValidationMode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn fields(value: Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

fn user_schema() -> Arc<StubSchema> {
    Arc::new(
        StubSchema::new("user")
            .str("username", true)
            .int("age", true)
            .str("email", true),
    )
}

fn pipeline() -> ValidatorPipeline {
    ValidatorPipeline::new(Arc::new(IdempotencyCache::new()))
}

#[test]
fn test_default_merge_order_body_wins() {
    let input = RawInput::new()
        .with_source(SourceKind::Body, fields(json!({"a": 1})))
        .with_source(SourceKind::Query, fields(json!({"a": 2, "b": 2})))
        .with_source(SourceKind::Path, fields(json!({"a": 3, "b": 3, "c": 3})));

    let merged = MergeOrder::default().merge(&input);
    assert_eq!(Value::Object(merged), json!({"a": 1, "b": 2, "c": 3}));
}

#[test]
fn test_custom_merge_order() {
    let order = MergeOrder::new(vec![SourceKind::Body, SourceKind::Query]).unwrap();
    let input = RawInput::new()
        .with_source(SourceKind::Query, fields(json!({"a": 2})))
        .with_source(SourceKind::Body, fields(json!({"a": 1})))
        .with_source(SourceKind::Form, fields(json!({"a": 0, "f": true})));

    let merged = order.merge(&input);
    assert_eq!(merged["a"], json!(2));
    // Unlisted kinds rank lowest
    assert_eq!(merged["f"], json!(true));
    assert_eq!(order.to_string(), "body < query");
}

#[test]
fn test_same_kind_sources_keep_capture_order() {
    let input = RawInput::new()
        .with_source(SourceKind::Query, fields(json!({"a": "first"})))
        .with_source(SourceKind::Query, fields(json!({"a": "second"})));

    assert_eq!(MergeOrder::default().merge(&input)["a"], json!("second"));
}

#[test]
fn test_merge_order_rejects_duplicates() {
    let result = MergeOrder::new(vec![SourceKind::Query, SourceKind::Query]);
    assert!(matches!(result, Err(crate::Error::Configuration { .. })));
}

#[test]
fn test_strict_success() {
    let endpoint = EndpointConfig::builder(user_schema()).build().unwrap();
    let input = RawInput::from_body(fields(json!({
        "username": "alice", "age": 25, "email": "a@x.com"
    })));

    let result = pipeline().validate(input, &endpoint);
    assert_eq!(
        result,
        ValidationResult::Success(json!({"username": "alice", "age": 25, "email": "a@x.com"}))
    );
}

#[test]
fn test_strict_extra_field_fails() {
    let endpoint = EndpointConfig::builder(user_schema())
        .mode(ValidationMode::Strict)
        .build()
        .unwrap();
    let input = RawInput::from_body(fields(json!({
        "username": "alice", "age": 25, "email": "a@x.com", "foo": "bar"
    })));

    let error = pipeline().validate(input, &endpoint).into_result().unwrap_err();
    assert_eq!(error.code(), VALIDATION_ERROR_CODE);
    assert!(error.details().iter().any(|d| d.field == "foo"));
}

#[test]
fn test_lax_normalization_with_pre_validator() {
    let endpoint = EndpointConfig::builder(user_schema())
        .mode(ValidationMode::Lax)
        .pre_validator(built_in::normalize_email())
        .build()
        .unwrap();
    let input = RawInput::from_body(fields(json!({
        "username": "alice", "age": "25", "email": "EMAIL@X.COM", "junk": 1
    })));

    let value = pipeline().validate(input, &endpoint).into_result().unwrap();
    assert_eq!(value["email"], json!("email@x.com"));
    assert_eq!(value["age"], json!(25));
    assert!(value.get("junk").is_none());
}

#[test]
fn test_gateway_default_mode_applies() {
    let settings = GatewaySettings {
        default_mode: ValidationMode::Lax,
        ..GatewaySettings::default()
    };
    let pipeline = ValidatorPipeline::from_settings(settings);
    let endpoint = EndpointConfig::builder(user_schema()).build().unwrap();

    assert_eq!(pipeline.effective_mode(&endpoint), ValidationMode::Lax);
    let input = RawInput::from_body(fields(json!({
        "username": "alice", "age": 25, "email": "a@x.com", "extra": 1
    })));
    assert!(pipeline.validate(input, &endpoint).is_success());
}

#[test]
fn test_mode_monotonicity() {
    let schema = Arc::new(
        StubSchema::new("item")
            .int("count", true)
            .with_fallback("count", Fallback::Default(json!(1))),
    );
    let input = || RawInput::from_body(fields(json!({"count": "lots", "color": "red"})));

    let run = |mode| {
        let endpoint = EndpointConfig::builder(schema.clone()).mode(mode).build().unwrap();
        pipeline().validate(input(), &endpoint)
    };

    let strict = run(ValidationMode::Strict).into_result().unwrap_err();
    assert_eq!(strict.details().len(), 2);

    let lax = run(ValidationMode::Lax).into_result().unwrap_err();
    assert_eq!(lax.details().len(), 1);
    assert_eq!(lax.details()[0].field, "count");

    let permissive = run(ValidationMode::Permissive).into_result().unwrap();
    assert_eq!(permissive, json!({"count": 1}));
}

#[test]
fn test_permissive_without_fallback_fails_on_that_field() {
    let schema = Arc::new(StubSchema::new("item").int("count", true).str("label", false));
    let endpoint = EndpointConfig::builder(schema)
        .mode(ValidationMode::Permissive)
        .build()
        .unwrap();

    let input = RawInput::from_body(fields(json!({"count": "lots", "label": "x", "other": 1})));
    let error = pipeline().validate(input, &endpoint).into_result().unwrap_err();
    assert_eq!(error.details().len(), 1);
    assert_eq!(error.details()[0].field, "count");
    assert_eq!(error.details()[0].kind, "type_error.integer");
}

#[test]
fn test_pre_validators_run_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (seen_f, seen_g) = (Arc::clone(&seen), Arc::clone(&seen));

    let f = PreValidator::infallible("f", move |mut fields| {
        seen_f.lock().unwrap().push("f");
        let x = fields["x"].as_str().unwrap_or_default().to_string();
        fields.insert("x".into(), json!(format!("f({})", x)));
        fields
    });
    let g = PreValidator::infallible("g", move |mut fields| {
        seen_g.lock().unwrap().push("g");
        let x = fields["x"].as_str().unwrap_or_default().to_string();
        fields.insert("x".into(), json!(format!("g({})", x)));
        fields
    });

    let schema = Arc::new(StubSchema::new("x").str("x", true));
    let endpoint = EndpointConfig::builder(schema)
        .pre_validator(f)
        .pre_validator(g)
        .build()
        .unwrap();

    let value = pipeline()
        .validate(RawInput::from_body(fields(json!({"x": "x"}))), &endpoint)
        .into_result()
        .unwrap();
    assert_eq!(value["x"], json!("g(f(x))"));
    assert_eq!(*seen.lock().unwrap(), vec!["f", "g"]);
}

#[test]
fn test_pre_validator_failure_short_circuits() {
    let schema = user_schema();
    let endpoint = EndpointConfig::builder(schema.clone())
        .pre_validator(PreValidator::new("reject", |_fields| {
            Err(PreValidatorError::new("cannot normalize").with_field("email"))
        }))
        .build()
        .unwrap();

    let error = pipeline()
        .validate(RawInput::from_body(fields(json!({"email": "x"}))), &endpoint)
        .into_result()
        .unwrap_err();

    assert_eq!(error.code(), PRE_VALIDATION_ERROR_CODE);
    assert_ne!(error.code(), VALIDATION_ERROR_CODE);
    assert_eq!(error.details()[0].field, "email");
    assert_eq!(schema.calls(), 0);
}

#[test]
fn test_post_validator_keeps_its_own_code() {
    let endpoint = EndpointConfig::builder(user_schema())
        .post_validator(PostValidator::new("adult", |value| {
            if value["age"].as_i64().unwrap_or(0) < 18 {
                return Err(PostValidatorError::new("must be an adult")
                    .with_code("underage")
                    .with_field("age"));
            }
            Ok(value)
        }))
        .build()
        .unwrap();

    let input = RawInput::from_body(fields(json!({
        "username": "kid", "age": 9, "email": "k@x.com"
    })));
    let error = pipeline().validate(input, &endpoint).into_result().unwrap_err();
    assert_eq!(error.code(), "underage");
    assert_eq!(error.details()[0].field, "age");
}

#[test]
fn test_post_validators_skipped_on_schema_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let endpoint = EndpointConfig::builder(user_schema())
        .post_validator(PostValidator::new("count", move |value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }))
        .build()
        .unwrap();

    let result = pipeline().validate(RawInput::from_body(fields(json!({"age": "x"}))), &endpoint);
    assert!(result.is_failure());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_repeated_validation_runs_validators_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = user_schema();
    let endpoint = EndpointConfig::builder(schema.clone())
        .pre_validator(PreValidator::infallible("count", move |fields| {
            counter.fetch_add(1, Ordering::SeqCst);
            fields
        }))
        .build()
        .unwrap();

    let pipeline = pipeline();
    let input = RawInput::from_body(fields(json!({
        "username": "alice", "age": 25, "email": "a@x.com"
    })));

    let first = pipeline.validate(input.clone(), &endpoint);
    let second = pipeline.validate(input.clone(), &endpoint);
    let third = pipeline.validate(input, &endpoint);

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(schema.calls(), 1);
    assert_eq!(pipeline.cache().stats().hits, 2);
}

#[test]
fn test_failures_are_cached_too() {
    let schema = user_schema();
    let endpoint = EndpointConfig::builder(schema.clone()).build().unwrap();
    let pipeline = pipeline();
    let input = RawInput::from_body(fields(json!({"age": "nope"})));

    let first = pipeline.validate(input.clone(), &endpoint);
    let second = pipeline.validate(input, &endpoint);
    assert!(first.is_failure());
    assert_eq!(first, second);
    assert_eq!(schema.calls(), 1);
}

#[test]
fn test_disabled_cache_recomputes() {
    let schema = user_schema();
    let endpoint = EndpointConfig::builder(schema.clone()).build().unwrap();
    let pipeline = ValidatorPipeline::new(Arc::new(IdempotencyCache::with_config(CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    })));
    let input = RawInput::from_body(fields(json!({"age": 1})));

    pipeline.validate(input.clone(), &endpoint);
    pipeline.validate(input, &endpoint);
    assert_eq!(schema.calls(), 2);
}

#[test]
fn test_custom_formatter_is_used_for_schema_failures() {
    let endpoint = EndpointConfig::builder(user_schema())
        .error_formatter(|failures: &[FieldFailure]| {
            GatewayValidationError::new(
                "Invalid",
                "invalid_user",
                failures
                    .iter()
                    .map(|f| ErrorDetail::new(&f.field, &f.message, &f.type_tag))
                    .collect(),
            )
        })
        .build()
        .unwrap();

    let error = pipeline()
        .validate(RawInput::new(), &endpoint)
        .into_result()
        .unwrap_err();
    assert_eq!(error.code(), "invalid_user");
    let missing: Vec<&str> = error.details().iter().map(|d| d.field.as_str()).collect();
    assert_eq!(missing, vec!["username", "age", "email"]);
}

struct PanickingSchema;

impl Schema for PanickingSchema {
    fn id(&self) -> &str {
        "panics"
    }

    fn is_known_field(&self, _field: &str) -> bool {
        true
    }

    fn validate(&self, _fields: &FieldMap, _options: SchemaOptions) -> SchemaOutcome {
        panic!("schema exploded")
    }
}

#[test]
fn test_schema_panic_becomes_internal_error() {
    let endpoint = EndpointConfig::builder(Arc::new(PanickingSchema)).build().unwrap();
    let error = pipeline()
        .validate(RawInput::new(), &endpoint)
        .into_result()
        .unwrap_err();

    assert_eq!(error.code(), INTERNAL_ERROR_CODE);
    assert_eq!(error.status_code(), 500);
}
