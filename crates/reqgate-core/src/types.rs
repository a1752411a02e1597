//! Core data types shared by the pipeline, the adapters and the formatters
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Field name to raw value mapping, in insertion order
pub type FieldMap = serde_json::Map<String, Value>;

/// A schema-validated object; always a JSON object on success
pub type ValidatedObject = Value;

/// Code used for schema validation failures
pub const VALIDATION_ERROR_CODE: &str = "validation_error";
/// Code used when a pre-validator rejects the merged input
pub const PRE_VALIDATION_ERROR_CODE: &str = "pre_validation_error";
/// Default code used when a post-validator rejects a valid object
pub const POST_VALIDATION_ERROR_CODE: &str = "post_validation_error";
/// Code used by adapters when the request body cannot be read as fields
pub const MALFORMED_REQUEST_CODE: &str = "malformed_request";
/// Code used by adapters for request data they cannot turn into fields
pub const UNSUPPORTED_INPUT_CODE: &str = "unsupported_input";
/// Code used by adapters when the request body exceeds their size limit
pub const PAYLOAD_TOO_LARGE_CODE: &str = "payload_too_large";
/// Code used when the validation machinery itself fails
pub const INTERNAL_ERROR_CODE: &str = "internal_error";
/// Code used by adapters for a route mounted without its pipeline binding
pub const GATEWAY_MISCONFIGURED_CODE: &str = "gateway_misconfigured";

/// Label used for schema validation failures
pub const VALIDATION_ERROR_LABEL: &str = "Validation Failed";

/// Field name used for failures that are not attached to a single field
pub const ROOT_FIELD: &str = "__root__";

/// Where on the request a group of raw fields came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Path parameters
    Path,
    /// Query string parameters
    Query,
    /// Form-encoded body fields
    Form,
    /// JSON body fields
    Body,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Path => "path",
            SourceKind::Query => "query",
            SourceKind::Form => "form",
            SourceKind::Body => "body",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collect `key=value` pairs into fields, turning repeated keys into a list
///
/// This is how query strings and form bodies are read: `tag=a&tag=b` becomes
/// `{"tag": ["a", "b"]}` while a single occurrence stays a plain string.
pub fn collect_pairs<I, K, V>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str> + Into<String>,
    V: Into<String>,
{
    let mut fields = FieldMap::new();
    for (key, value) in pairs {
        let value = Value::String(value.into());
        match fields.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into(), value);
            }
        }
    }
    fields
}

/// One captured source of raw fields
#[derive(Debug, Clone, PartialEq)]
pub struct RawSource {
    pub kind: SourceKind,
    pub fields: FieldMap,
}

/// Unvalidated field data extracted from a request, grouped by source
///
/// Sources are kept in capture order. Several sources of the same kind are
/// allowed; the merge step resolves collisions by precedence and, within one
/// kind, by capture order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    sources: Vec<RawSource>,
}

impl RawInput {
    /// Create an empty raw input
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a raw input holding a single JSON body source
    pub fn from_body(fields: FieldMap) -> Self {
        Self::new().with_source(SourceKind::Body, fields)
    }

    /// Add a source and return the input (builder style)
    pub fn with_source(mut self, kind: SourceKind, fields: FieldMap) -> Self {
        self.push(kind, fields);
        self
    }

    /// Append a source
    pub fn push(&mut self, kind: SourceKind, fields: FieldMap) {
        self.sources.push(RawSource { kind, fields });
    }

    /// The captured sources in capture order
    pub fn sources(&self) -> &[RawSource] {
        &self.sources
    }

    /// True when no source carries any field
    pub fn is_empty(&self) -> bool {
        self.sources.iter().all(|s| s.fields.is_empty())
    }
}

/// One entry of the `details` list of a [`GatewayValidationError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub field: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ErrorDetail {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: kind.into(),
        }
    }
}

/// The stable structured error returned to callers on any failure
///
/// Serializes to the wire shape
/// `{"error": ..., "code": ..., "details": [{"field", "message", "type"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error} ({code})")]
pub struct GatewayValidationError {
    error: String,
    code: String,
    details: Vec<ErrorDetail>,
}

impl GatewayValidationError {
    /// Build an error value; formatters and adapters are the intended callers
    pub fn new(error: impl Into<String>, code: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details,
        }
    }

    /// Error for a request whose body cannot be read as a field map
    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new(
            "Malformed Request",
            MALFORMED_REQUEST_CODE,
            vec![ErrorDetail::new(ROOT_FIELD, message, MALFORMED_REQUEST_CODE)],
        )
    }

    /// Error for request data an adapter does not know how to read
    pub fn unsupported_input(message: impl Into<String>) -> Self {
        Self::new(
            "Unsupported Request Data",
            UNSUPPORTED_INPUT_CODE,
            vec![ErrorDetail::new(ROOT_FIELD, message, UNSUPPORTED_INPUT_CODE)],
        )
    }

    /// Error for a request body larger than the adapter accepts
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            "Payload Too Large",
            PAYLOAD_TOO_LARGE_CODE,
            vec![ErrorDetail::new(
                ROOT_FIELD,
                format!("request body exceeds the {} byte limit", limit),
                PAYLOAD_TOO_LARGE_CODE,
            )],
        )
    }

    /// Error for a route whose handler has no pipeline binding attached
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::new(
            "Gateway Misconfigured",
            GATEWAY_MISCONFIGURED_CODE,
            vec![ErrorDetail::new(ROOT_FIELD, message, GATEWAY_MISCONFIGURED_CODE)],
        )
    }

    /// Error for a failure of the validation machinery itself
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            "Internal Validation Error",
            INTERNAL_ERROR_CODE,
            vec![ErrorDetail::new(ROOT_FIELD, message, INTERNAL_ERROR_CODE)],
        )
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn details(&self) -> &[ErrorDetail] {
        &self.details
    }

    /// True for schema validation failures
    pub fn is_validation_error(&self) -> bool {
        self.code == VALIDATION_ERROR_CODE
    }

    /// HTTP status an adapter should respond with
    pub fn status_code(&self) -> u16 {
        match self.code.as_str() {
            INTERNAL_ERROR_CODE | GATEWAY_MISCONFIGURED_CODE => 500,
            PAYLOAD_TOO_LARGE_CODE => 413,
            _ => 422,
        }
    }

    /// Render the wire shape as a JSON value
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "error": self.error,
            "code": self.code,
            "details": self.details,
        })
    }
}

/// Outcome of one pipeline run; never both a success and a failure
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Success(ValidatedObject),
    Failure(GatewayValidationError),
}

impl ValidationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Borrow the validated object, if any
    pub fn value(&self) -> Option<&ValidatedObject> {
        match self {
            ValidationResult::Success(value) => Some(value),
            ValidationResult::Failure(_) => None,
        }
    }

    /// Borrow the error, if any
    pub fn error(&self) -> Option<&GatewayValidationError> {
        match self {
            ValidationResult::Success(_) => None,
            ValidationResult::Failure(error) => Some(error),
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> std::result::Result<ValidatedObject, GatewayValidationError> {
        match self {
            ValidationResult::Success(value) => Ok(value),
            ValidationResult::Failure(error) => Err(error),
        }
    }

    /// Deserialize the validated object into a typed handler input
    pub fn into_typed<T: DeserializeOwned>(self) -> crate::Result<std::result::Result<T, GatewayValidationError>> {
        match self {
            ValidationResult::Success(value) => serde_json::from_value(value)
                .map(Ok)
                .map_err(|source| crate::Error::Conversion {
                    target: std::any::type_name::<T>(),
                    source,
                }),
            ValidationResult::Failure(error) => Ok(Err(error)),
        }
    }
}
