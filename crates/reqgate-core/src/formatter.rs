//! Error formatting for schema validation failures
//!
//! A formatter turns the ordered [`FieldFailure`] list reported by a schema
//! capability into the [`GatewayValidationError`] returned to callers. The
//! default formatter keeps the capability's type tags verbatim and never drops
//! or reorders failures. Endpoints may inject their own formatter, either a
//! type implementing [`ErrorFormatter`] or a plain closure.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::schema::FieldFailure;
use crate::types::{
    ErrorDetail, GatewayValidationError, ROOT_FIELD, VALIDATION_ERROR_CODE, VALIDATION_ERROR_LABEL,
};
use std::fmt;

/// Converts schema failures into the structured error shape
///
/// Implementations must be pure: no I/O and no dependence on anything but the
/// failures passed in.
pub trait ErrorFormatter: Send + Sync {
    fn format(&self, failures: &[FieldFailure]) -> GatewayValidationError;
}

impl<F> ErrorFormatter for F
where
    F: Fn(&[FieldFailure]) -> GatewayValidationError + Send + Sync,
{
    fn format(&self, failures: &[FieldFailure]) -> GatewayValidationError {
        self(failures)
    }
}

impl fmt::Debug for dyn ErrorFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorFormatter")
    }
}

/// The stock `{"error": "Validation Failed", "code": "validation_error"}` shape
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorFormatter;

impl ErrorFormatter for DefaultErrorFormatter {
    fn format(&self, failures: &[FieldFailure]) -> GatewayValidationError {
        let mut details: Vec<ErrorDetail> = failures
            .iter()
            .map(|f| ErrorDetail::new(&f.field, &f.message, &f.type_tag))
            .collect();

        // `details` may not be empty for validation_error
        if details.is_empty() {
            details.push(ErrorDetail::new(ROOT_FIELD, "validation failed", "value_error"));
        }

        GatewayValidationError::new(VALIDATION_ERROR_LABEL, VALIDATION_ERROR_CODE, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_formatter_preserves_tags_and_order() {
        let failures = vec![
            FieldFailure::new("username", "field required", "value_error.missing"),
            FieldFailure::new("age", "value is not a valid integer", "type_error.integer"),
            FieldFailure::new("foo", "extra fields not permitted", "value_error.extra"),
        ];

        let error = DefaultErrorFormatter.format(&failures);

        assert_eq!(error.code(), "validation_error");
        assert_eq!(error.error(), "Validation Failed");
        let fields: Vec<&str> = error.details().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "age", "foo"]);
        assert_eq!(error.details()[1].kind, "type_error.integer");
    }

    #[test]
    fn test_default_formatter_wire_shape() {
        let failures = vec![FieldFailure::new(
            "age",
            "value is not a valid integer",
            "type_error.integer",
        )];

        assert_eq!(
            DefaultErrorFormatter.format(&failures).to_json(),
            json!({
                "error": "Validation Failed",
                "code": "validation_error",
                "details": [
                    {"field": "age", "message": "value is not a valid integer", "type": "type_error.integer"}
                ]
            })
        );
    }

    #[test]
    fn test_default_formatter_never_empty_details() {
        let error = DefaultErrorFormatter.format(&[]);
        assert_eq!(error.details().len(), 1);
        assert_eq!(error.details()[0].field, ROOT_FIELD);
    }

    #[test]
    fn test_closure_formatter() {
        let formatter = |failures: &[FieldFailure]| {
            GatewayValidationError::new(
                "Bad Input",
                "invalid_payload",
                failures
                    .iter()
                    .map(|f| ErrorDetail::new(f.field.to_uppercase(), &f.message, &f.type_tag))
                    .collect(),
            )
        };

        let error = formatter.format(&[FieldFailure::new("age", "nope", "type_error.integer")]);
        assert_eq!(error.code(), "invalid_payload");
        assert_eq!(error.details()[0].field, "AGE");
    }
}
