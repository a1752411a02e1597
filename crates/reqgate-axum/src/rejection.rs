//! Rejection returned by the validated extractor
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqgate_core::{ErrorDetail, GatewayValidationError, ROOT_FIELD, VALIDATION_ERROR_CODE, VALIDATION_ERROR_LABEL};
use std::fmt;

/// Error code for a route whose handler asks for validated input but has no
/// [`ValidatedRoute`](crate::ValidatedRoute) attached
pub use reqgate_core::GATEWAY_MISCONFIGURED_CODE;

/// Type tag for a validated object that does not fit the handler's type
pub const DESERIALIZE_ERROR_TAG: &str = "type_error.deserialize";

/// A gateway error paired with the HTTP status it is sent with
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRejection {
    status: StatusCode,
    error: GatewayValidationError,
}

impl GatewayRejection {
    pub fn new(status: StatusCode, error: GatewayValidationError) -> Self {
        Self { status, error }
    }

    /// The route was mounted without its pipeline binding
    pub fn misconfigured() -> Self {
        GatewayValidationError::misconfigured("no validated route is attached to this handler").into()
    }

    /// The request body is larger than the extractor buffers
    pub fn payload_too_large(limit: usize) -> Self {
        GatewayValidationError::payload_too_large(limit).into()
    }

    /// The pipeline accepted the input but it does not deserialize into the
    /// handler's type
    pub fn deserialize(err: serde_json::Error) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            GatewayValidationError::new(
                VALIDATION_ERROR_LABEL,
                VALIDATION_ERROR_CODE,
                vec![ErrorDetail::new(ROOT_FIELD, err.to_string(), DESERIALIZE_ERROR_TAG)],
            ),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error(&self) -> &GatewayValidationError {
        &self.error
    }

    pub fn into_error(self) -> GatewayValidationError {
        self.error
    }
}

impl From<GatewayValidationError> for GatewayRejection {
    fn from(error: GatewayValidationError) -> Self {
        let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY);
        Self { status, error }
    }
}

impl fmt::Display for GatewayRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.error)
    }
}

impl std::error::Error for GatewayRejection {}

impl IntoResponse for GatewayRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
