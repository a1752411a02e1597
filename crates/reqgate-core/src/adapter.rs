//! Framework adapter boundary
//!
//! An adapter turns a host framework's request into [`RawInput`] and the
//! pipeline's result back into the host's response type. The core ships one
//! host-agnostic adapter, [`GenericAdapter`], for callers that already hold
//! request data as a JSON value or any `Serialize` type.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::config::EndpointConfig;
use crate::pipeline::ValidatorPipeline;
use crate::types::{GatewayValidationError, RawInput, ValidatedObject, ValidationResult};
use serde::Serialize;
use serde_json::Value;

/// Binding between the pipeline and one host framework
pub trait FrameworkAdapter {
    type Request;
    type Response;

    /// Pull body, query, form and path fields out of a request
    fn extract(&self, request: Self::Request) -> Result<RawInput, GatewayValidationError>;

    fn respond_success(&self, value: ValidatedObject) -> Self::Response;

    fn respond_error(&self, error: GatewayValidationError) -> Self::Response;

    /// Extract, validate and shape the response for one request
    fn handle(
        &self,
        pipeline: &ValidatorPipeline,
        endpoint: &EndpointConfig,
        request: Self::Request,
    ) -> Self::Response {
        let input = match self.extract(request) {
            Ok(input) => input,
            Err(error) => return self.respond_error(error),
        };

        match pipeline.validate(input, endpoint) {
            ValidationResult::Success(value) => self.respond_success(value),
            ValidationResult::Failure(error) => self.respond_error(error),
        }
    }
}

/// Adapter for request data already available as a JSON value
///
/// `null` is read as an empty request, an object as JSON body fields. Any
/// other value is rejected with `unsupported_input`. Errors are returned to
/// the caller rather than written to a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericAdapter;

impl GenericAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Validate any serializable value
    pub fn validate<T: Serialize + ?Sized>(
        &self,
        pipeline: &ValidatorPipeline,
        endpoint: &EndpointConfig,
        data: &T,
    ) -> Result<ValidatedObject, GatewayValidationError> {
        match serde_json::to_value(data) {
            Ok(value) => self.handle(pipeline, endpoint, value),
            Err(err) => Err(GatewayValidationError::unsupported_input(format!(
                "request data could not be serialized: {}",
                err
            ))),
        }
    }
}

impl FrameworkAdapter for GenericAdapter {
    type Request = Value;
    type Response = Result<ValidatedObject, GatewayValidationError>;

    fn extract(&self, request: Value) -> Result<RawInput, GatewayValidationError> {
        match request {
            Value::Null => Ok(RawInput::new()),
            Value::Object(fields) => Ok(RawInput::from_body(fields)),
            other => Err(GatewayValidationError::unsupported_input(format!(
                "unsupported request data type: expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    fn respond_success(&self, value: ValidatedObject) -> Self::Response {
        Ok(value)
    }

    fn respond_error(&self, error: GatewayValidationError) -> Self::Response {
        Err(error)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
