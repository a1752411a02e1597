//! Pre- and post-validator function values and their errors
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::types::{
    ErrorDetail, FieldMap, GatewayValidationError, ValidatedObject, POST_VALIDATION_ERROR_CODE,
    PRE_VALIDATION_ERROR_CODE, ROOT_FIELD,
};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Label of errors raised by pre-validators
pub const PRE_VALIDATION_ERROR_LABEL: &str = "Pre-validation Failed";
/// Label of errors raised by post-validators
pub const POST_VALIDATION_ERROR_LABEL: &str = "Post-validation Failed";

type PreValidateFn = dyn Fn(FieldMap) -> Result<FieldMap, PreValidatorError> + Send + Sync;
type PostValidateFn =
    dyn Fn(ValidatedObject) -> Result<ValidatedObject, PostValidatorError> + Send + Sync;

/// A pre-validator could not normalize the merged input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pre-validator '{validator}' failed: {message}")]
pub struct PreValidatorError {
    /// Name of the failing validator; filled in by [`PreValidator::run`]
    pub validator: String,
    pub message: String,
    pub field: Option<String>,
}

impl PreValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            validator: String::new(),
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Render as a `pre_validation_error` with a single detail
    pub fn to_gateway_error(&self) -> GatewayValidationError {
        GatewayValidationError::new(
            PRE_VALIDATION_ERROR_LABEL,
            PRE_VALIDATION_ERROR_CODE,
            vec![ErrorDetail::new(
                self.field.as_deref().unwrap_or(ROOT_FIELD),
                &self.message,
                PRE_VALIDATION_ERROR_CODE,
            )],
        )
    }
}

/// A post-validator rejected a schema-valid object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct PostValidatorError {
    pub code: String,
    pub message: String,
    pub field: Option<String>,
}

impl PostValidatorError {
    /// Error with the default `post_validation_error` code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: POST_VALIDATION_ERROR_CODE.to_string(),
            message: message.into(),
            field: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Render with the validator's own code; never reported as `validation_error`
    pub fn to_gateway_error(&self) -> GatewayValidationError {
        GatewayValidationError::new(
            POST_VALIDATION_ERROR_LABEL,
            &self.code,
            vec![ErrorDetail::new(
                self.field.as_deref().unwrap_or(ROOT_FIELD),
                &self.message,
                &self.code,
            )],
        )
    }
}

/// Named transformation of the merged field map, run before the schema
#[derive(Clone)]
pub struct PreValidator {
    name: String,
    func: Arc<PreValidateFn>,
}

impl PreValidator {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(FieldMap) -> Result<FieldMap, PreValidatorError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// A pre-validator that cannot fail
    pub fn infallible<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(FieldMap) -> FieldMap + Send + Sync + 'static,
    {
        Self::new(name, move |fields| Ok(func(fields)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the validator; a panic is reported as a failure
    pub fn run(&self, fields: FieldMap) -> Result<FieldMap, PreValidatorError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.func)(fields)));
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(validator = %self.name, %message, "pre-validator panicked");
                Err(PreValidatorError::new(format!("pre-validator panicked: {}", message)))
            }
        };
        result.map_err(|mut err| {
            err.validator = self.name.clone();
            err
        })
    }
}

impl fmt::Debug for PreValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreValidator").field("name", &self.name).finish()
    }
}

/// Named check or transformation of the validated object
#[derive(Clone)]
pub struct PostValidator {
    name: String,
    func: Arc<PostValidateFn>,
}

impl PostValidator {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(ValidatedObject) -> Result<ValidatedObject, PostValidatorError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the validator; a panic is reported as a failure
    pub fn run(&self, value: ValidatedObject) -> Result<ValidatedObject, PostValidatorError> {
        match catch_unwind(AssertUnwindSafe(|| (self.func)(value))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(validator = %self.name, %message, "post-validator panicked");
                Err(PostValidatorError::new(format!("post-validator panicked: {}", message)))
            }
        }
    }
}

impl fmt::Debug for PostValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostValidator").field("name", &self.name).finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
