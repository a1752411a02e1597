//! Reqgate Core - request validation pipeline
//!
//! This crate sits between a web framework's routing layer and business logic.
//! It merges the raw fields an adapter extracted from a request, runs the
//! endpoint's pre-validators, validates the result against a schema under a
//! strictness mode, runs the post-validators and returns either the validated
//! object or a structured [`GatewayValidationError`].
//!
//! # Main Components
//!
//! - **Pipeline**: [`ValidatorPipeline`] orchestrates one validation
//! - **Modes**: [`ValidationMode`] and [`ModePolicy`] judge unknown fields and failures
//! - **Formatting**: [`ErrorFormatter`] builds the error wire shape
//! - **Idempotency**: [`IdempotencyCache`] memoizes results per [`IdempotencyKey`]
//! - **Adapters**: [`FrameworkAdapter`] is the boundary to host frameworks
//!
//! The structural validation itself is supplied through the [`Schema`] trait.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use reqgate_core::validators::built_in;
//! use reqgate_core::{EndpointConfig, IdempotencyCache, RawInput, ValidationMode, ValidatorPipeline};
//! use reqgate_schemas::{Field, FieldSchema, FieldType};
//! use serde_json::json;
//!
//! let schema = FieldSchema::new("user")
//!     .field(Field::required("username", FieldType::Str))
//!     .field(Field::required("email", FieldType::Str));
//!
//! let endpoint = EndpointConfig::builder(Arc::new(schema))
//!     .mode(ValidationMode::Lax)
//!     .pre_validator(built_in::normalize_email())
//!     .build()?;
//!
//! let pipeline = ValidatorPipeline::new(Arc::new(IdempotencyCache::new()));
//! let body = json!({"username": "alice", "email": "ALICE@X.COM"});
//! let input = RawInput::from_body(body.as_object().cloned().unwrap_or_default());
//!
//! let result = pipeline.validate(input, &endpoint);
//! assert_eq!(result.value().unwrap()["email"], "alice@x.com");
//! # Ok::<(), reqgate_core::Error>(())
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod formatter;
pub mod mode;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod validators;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use adapter::{FrameworkAdapter, GenericAdapter};
pub use cache::{CacheConfig, CacheStats, IdempotencyCache, IdempotencyKey};
pub use config::{EndpointConfig, EndpointConfigBuilder, GatewaySettings};
pub use error::{Error, Result};
pub use formatter::{DefaultErrorFormatter, ErrorFormatter};
pub use mode::{ModePolicy, PolicyDecision, Recovery, ValidationMode};
pub use pipeline::{MergeOrder, ValidatorPipeline};
pub use schema::{ExtraFields, Fallback, FieldFailure, Schema, SchemaOptions, SchemaOutcome};
pub use types::{
    // Request data
    collect_pairs, FieldMap, RawInput, RawSource, SourceKind,

    // Results and errors
    ErrorDetail, GatewayValidationError, ValidatedObject, ValidationResult,

    // Stable codes and labels
    GATEWAY_MISCONFIGURED_CODE, INTERNAL_ERROR_CODE, MALFORMED_REQUEST_CODE,
    PAYLOAD_TOO_LARGE_CODE, POST_VALIDATION_ERROR_CODE, PRE_VALIDATION_ERROR_CODE, ROOT_FIELD,
    UNSUPPORTED_INPUT_CODE, VALIDATION_ERROR_CODE, VALIDATION_ERROR_LABEL,
};
pub use validators::{PostValidator, PostValidatorError, PreValidator, PreValidatorError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
