//! The validator pipeline
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::cache::{IdempotencyCache, IdempotencyKey};
use crate::config::{EndpointConfig, GatewaySettings};
use crate::mode::{ModePolicy, ValidationMode};
use crate::types::{FieldMap, GatewayValidationError, RawInput, ValidationResult};
use crate::validators::types::panic_message;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, debug_span, error, warn};

/// Runs merge, idempotency lookup, pre-validators, schema validation under a
/// mode and post-validators for one request
///
/// The pipeline never panics and never returns an error to its caller: every
/// failure path ends in [`ValidationResult::Failure`].
#[derive(Debug, Clone)]
pub struct ValidatorPipeline {
    settings: GatewaySettings,
    cache: Arc<IdempotencyCache>,
}

impl ValidatorPipeline {
    /// Create a pipeline with default settings around an existing cache
    pub fn new(cache: Arc<IdempotencyCache>) -> Self {
        Self::with_cache(GatewaySettings::default(), cache)
    }

    /// Create a pipeline and a fresh cache from settings
    pub fn from_settings(settings: GatewaySettings) -> Self {
        let cache = Arc::new(IdempotencyCache::with_config(settings.cache.clone()));
        Self::with_cache(settings, cache)
    }

    /// Create a pipeline with explicit settings and cache
    ///
    /// `settings.cache` is ignored; the cache carries its own configuration.
    pub fn with_cache(settings: GatewaySettings, cache: Arc<IdempotencyCache>) -> Self {
        Self { settings, cache }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<IdempotencyCache> {
        &self.cache
    }

    /// Mode an endpoint runs under once gateway defaults are applied
    pub fn effective_mode(&self, endpoint: &EndpointConfig) -> ValidationMode {
        endpoint.mode().unwrap_or(self.settings.default_mode)
    }

    /// Validate one request's raw input against an endpoint
    pub fn validate(&self, input: RawInput, endpoint: &EndpointConfig) -> ValidationResult {
        let mode = self.effective_mode(endpoint);
        let span = debug_span!("validate", endpoint = endpoint.name(), mode = %mode);
        let _enter = span.enter();

        let merge_order = endpoint.merge_order().unwrap_or(&self.settings.merge_order);
        let merged = merge_order.merge(&input);
        let key = IdempotencyKey::derive(endpoint.schema().id(), mode, endpoint.fingerprint(), &merged);
        debug!(key = %key.short(), fields = merged.len(), "merged request sources");

        self.cache.get_or_compute(key, || {
            match catch_unwind(AssertUnwindSafe(|| self.execute(merged, endpoint, mode))) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(&*payload);
                    error!(%message, "validation panicked");
                    ValidationResult::Failure(GatewayValidationError::internal(format!(
                        "validation aborted: {}",
                        message
                    )))
                }
            }
        })
    }

    fn execute(&self, merged: FieldMap, endpoint: &EndpointConfig, mode: ValidationMode) -> ValidationResult {
        let mut fields = merged;
        for validator in endpoint.pre_validators() {
            match validator.run(fields) {
                Ok(next) => fields = next,
                Err(err) => {
                    debug!(validator = validator.name(), error = %err, "pre-validation failed");
                    return ValidationResult::Failure(err.to_gateway_error());
                }
            }
        }

        let decision = ModePolicy::new(mode).evaluate(endpoint.schema(), fields);
        if !decision.dropped.is_empty() {
            debug!(dropped = ?decision.dropped, "dropped unknown fields");
        }
        for recovery in &decision.recovered {
            debug!(
                field = %recovery.field,
                tag = %recovery.failure.type_tag,
                "recovered failing field with fallback"
            );
        }
        if !decision.unrecoverable.is_empty() {
            warn!(
                fields = ?decision.unrecoverable,
                "no fallback configured for failing fields in permissive mode"
            );
        }

        let mut value = match decision.outcome {
            Ok(value) => value,
            Err(failures) => {
                debug!(failures = failures.len(), "schema validation failed");
                return ValidationResult::Failure(endpoint.formatter().format(&failures));
            }
        };

        for validator in endpoint.post_validators() {
            match validator.run(value) {
                Ok(next) => value = next,
                Err(err) => {
                    debug!(validator = validator.name(), error = %err, "post-validation failed");
                    return ValidationResult::Failure(err.to_gateway_error());
                }
            }
        }

        ValidationResult::Success(value)
    }
}
