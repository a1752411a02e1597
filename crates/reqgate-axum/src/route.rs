//! Binding of a pipeline and an endpoint to an axum route
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use axum::Extension;
use reqgate_core::{EndpointConfig, ValidatorPipeline};
use std::sync::Arc;

/// What a [`Validated`](crate::Validated) extractor validates against
///
/// Attach it to a route (or router) with [`ValidatedRoute::layer`]; the
/// extractor reads it back from the request extensions.
#[derive(Debug, Clone)]
pub struct ValidatedRoute {
    pipeline: Arc<ValidatorPipeline>,
    endpoint: EndpointConfig,
}

impl ValidatedRoute {
    pub fn new(pipeline: Arc<ValidatorPipeline>, endpoint: EndpointConfig) -> Self {
        Self { pipeline, endpoint }
    }

    pub fn pipeline(&self) -> &ValidatorPipeline {
        &self.pipeline
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Layer inserting this binding into every request's extensions
    pub fn layer(self) -> Extension<Self> {
        Extension(self)
    }
}
