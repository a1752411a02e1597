//! Gateway and endpoint configuration
//!
//! [`GatewaySettings`] holds process-wide defaults and is usually loaded from
//! a config file. [`EndpointConfig`] is the immutable per-endpoint bundle of
//! schema, mode, validators and formatter, assembled once at registration time
//! through [`EndpointConfigBuilder`].
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::cache::CacheConfig;
use crate::formatter::{DefaultErrorFormatter, ErrorFormatter};
use crate::mode::ValidationMode;
use crate::pipeline::MergeOrder;
use crate::schema::Schema;
use crate::validators::{PostValidator, PreValidator};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of per-build endpoint identities
static NEXT_ENDPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide pipeline defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Mode used by endpoints that do not choose one
    pub default_mode: ValidationMode,
    /// Merge order used by endpoints that do not choose one
    pub merge_order: MergeOrder,
    pub cache: CacheConfig,
}

struct EndpointInner {
    name: String,
    schema: Arc<dyn Schema>,
    mode: Option<ValidationMode>,
    merge_order: Option<MergeOrder>,
    pre_validators: Vec<PreValidator>,
    post_validators: Vec<PostValidator>,
    formatter: Arc<dyn ErrorFormatter>,
    id: u64,
    fingerprint: String,
}

/// Immutable validation configuration of one endpoint
///
/// Cloning is cheap; all clones share the same configuration.
#[derive(Clone)]
pub struct EndpointConfig {
    inner: Arc<EndpointInner>,
}

impl EndpointConfig {
    pub fn builder(schema: Arc<dyn Schema>) -> EndpointConfigBuilder {
        EndpointConfigBuilder::new(schema)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn schema(&self) -> &dyn Schema {
        self.inner.schema.as_ref()
    }

    /// The endpoint's own mode; `None` defers to the gateway default
    pub fn mode(&self) -> Option<ValidationMode> {
        self.inner.mode
    }

    /// The endpoint's own merge order; `None` defers to the gateway default
    pub fn merge_order(&self) -> Option<&MergeOrder> {
        self.inner.merge_order.as_ref()
    }

    pub fn pre_validators(&self) -> &[PreValidator] {
        &self.inner.pre_validators
    }

    pub fn post_validators(&self) -> &[PostValidator] {
        &self.inner.post_validators
    }

    pub fn formatter(&self) -> &dyn ErrorFormatter {
        self.inner.formatter.as_ref()
    }

    /// Process-unique identity assigned by [`EndpointConfigBuilder::build`]
    ///
    /// Clones share it; two separately built endpoints never do, even when
    /// their names and validator names match.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Identity of the endpoint and its validator chain, part of every cache key
    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("schema", &self.inner.schema.id())
            .field("mode", &self.inner.mode)
            .field("merge_order", &self.inner.merge_order)
            .field("pre_validators", &self.inner.pre_validators)
            .field("post_validators", &self.inner.post_validators)
            .finish()
    }
}

/// Builder for [`EndpointConfig`]
pub struct EndpointConfigBuilder {
    name: Option<String>,
    schema: Arc<dyn Schema>,
    mode: Option<ValidationMode>,
    merge_order: Option<MergeOrder>,
    pre_validators: Vec<PreValidator>,
    post_validators: Vec<PostValidator>,
    formatter: Option<Arc<dyn ErrorFormatter>>,
}

impl EndpointConfigBuilder {
    pub fn new(schema: Arc<dyn Schema>) -> Self {
        Self {
            name: None,
            schema,
            mode: None,
            merge_order: None,
            pre_validators: Vec::new(),
            post_validators: Vec::new(),
            formatter: None,
        }
    }

    /// Endpoint name used in logs and cache keys; defaults to the schema id
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn merge_order(mut self, order: MergeOrder) -> Self {
        self.merge_order = Some(order);
        self
    }

    /// Append a pre-validator; they run in the order added
    pub fn pre_validator(mut self, validator: PreValidator) -> Self {
        self.pre_validators.push(validator);
        self
    }

    /// Append a post-validator; they run in the order added
    pub fn post_validator(mut self, validator: PostValidator) -> Self {
        self.post_validators.push(validator);
        self
    }

    /// Replace the default error formatter
    pub fn error_formatter(mut self, formatter: impl ErrorFormatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn build(self) -> Result<EndpointConfig> {
        let schema_id = self.schema.id().to_string();
        if schema_id.trim().is_empty() {
            return Err(Error::SchemaDefinition {
                schema: schema_id,
                message: "schema identity must not be empty".to_string(),
            });
        }

        let name = self.name.unwrap_or_else(|| schema_id.clone());
        if name.trim().is_empty() {
            return Err(Error::configuration("endpoint name must not be empty", Some("name")));
        }

        // Validators and formatters are opaque closures, so only a build-time
        // id tells two endpoints with the same names apart
        let id = NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed);
        let fingerprint = fingerprint(id, &name, &self.pre_validators, &self.post_validators);
        let formatter: Arc<dyn ErrorFormatter> = match self.formatter {
            Some(formatter) => formatter,
            None => Arc::new(DefaultErrorFormatter),
        };

        Ok(EndpointConfig {
            inner: Arc::new(EndpointInner {
                name,
                schema: self.schema,
                mode: self.mode,
                merge_order: self.merge_order,
                pre_validators: self.pre_validators,
                post_validators: self.post_validators,
                formatter,
                id,
                fingerprint,
            }),
        })
    }
}

fn fingerprint(id: u64, name: &str, pre: &[PreValidator], post: &[PostValidator]) -> String {
    let pre: Vec<&str> = pre.iter().map(PreValidator::name).collect();
    let post: Vec<&str> = post.iter().map(PostValidator::name).collect();
    format!("{}#{}|pre:{}|post:{}", name, id, pre.join(","), post.join(","))
}
