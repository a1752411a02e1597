//! Schema capability boundary
//!
//! The pipeline does not know how structural validation works. It hands a
//! merged field map to a [`Schema`] together with [`SchemaOptions`] chosen by
//! the mode policy, and receives either a validated object or an ordered list
//! of [`FieldFailure`]s tagged in the capability's own vocabulary.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::types::{FieldMap, ValidatedObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single field-level failure reported by a schema capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
    /// The capability's canonical type tag, e.g. `type_error.integer`
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl FieldFailure {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            type_tag: type_tag.into(),
        }
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.type_tag)
    }
}

/// Result of running a schema capability
pub type SchemaOutcome = std::result::Result<ValidatedObject, Vec<FieldFailure>>;

/// How a schema should treat fields it does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFields {
    /// Report each undeclared field as a failure
    Forbid,
    /// Leave undeclared fields out of the validated object
    Ignore,
}

/// Knobs the mode policy passes to a schema capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    pub extra: ExtraFields,
    /// Whether the capability may coerce mismatched types (e.g. `"25"` to `25`)
    pub coerce: bool,
}

/// What PERMISSIVE mode substitutes for a field that failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Replace the failing value with this one
    Default(Value),
    /// Remove the field so the schema treats it as missing
    Omit,
}

/// A structural/type validator the pipeline can delegate to
pub trait Schema: Send + Sync {
    /// Stable identity of the schema; part of the idempotency key
    fn id(&self) -> &str;

    /// Whether `field` is declared by the schema
    fn is_known_field(&self, field: &str) -> bool;

    /// Validate and coerce a field map
    ///
    /// Failures must be reported in a deterministic order; the pipeline
    /// never re-sorts them.
    fn validate(&self, fields: &FieldMap, options: SchemaOptions) -> SchemaOutcome;

    /// The PERMISSIVE-mode fallback configured for `field`, if any
    fn fallback(&self, _field: &str) -> Option<Fallback> {
        None
    }
}

impl fmt::Debug for dyn Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("id", &self.id()).finish()
    }
}
