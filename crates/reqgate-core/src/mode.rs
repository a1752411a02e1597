//! Validation modes and the policy that judges schema outcomes under them
//!
//! The mode decides three things before and after the schema capability runs:
//! whether unknown fields are rejected or dropped, whether the capability may
//! coerce mismatched types, and whether failing fields may be recovered through
//! a per-field fallback.
//!
//! | mode       | unknown fields | coercion | fallbacks |
//! |------------|----------------|----------|-----------|
//! | STRICT     | failure        | no       | no        |
//! | LAX        | dropped        | yes      | no        |
//! | PERMISSIVE | dropped        | yes      | yes       |
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::schema::{ExtraFields, Fallback, FieldFailure, Schema, SchemaOptions, SchemaOutcome};
use crate::types::FieldMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strictness policy selected per validated endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Unknown fields and any schema failure fail the request
    #[default]
    Strict,
    /// Unknown fields are dropped; type failures still fail
    Lax,
    /// Unknown fields are dropped; failing fields with a fallback are recovered
    Permissive,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Permissive => "permissive",
        }
    }

    /// Options handed to the schema capability under this mode
    pub fn schema_options(&self) -> SchemaOptions {
        match self {
            ValidationMode::Strict => SchemaOptions {
                extra: ExtraFields::Forbid,
                coerce: false,
            },
            ValidationMode::Lax | ValidationMode::Permissive => SchemaOptions {
                extra: ExtraFields::Ignore,
                coerce: true,
            },
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "permissive" => Ok(ValidationMode::Permissive),
            other => Err(crate::Error::configuration(
                format!("unknown validation mode '{}'", other),
                Some("mode"),
            )),
        }
    }
}

/// A field PERMISSIVE mode recovered instead of failing the request
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub field: String,
    pub fallback: Fallback,
    /// The failure that was recovered
    pub failure: FieldFailure,
}

/// What the policy did, alongside the schema outcome
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub outcome: SchemaOutcome,
    /// Unknown fields removed before validation, in input order
    pub dropped: Vec<String>,
    pub recovered: Vec<Recovery>,
    /// Failing fields PERMISSIVE mode could not recover because no fallback exists
    pub unrecoverable: Vec<String>,
}

/// Applies a [`ValidationMode`] around a schema capability
#[derive(Debug, Clone, Copy)]
pub struct ModePolicy {
    mode: ValidationMode,
}

impl ModePolicy {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Run `schema` over `fields` and judge the outcome under the mode
    pub fn evaluate(&self, schema: &dyn Schema, fields: FieldMap) -> PolicyDecision {
        let options = self.mode.schema_options();

        match self.mode {
            ValidationMode::Strict => PolicyDecision {
                outcome: schema.validate(&fields, options),
                dropped: Vec::new(),
                recovered: Vec::new(),
                unrecoverable: Vec::new(),
            },
            ValidationMode::Lax => {
                let (fields, dropped) = drop_unknown(schema, fields);
                PolicyDecision {
                    outcome: schema.validate(&fields, options),
                    dropped,
                    recovered: Vec::new(),
                    unrecoverable: Vec::new(),
                }
            }
            ValidationMode::Permissive => {
                let (fields, dropped) = drop_unknown(schema, fields);
                self.evaluate_permissive(schema, fields, dropped, options)
            }
        }
    }

    fn evaluate_permissive(
        &self,
        schema: &dyn Schema,
        mut fields: FieldMap,
        dropped: Vec<String>,
        options: SchemaOptions,
    ) -> PolicyDecision {
        let failures = match schema.validate(&fields, options) {
            Ok(value) => {
                return PolicyDecision {
                    outcome: Ok(value),
                    dropped,
                    recovered: Vec::new(),
                    unrecoverable: Vec::new(),
                }
            }
            Err(failures) => failures,
        };

        let mut recovered = Vec::new();
        let mut unrecoverable = Vec::new();
        for failure in &failures {
            if recovered.iter().any(|r: &Recovery| r.field == failure.field) {
                continue;
            }
            match schema.fallback(&failure.field) {
                Some(fallback) if schema.is_known_field(&failure.field) => {
                    match &fallback {
                        Fallback::Default(value) => {
                            fields.insert(failure.field.clone(), value.clone());
                        }
                        Fallback::Omit => {
                            fields.remove(&failure.field);
                        }
                    }
                    recovered.push(Recovery {
                        field: failure.field.clone(),
                        fallback,
                        failure: failure.clone(),
                    });
                }
                _ => {
                    if !unrecoverable.contains(&failure.field) {
                        unrecoverable.push(failure.field.clone());
                    }
                }
            }
        }

        // Nothing changed, so a second pass would report the same failures
        let outcome = if recovered.is_empty() {
            Err(failures)
        } else {
            schema.validate(&fields, options)
        };

        PolicyDecision {
            outcome,
            dropped,
            recovered,
            unrecoverable,
        }
    }
}

/// Remove fields the schema does not declare, keeping input order
fn drop_unknown(schema: &dyn Schema, fields: FieldMap) -> (FieldMap, Vec<String>) {
    let mut kept = FieldMap::new();
    let mut dropped = Vec::new();
    for (name, value) in fields {
        if schema.is_known_field(&name) {
            kept.insert(name, value);
        } else {
            dropped.push(name);
        }
    }
    (kept, dropped)
}
