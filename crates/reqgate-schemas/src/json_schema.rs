//! JSON Schema (draft 2020-12) schema capability
//!
//! Wraps a compiled `jsonschema` validator. Failures keep the validator's
//! order; each is tagged with the JSON Schema keyword that failed (`type`,
//! `required`, `minimum`...). The reported field is the first segment of the
//! failing instance path, the missing property of a `required` failure or the
//! unexpected property of an `additionalProperties` failure. This capability
//! never coerces values.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::error::{SchemaError, SchemaResult};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationError, Validator};
use reqgate_core::{
    ExtraFields, Fallback, FieldFailure, FieldMap, Schema, SchemaOptions, SchemaOutcome, ROOT_FIELD,
};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A compiled JSON Schema document usable as a schema capability
pub struct JsonSchemaCapability {
    id: String,
    document: Value,
    validator: Validator,
    fallbacks: HashMap<String, Fallback>,
}

impl JsonSchemaCapability {
    /// Compile `document` under draft 2020-12
    pub fn new(id: impl Into<String>, document: Value) -> SchemaResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SchemaError::invalid("<unnamed>", "schema id must not be empty"));
        }
        if !document.is_object() {
            return Err(SchemaError::invalid(&id, "a JSON Schema document must be an object"));
        }

        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&document)
            .map_err(|e| SchemaError::Compile {
                schema: id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            document,
            validator,
            fallbacks: HashMap::new(),
        })
    }

    /// Compile a document whose `$id` or `title` names it
    pub fn from_document(document: Value) -> SchemaResult<Self> {
        let id = document
            .get("$id")
            .or_else(|| document.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SchemaError::invalid("<unnamed>", "document has neither '$id' nor 'title'"))?;
        Self::new(id, document)
    }

    /// Configure the PERMISSIVE-mode fallback for a property
    pub fn with_fallback(mut self, field: impl Into<String>, fallback: Fallback) -> Self {
        self.fallbacks.insert(field.into(), fallback);
        self
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    fn properties(&self) -> Option<&serde_json::Map<String, Value>> {
        self.document.get("properties").and_then(Value::as_object)
    }

    fn forbids_additional(&self) -> bool {
        self.document.get("additionalProperties") == Some(&Value::Bool(false))
    }

    fn property_default(&self, field: &str) -> Option<&Value> {
        self.properties()?.get(field)?.get("default")
    }

    fn failures_for(error: &ValidationError<'_>) -> Vec<FieldFailure> {
        let schema_path = error.schema_path.to_string();
        let tag = keyword(&schema_path);
        let message = error.to_string();

        match &error.kind {
            ValidationErrorKind::Required { property } => {
                let field = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                vec![FieldFailure::new(field, message, tag)]
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
                .iter()
                .map(|field| FieldFailure::new(field, &message, &tag))
                .collect(),
            _ => {
                let instance_path = error.instance_path.to_string();
                vec![FieldFailure::new(first_segment(&instance_path), message, tag)]
            }
        }
    }
}

impl fmt::Debug for JsonSchemaCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaCapability")
            .field("id", &self.id)
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}

/// Last non-index segment of a schema path, i.e. the failing keyword
fn keyword(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .map(unescape)
        .unwrap_or_else(|| "schema".to_string())
}

/// Top-level field named by a JSON pointer, or the root marker
fn first_segment(instance_path: &str) -> String {
    instance_path
        .split('/')
        .find(|segment| !segment.is_empty())
        .map(unescape)
        .unwrap_or_else(|| ROOT_FIELD.to_string())
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

impl Schema for JsonSchemaCapability {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_known_field(&self, field: &str) -> bool {
        match self.properties() {
            Some(properties) => properties.contains_key(field),
            None => !self.forbids_additional(),
        }
    }

    fn validate(&self, fields: &FieldMap, options: SchemaOptions) -> SchemaOutcome {
        let mut instance = fields.clone();
        if let Some(properties) = self.properties() {
            for (name, property) in properties {
                if instance.contains_key(name) {
                    continue;
                }
                if let Some(default) = property.get("default") {
                    instance.insert(name.clone(), default.clone());
                }
            }
        }
        if options.extra == ExtraFields::Ignore {
            instance.retain(|name, _| self.is_known_field(name));
        }

        let instance = Value::Object(instance);
        let mut failures: Vec<FieldFailure> = self
            .validator
            .iter_errors(&instance)
            .flat_map(|error| Self::failures_for(&error))
            .collect();

        if options.extra == ExtraFields::Forbid && !self.forbids_additional() {
            for name in fields.keys().filter(|name| !self.is_known_field(name)) {
                failures.push(FieldFailure::new(
                    name,
                    format!("Additional properties are not allowed ('{}' was unexpected)", name),
                    "additionalProperties",
                ));
            }
        }

        if failures.is_empty() {
            Ok(instance)
        } else {
            Err(failures)
        }
    }

    fn fallback(&self, field: &str) -> Option<Fallback> {
        self.fallbacks
            .get(field)
            .cloned()
            .or_else(|| self.property_default(field).cloned().map(Fallback::Default))
    }
}
