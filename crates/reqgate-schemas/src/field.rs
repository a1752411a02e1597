//! Declarative field schemas
//!
//! A [`FieldSchema`] is an ordered list of typed [`Field`]s. Failures use the
//! pydantic v1 tag vocabulary (`value_error.missing`, `type_error.integer`...)
//! and are reported in field declaration order, followed by undeclared fields
//! in input order when extras are forbidden.
//!
//! Schemas are built in code or deserialized from YAML/JSON:
//!
//! ```yaml
//! id: user
//! fields:
//!   - name: username
//!     type: str
//!   - name: age
//!     type: int
//!     fallback:
//!       default: 18
//!   - name: newsletter
//!     type: bool
//!     default: false
//! ```
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::error::{SchemaError, SchemaResult};
use reqgate_core::{ExtraFields, Fallback, FieldFailure, FieldMap, Schema, SchemaOptions, SchemaOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Value types a field can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[serde(alias = "string")]
    Str,
    #[serde(alias = "integer")]
    Int,
    #[serde(alias = "number")]
    Float,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "array")]
    List,
    #[serde(alias = "dict")]
    Object,
    Any,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::List => "list",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }

    fn mismatch(&self) -> (&'static str, &'static str) {
        match self {
            FieldType::Str => ("type_error.str", "str type expected"),
            FieldType::Int => ("type_error.integer", "value is not a valid integer"),
            FieldType::Float => ("type_error.float", "value is not a valid float"),
            FieldType::Bool => ("type_error.bool", "value could not be parsed to a boolean"),
            FieldType::List => ("type_error.list", "value is not a valid list"),
            FieldType::Object => ("type_error.dict", "value is not a valid dict"),
            FieldType::Any => ("type_error", "invalid value"),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_required() -> bool {
    true
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Missing required fields without a default fail with `value_error.missing`
    #[serde(default = "default_required")]
    pub required: bool,
    /// Used when the field is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Used by PERMISSIVE mode when the field fails validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
    /// Accept `null` even though the field is required
    #[serde(default)]
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            default: None,
            fallback: None,
            nullable: false,
        }
    }

    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, true)
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, false)
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn check(&self, value: &Value, coerce: bool) -> Result<Value, FieldFailure> {
        if value.is_null() {
            return if self.nullable || !self.required {
                Ok(Value::Null)
            } else {
                Err(FieldFailure::new(
                    &self.name,
                    "none is not an allowed value",
                    "type_error.none.not_allowed",
                ))
            };
        }

        let converted = match self.field_type {
            FieldType::Any => Some(value.clone()),
            FieldType::Str => to_str(value, coerce),
            FieldType::Int => to_int(value, coerce),
            FieldType::Float => to_float(value, coerce),
            FieldType::Bool => to_bool(value, coerce),
            FieldType::List => match value {
                Value::Array(_) => Some(value.clone()),
                // A single query parameter arrives as a scalar
                Value::String(_) | Value::Number(_) | Value::Bool(_) if coerce => {
                    Some(Value::Array(vec![value.clone()]))
                }
                _ => None,
            },
            FieldType::Object => value.is_object().then(|| value.clone()),
        };

        converted.ok_or_else(|| {
            let (tag, message) = self.field_type.mismatch();
            FieldFailure::new(&self.name, message, tag)
        })
    }
}

fn to_str(value: &Value, coerce: bool) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) if coerce => Some(Value::String(n.to_string())),
        Value::Bool(b) if coerce => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn to_int(value: &Value, coerce: bool) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Number(n) if coerce => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        Value::String(s) if coerce => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn to_float(value: &Value, coerce: bool) -> Option<Value> {
    match value {
        Value::Number(n) => n.as_f64().map(Value::from),
        Value::String(s) if coerce => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::from),
        _ => None,
    }
}

fn to_bool(value: &Value, coerce: bool) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) if coerce => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
        Value::Number(n) if coerce => match n.as_i64() {
            Some(1) => Some(Value::Bool(true)),
            Some(0) => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// An ordered, declarative schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    id: String,
    #[serde(default)]
    fields: Vec<Field>,
}

impl FieldSchema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style)
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn set_id_if_missing(&mut self, id: &str) {
        if self.id.trim().is_empty() {
            self.id = id.to_string();
        }
    }

    /// Check the definition itself: non-empty id, unique non-empty field names
    pub fn check_definition(&self) -> SchemaResult<()> {
        if self.id.trim().is_empty() {
            return Err(SchemaError::invalid("<unnamed>", "schema id must not be empty"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::invalid(&self.id, "field names must not be empty"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::invalid(
                    &self.id,
                    format!("field '{}' declared more than once", field.name),
                ));
            }
        }
        Ok(())
    }

    /// Parse from a YAML document
    pub fn from_yaml_str(source: &str) -> SchemaResult<Self> {
        let value: Value = serde_yaml::from_str(source)
            .map_err(|e| SchemaError::invalid("<inline>", e.to_string()))?;
        Self::from_value(value)
    }

    /// Build from an already parsed definition
    pub fn from_value(value: Value) -> SchemaResult<Self> {
        let schema: Self = serde_json::from_value(value)
            .map_err(|e| SchemaError::invalid("<inline>", e.to_string()))?;
        schema.check_definition()?;
        Ok(schema)
    }
}

impl Schema for FieldSchema {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_known_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    fn validate(&self, fields: &FieldMap, options: SchemaOptions) -> SchemaOutcome {
        let mut validated = FieldMap::new();
        let mut failures = Vec::new();

        for field in &self.fields {
            match fields.get(&field.name) {
                None => {
                    if let Some(default) = &field.default {
                        validated.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        failures.push(FieldFailure::new(
                            &field.name,
                            "field required",
                            "value_error.missing",
                        ));
                    }
                }
                Some(value) => match field.check(value, options.coerce) {
                    Ok(value) => {
                        validated.insert(field.name.clone(), value);
                    }
                    Err(failure) => failures.push(failure),
                },
            }
        }

        if options.extra == ExtraFields::Forbid {
            for name in fields.keys().filter(|name| !self.is_known_field(name)) {
                failures.push(FieldFailure::new(
                    name,
                    "extra fields not permitted",
                    "value_error.extra",
                ));
            }
        }

        if failures.is_empty() {
            Ok(Value::Object(validated))
        } else {
            Err(failures)
        }
    }

    fn fallback(&self, field: &str) -> Option<Fallback> {
        let field = self.get(field)?;
        field
            .fallback
            .clone()
            .or_else(|| field.default.clone().map(Fallback::Default))
    }
}
