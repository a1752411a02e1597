//! Reqgate Schemas - schema capabilities for the reqgate pipeline
//!
//! This crate implements the [`reqgate_core::Schema`] trait twice:
//!
//! - [`FieldSchema`]: an ordered list of typed fields with defaults and
//!   PERMISSIVE-mode fallbacks, reporting pydantic v1 style type tags
//! - [`JsonSchemaCapability`]: a compiled JSON Schema draft 2020-12 document
//!
//! [`load_schema`] reads either kind from a YAML or JSON file.
//!
//! ## Quick Start
//!
//! ```rust
//! use reqgate_core::{ExtraFields, Schema, SchemaOptions};
//! use reqgate_schemas::{Field, FieldSchema, FieldType};
//! use serde_json::json;
//!
//! let schema = FieldSchema::new("user")
//!     .field(Field::required("username", FieldType::Str))
//!     .field(Field::required("age", FieldType::Int));
//!
//! let input = json!({"username": "alice", "age": "25"});
//! let options = SchemaOptions { extra: ExtraFields::Ignore, coerce: true };
//! let value = schema.validate(input.as_object().unwrap(), options).unwrap();
//! assert_eq!(value, json!({"username": "alice", "age": 25}));
//! ```
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod field;
pub mod json_schema;
pub mod loader;

// Re-export commonly used types for convenience
pub use error::{SchemaError, SchemaResult};
pub use field::{Field, FieldSchema, FieldType};
pub use json_schema::JsonSchemaCapability;
pub use loader::{load_schema, read_document, schema_from_document, Format, SchemaKind};
