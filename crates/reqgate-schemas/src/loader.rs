//! Loading schema capabilities from files
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldSchema;
use crate::json_schema::JsonSchemaCapability;
use reqgate_core::Schema;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Supported file formats for schema files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl Format {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> SchemaResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(SchemaError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Which capability a schema document describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// A declarative `{id, fields}` definition
    Fields,
    /// A JSON Schema document
    JsonSchema,
}

impl SchemaKind {
    /// JSON Schema documents carry `$schema`, `properties` or `type` at the top level
    pub fn detect(document: &Value) -> Self {
        let is_json_schema = document
            .as_object()
            .map(|map| ["$schema", "properties", "type"].iter().any(|k| map.contains_key(*k)))
            .unwrap_or(false);

        if is_json_schema {
            SchemaKind::JsonSchema
        } else {
            SchemaKind::Fields
        }
    }
}

/// Read and parse a schema file into a JSON value
pub fn read_document(path: &Path) -> SchemaResult<Value> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| SchemaError::io_error(path.to_path_buf(), e))?;

    match format {
        Format::Yaml => serde_yaml::from_str(&content).map_err(|source| SchemaError::YamlParse {
            path: path.to_path_buf(),
            source,
        }),
        Format::Json => serde_json::from_str(&content).map_err(|source| SchemaError::JsonParse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Build a capability from a parsed document
///
/// `default_id` names the schema when the document does not.
pub fn schema_from_document(document: Value, default_id: &str) -> SchemaResult<Arc<dyn Schema>> {
    match SchemaKind::detect(&document) {
        SchemaKind::JsonSchema => {
            let id = document
                .get("$id")
                .or_else(|| document.get("title"))
                .and_then(Value::as_str)
                .unwrap_or(default_id)
                .to_string();
            Ok(Arc::new(JsonSchemaCapability::new(id, document)?))
        }
        SchemaKind::Fields => {
            let mut schema: FieldSchema = serde_json::from_value(document)
                .map_err(|e| SchemaError::invalid(default_id, e.to_string()))?;
            schema.set_id_if_missing(default_id);
            schema.check_definition()?;
            Ok(Arc::new(schema))
        }
    }
}

/// Load a schema file, detecting its kind from the content
///
/// Schemas that do not name themselves are identified by the file stem.
pub fn load_schema(path: &Path) -> SchemaResult<Arc<dyn Schema>> {
    let document = read_document(path)?;
    let kind = SchemaKind::detect(&document);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("schema");

    let schema = schema_from_document(document, stem)?;
    debug!(path = %path.display(), id = schema.id(), ?kind, "loaded schema");
    Ok(schema)
}
