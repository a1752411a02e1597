//! Error types for schema loading and compilation
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading or building a schema capability
#[derive(Error, Debug)]
pub enum SchemaError {
    /// File I/O errors
    #[error("Failed to read schema file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing errors
    #[error("Failed to parse YAML schema '{path}': {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON schema '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Unsupported file format
    #[error("Unsupported schema format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },

    /// The definition parsed but does not describe a usable schema
    #[error("Invalid schema definition '{schema}': {reason}")]
    InvalidDefinition { schema: String, reason: String },

    /// A JSON Schema document could not be compiled
    #[error("Failed to compile JSON Schema '{schema}': {reason}")]
    Compile { schema: String, reason: String },
}

impl SchemaError {
    pub fn io_error(path: PathBuf, error: std::io::Error) -> Self {
        Self::Io {
            path,
            source: error,
        }
    }

    pub fn invalid(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}
