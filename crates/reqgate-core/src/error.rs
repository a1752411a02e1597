//! Error types for the reqgate core library
//!
//! Request-level validation failures are not errors in this sense: they are
//! returned as [`GatewayValidationError`](crate::GatewayValidationError) values
//! inside a [`ValidationResult`](crate::ValidationResult). The [`Error`] type
//! defined here covers configuration and programming faults that surface while
//! building endpoints or converting validated objects.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Main error type for reqgate core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid gateway or endpoint configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        setting: Option<String>,
    },

    /// A schema definition could not be used
    #[error("Schema definition error for '{schema}': {message}")]
    SchemaDefinition { schema: String, message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A validated object could not be converted into the requested type
    #[error("Failed to convert validated object into {target}: {source}")]
    Conversion {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error for a named setting
    pub fn configuration(message: impl Into<String>, setting: Option<&str>) -> Self {
        Error::Configuration {
            message: message.into(),
            setting: setting.map(str::to_string),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
