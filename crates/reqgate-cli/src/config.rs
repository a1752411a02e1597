//! Configuration management for the CLI
//!
//! Configuration is read from the first file found among:
//! - the `--config` flag or `REQGATE_CONFIG`
//! - `.reqgate.yaml`, `.reqgate.yml`, `.reqgate.json`, `.reqgate.toml` in the current directory
//! - `config.{yaml,json,toml}` in the user config directory (`reqgate/`)
//!
//! Missing files fall back to defaults; command-line flags override the file.

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::logging::LogFormat;
use reqgate_core::GatewaySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project config file written by `config init`
pub const PROJECT_CONFIG_FILE: &str = ".reqgate.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline defaults (mode, merge order, cache)
    pub gateway: GatewaySettings,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Use colored output when writing to a terminal
    pub color: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level used when no `-v` flag is given
    pub level: String,

    /// Log format (compact, full, json)
    pub format: LogFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Serialization format of a config file, from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
    Toml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            Some("toml") => Ok(FileFormat::Toml),
            _ => Err(Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "a .yaml, .yml, .json or .toml config file".to_string(),
            }),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config = match format {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to load config, trying next location");
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Path of the user-level config file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reqgate").join("config.toml"))
    }

    /// Get default configuration file paths to check, in priority order
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".reqgate.yaml"),
            PathBuf::from(".reqgate.yml"),
            PathBuf::from(".reqgate.json"),
            PathBuf::from(PROJECT_CONFIG_FILE),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let reqgate_dir = config_dir.join("reqgate");
            paths.push(reqgate_dir.join("config.yaml"));
            paths.push(reqgate_dir.join("config.json"));
            paths.push(reqgate_dir.join("config.toml"));
        }

        paths
    }

    /// Serialize in the format implied by the file extension
    pub fn to_string_for(&self, path: &Path) -> Result<String> {
        match FileFormat::from_path(path)? {
            FileFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            FileFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e))),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_string_for(path)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqgate_core::{SourceKind, ValidationMode};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gateway.default_mode, ValidationMode::Strict);
        assert_eq!(config.output.format, OutputFormat::Human);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reqgate.yaml");
        fs::write(
            &path,
            "gateway:\n  default_mode: lax\n  merge_order: [query, body]\n  cache:\n    ttl_secs: 30\noutput:\n  format: json-pretty\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.gateway.default_mode, ValidationMode::Lax);
        assert_eq!(
            config.gateway.merge_order.kinds(),
            &[SourceKind::Query, SourceKind::Body]
        );
        assert_eq!(config.gateway.cache.ttl_secs, Some(30));
        assert_eq!(config.output.format, OutputFormat::JsonPretty);
        // Untouched sections keep their defaults
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("c.toml");
        fs::write(&toml_path, "[gateway]\ndefault_mode = \"permissive\"\n\n[logging]\nformat = \"json\"\n").unwrap();
        let config = Config::from_file(&toml_path).unwrap();
        assert_eq!(config.gateway.default_mode, ValidationMode::Permissive);
        assert_eq!(config.logging.format, LogFormat::Json);

        let json_path = dir.path().join("c.json");
        fs::write(&json_path, r#"{"output": {"color": false}}"#).unwrap();
        let config = Config::from_file(&json_path).unwrap();
        assert!(!config.output.color);
    }

    #[test]
    fn test_duplicate_merge_order_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.yaml");
        fs::write(&path, "gateway:\n  merge_order: [body, body]\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.ini");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            Config::load_with_file(Some(&missing)),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_save_round_trips_each_format() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.gateway.default_mode = ValidationMode::Lax;
        config.output.format = OutputFormat::Yaml;

        for name in ["out.toml", "out.yaml", "out.json"] {
            let path = dir.path().join("nested").join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), config, "format {}", name);
        }
    }
}
