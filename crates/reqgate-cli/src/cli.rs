//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use reqgate_core::ValidationMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reqgate CLI - validate request payloads the way the gateway would
///
/// Runs a payload through the full validation pipeline (merge, pre-validators,
/// mode policy, schema, post-validators) and prints the validated object or
/// the structured error.
#[derive(Parser, Debug)]
#[command(
    name = "reqgate",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "REQGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a request payload against a schema
    Validate(ValidateArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the JSON or YAML payload used as the request body ("-" reads stdin)
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// Schema file (field list or JSON Schema, JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Validation mode (defaults to gateway.default_mode)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Query string parameter, repeatable
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Path parameter, repeatable
    #[arg(long = "path", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub path: Vec<(String, String)>,

    /// Trim and lowercase email fields before validation
    #[arg(long)]
    pub normalize_email: bool,

    /// Strip markup and control characters from strings before validation
    #[arg(long)]
    pub sanitize: bool,

    /// Show the merged input and effective mode
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write the user config instead of .reqgate.toml in the current directory
    #[arg(long, conflicts_with = "path")]
    pub user: bool,

    /// Write to an explicit path
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Validation mode flag
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Exact types, no extra fields
    Strict,
    /// Coerce types, drop extra fields
    Lax,
    /// Recover invalid optional fields, flag ambiguities
    Permissive,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<ModeArg> for ValidationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => ValidationMode::Strict,
            ModeArg::Lax => ValidationMode::Lax,
            ModeArg::Permissive => ValidationMode::Permissive,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

/// Parse a `KEY=VALUE` argument; the value may itself contain `=`
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verify that the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["reqgate", "-vv", "validate", "p.json", "--schema", "s.yaml"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["reqgate", "--quiet", "validate", "p.json", "-s", "s.yaml"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_validate_arguments() {
        let cli = Cli::parse_from([
            "reqgate",
            "--output",
            "json-pretty",
            "validate",
            "payload.json",
            "--schema",
            "user.yaml",
            "--mode",
            "lax",
            "--query",
            "page=2",
            "--query",
            "filter=a=b",
            "--path",
            "id=7",
            "--normalize-email",
        ]);

        assert_eq!(cli.output, Some(OutputFormat::JsonPretty));
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        assert_eq!(args.mode, Some(ModeArg::Lax));
        assert_eq!(
            args.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("filter".to_string(), "a=b".to_string())
            ]
        );
        assert_eq!(args.path, vec![("id".to_string(), "7".to_string())]);
        assert!(args.normalize_email);
        assert!(!args.sanitize);
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a=1"), Ok(("a".to_string(), "1".to_string())));
        assert_eq!(parse_key_value("a="), Ok(("a".to_string(), String::new())));
        assert!(parse_key_value("=1").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(ValidationMode::from(ModeArg::Permissive), ValidationMode::Permissive);
    }
}
