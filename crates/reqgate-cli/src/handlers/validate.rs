//! Validation command handler
//!
//! The payload file is the request body; `--query` and `--path` pairs are
//! added as their own sources so the merge order applies exactly as it does
//! behind an HTTP adapter.

use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::OutputWriter;
use is_terminal::IsTerminal;
use reqgate_core::validators::built_in;
use reqgate_core::{
    collect_pairs, EndpointConfig, FrameworkAdapter, GenericAdapter, RawInput, Schema, SourceKind,
    ValidationResult, ValidatorPipeline,
};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip_all, fields(payload = %args.payload.display(), schema = %args.schema.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &format!("schema: {}", args.schema.display()));

    match evaluate(&args, config, output)? {
        ValidationResult::Success(value) => {
            info!("Payload accepted");
            output.success("✓ Payload is valid")?;
            output.data(&value)?;
            Ok(())
        }
        ValidationResult::Failure(error) => {
            warn!(code = error.code(), issues = error.details().len(), "Payload rejected");
            output.error("✗ Payload rejected")?;
            output.gateway_error(&error)?;
            Err(Error::ValidationFailed {
                code: error.code().to_string(),
                count: error.details().len(),
            })
        }
    }
}

/// Run the payload through the pipeline
fn evaluate(args: &ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<ValidationResult> {
    let payload = read_payload(&args.payload)?;

    output.info(&format!("Loading schema: {}", args.schema.display()))?;
    let schema = load_schema(&args.schema, output)?;
    debug!(schema_id = schema.id(), "Schema loaded");

    let endpoint = build_endpoint(args, schema)?;
    let pipeline = ValidatorPipeline::from_settings(config.gateway.clone());

    let mut input = match GenericAdapter::new().extract(payload) {
        Ok(input) => input,
        Err(error) => return Ok(ValidationResult::Failure(error)),
    };
    if !args.query.is_empty() {
        input.push(SourceKind::Query, collect_pairs(args.query.iter().cloned()));
    }
    if !args.path.is_empty() {
        input.push(SourceKind::Path, collect_pairs(args.path.iter().cloned()));
    }

    if args.detailed && output.format() == OutputFormat::Human {
        show_details(&pipeline, &endpoint, &input, output)?;
    }

    Ok(pipeline.validate(input, &endpoint))
}

/// Read the request body; an empty payload is an empty request
fn read_payload(path: &Path) -> Result<Value> {
    let (content, is_yaml) = if path.as_os_str() == "-" {
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(Error::invalid_args("payload '-' expects data piped on stdin"));
        }
        let mut content = String::new();
        stdin.read_to_string(&mut content)?;
        (content, false)
    } else {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s == "yaml" || s == "yml")
            .unwrap_or(false);
        (std::fs::read_to_string(path)?, is_yaml)
    };

    if content.trim().is_empty() {
        return Ok(Value::Null);
    }

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

fn load_schema(path: &Path, output: &OutputWriter) -> Result<Arc<dyn Schema>> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let spinner = output.spinner("Compiling schema...");
    let schema = reqgate_schemas::load_schema(path);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    Ok(schema?)
}

fn build_endpoint(args: &ValidateArgs, schema: Arc<dyn Schema>) -> Result<EndpointConfig> {
    let mut builder = EndpointConfig::builder(schema).name("cli");

    if let Some(mode) = args.mode {
        builder = builder.mode(mode.into());
    }
    if args.sanitize {
        builder = builder.pre_validator(built_in::sanitize_strings());
    }
    if args.normalize_email {
        builder = builder.pre_validator(built_in::normalize_email());
    }

    Ok(builder.build()?)
}

fn show_details(
    pipeline: &ValidatorPipeline,
    endpoint: &EndpointConfig,
    input: &RawInput,
    output: &mut OutputWriter,
) -> Result<()> {
    let order = endpoint
        .merge_order()
        .unwrap_or(&pipeline.settings().merge_order);

    output.section("Request")?;
    output.info(&format!("Mode: {}", pipeline.effective_mode(endpoint)))?;
    output.info(&format!("Merge order: {}", order))?;
    output.info(&format!(
        "Pre-validators: {}",
        endpoint.pre_validators().len()
    ))?;
    output.section("Merged Input")?;
    output.data(&redaction::redacted(&Value::Object(order.merge(input))))?;
    output.section("Result")
}
