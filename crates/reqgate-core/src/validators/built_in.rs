//! Built-in pre-validators for common normalization steps
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use super::types::{PreValidator, PreValidatorError};
use crate::types::FieldMap;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static HTML_TAG_PATTERN: OnceLock<Regex> = OnceLock::new();
static MULTI_WHITESPACE: OnceLock<Regex> = OnceLock::new();
static CONTROL_CHARS: OnceLock<Regex> = OnceLock::new();

fn html_tags() -> &'static Regex {
    HTML_TAG_PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn multi_whitespace() -> &'static Regex {
    MULTI_WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn control_chars() -> &'static Regex {
    // Keeps tab, newline and carriage return
    CONTROL_CHARS.get_or_init(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap())
}

/// Apply `f` to every top-level string value
fn map_strings(mut fields: FieldMap, f: impl Fn(&str) -> String) -> FieldMap {
    for value in fields.values_mut() {
        if let Value::String(s) = value {
            *s = f(s);
        }
    }
    fields
}

fn is_email_field(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("email")
}

/// Trim and lowercase `email` and any other field whose name ends in `email`
pub fn normalize_email() -> PreValidator {
    PreValidator::infallible("normalize_email", |mut fields| {
        for (name, value) in fields.iter_mut() {
            if !is_email_field(name) {
                continue;
            }
            if let Value::String(s) = value {
                *s = s.trim().to_lowercase();
            }
        }
        fields
    })
}

/// Trim, drop control characters, strip HTML tags and collapse whitespace
pub fn sanitize_strings() -> PreValidator {
    PreValidator::infallible("sanitize_strings", |fields| {
        map_strings(fields, |s| {
            let no_control = control_chars().replace_all(s.trim(), "");
            let no_html = html_tags().replace_all(&no_control, "");
            multi_whitespace().replace_all(no_html.trim(), " ").into_owned()
        })
    })
}

/// Trim every top-level string
pub fn trim_strings() -> PreValidator {
    PreValidator::infallible("trim_strings", |fields| map_strings(fields, |s| s.trim().to_string()))
}

/// Lowercase the named string fields
pub fn lowercase_fields<I, S>(names: I) -> PreValidator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    PreValidator::infallible(format!("lowercase_fields({})", names.join(",")), move |mut fields| {
        for name in &names {
            if let Some(Value::String(s)) = fields.get_mut(name) {
                *s = s.to_lowercase();
            }
        }
        fields
    })
}

/// Fail when a named field is present as an empty (or blank) string
pub fn require_non_empty<I, S>(names: I) -> PreValidator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    PreValidator::new(format!("require_non_empty({})", names.join(",")), move |fields| {
        for name in &names {
            if let Some(Value::String(s)) = fields.get(name) {
                if s.trim().is_empty() {
                    return Err(PreValidatorError::new(format!("'{}' must not be empty", name))
                        .with_field(name.as_str()));
                }
            }
        }
        Ok(fields)
    })
}
