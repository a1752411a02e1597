//! Minimal schema capability used by the unit tests of this crate

use crate::schema::{ExtraFields, Fallback, FieldFailure, Schema, SchemaOptions, SchemaOutcome};
use crate::types::FieldMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Int,
    Str,
}

#[derive(Debug)]
struct StubField {
    name: String,
    kind: Kind,
    required: bool,
    default: Option<Value>,
    fallback: Option<Fallback>,
}

/// Declares `int` and `str` fields with pydantic-style failure tags
#[derive(Debug)]
pub struct StubSchema {
    id: String,
    fields: Vec<StubField>,
    calls: AtomicUsize,
}

impl StubSchema {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fields: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn int(self, name: &str, required: bool) -> Self {
        self.field(name, Kind::Int, required)
    }

    pub fn str(self, name: &str, required: bool) -> Self {
        self.field(name, Kind::Str, required)
    }

    pub fn with_default(mut self, name: &str, value: Value) -> Self {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.default = Some(value);
        }
        self
    }

    pub fn with_fallback(mut self, name: &str, fallback: Fallback) -> Self {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.fallback = Some(fallback);
        }
        self
    }

    /// Number of times `validate` ran
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn field(mut self, name: &str, kind: Kind, required: bool) -> Self {
        self.fields.push(StubField {
            name: name.to_string(),
            kind,
            required,
            default: None,
            fallback: None,
        });
        self
    }
}

impl Schema for StubSchema {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_known_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.name == field)
    }

    fn validate(&self, fields: &FieldMap, options: SchemaOptions) -> SchemaOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut out = FieldMap::new();
        let mut failures = Vec::new();

        for spec in &self.fields {
            match fields.get(&spec.name) {
                None => {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.clone(), default.clone());
                    } else if spec.required {
                        failures.push(FieldFailure::new(&spec.name, "field required", "value_error.missing"));
                    }
                }
                Some(value) => match (spec.kind, value) {
                    (Kind::Int, Value::Number(n)) if n.is_i64() => {
                        out.insert(spec.name.clone(), value.clone());
                    }
                    (Kind::Int, Value::String(s)) if options.coerce && s.trim().parse::<i64>().is_ok() => {
                        let parsed = s.trim().parse::<i64>().unwrap_or_default();
                        out.insert(spec.name.clone(), Value::from(parsed));
                    }
                    (Kind::Int, _) => failures.push(FieldFailure::new(
                        &spec.name,
                        "value is not a valid integer",
                        "type_error.integer",
                    )),
                    (Kind::Str, Value::String(_)) => {
                        out.insert(spec.name.clone(), value.clone());
                    }
                    (Kind::Str, Value::Number(n)) if options.coerce => {
                        out.insert(spec.name.clone(), Value::String(n.to_string()));
                    }
                    (Kind::Str, _) => failures.push(FieldFailure::new(&spec.name, "str type expected", "type_error.str")),
                },
            }
        }

        if options.extra == ExtraFields::Forbid {
            for name in fields.keys().filter(|k| !self.is_known_field(k)) {
                failures.push(FieldFailure::new(name, "extra fields not permitted", "value_error.extra"));
            }
        }

        if failures.is_empty() {
            Ok(Value::Object(out))
        } else {
            Err(failures)
        }
    }

    fn fallback(&self, field: &str) -> Option<Fallback> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .and_then(|f| f.fallback.clone())
    }
}
