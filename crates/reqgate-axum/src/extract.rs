//! Reading raw request fields out of an axum request
//!
//! [`AxumAdapter`] implements the core [`FrameworkAdapter`] for a request
//! that has already been split into its parts, captured path parameters and
//! buffered body. Path parameters, the query string, an urlencoded form body
//! and a JSON object body each become one [`RawInput`] source. Repeated query
//! or form keys are collected into a list of strings.
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::rejection::GatewayRejection;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqgate_core::{
    collect_pairs, FieldMap, FrameworkAdapter, GatewayValidationError, RawInput, SourceKind,
    ValidatedObject,
};
use serde_json::Value;

/// Largest body the extractor buffers, matching axum's own default
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// A request with its body read and path parameters captured
#[derive(Debug)]
pub struct CapturedRequest {
    pub parts: Parts,
    pub path: Vec<(String, String)>,
    pub body: Bytes,
}

/// How a request body is read, from its `Content-Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Unsupported,
}

impl BodyKind {
    /// Classify by media type; a body without a content type is read as JSON
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers.get(CONTENT_TYPE) else {
            return BodyKind::Json;
        };
        let Ok(content_type) = content_type.to_str() else {
            return BodyKind::Unsupported;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/x-www-form-urlencoded" {
            BodyKind::Form
        } else if essence == "application/json" || essence.ends_with("+json") {
            BodyKind::Json
        } else {
            BodyKind::Unsupported
        }
    }
}

/// Fields of an urlencoded query string or form body; repeated keys become a list
pub fn urlencoded_fields(input: &[u8]) -> FieldMap {
    collect_pairs(url::form_urlencoded::parse(input))
}

/// Fields of a JSON body; `null` carries no fields
pub fn json_fields(body: &[u8]) -> Result<Option<FieldMap>, GatewayValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        GatewayValidationError::malformed_request(format!("invalid JSON in request body: {}", err))
    })?;

    match value {
        Value::Object(fields) => Ok(Some(fields)),
        Value::Null => Ok(None),
        _ => Err(GatewayValidationError::malformed_request(
            "request body must be a JSON object",
        )),
    }
}

/// Adapter between axum requests and the validator pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct AxumAdapter;

impl AxumAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FrameworkAdapter for AxumAdapter {
    type Request = CapturedRequest;
    type Response = Response;

    fn extract(&self, request: CapturedRequest) -> Result<RawInput, GatewayValidationError> {
        let CapturedRequest { parts, path, body } = request;
        let mut input = RawInput::new();

        if !path.is_empty() {
            let fields = path
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            input.push(SourceKind::Path, fields);
        }

        if let Some(query) = parts.uri.query().filter(|q| !q.is_empty()) {
            input.push(SourceKind::Query, urlencoded_fields(query.as_bytes()));
        }

        if !body.is_empty() {
            match BodyKind::from_headers(&parts.headers) {
                BodyKind::Form => input.push(SourceKind::Form, urlencoded_fields(&body)),
                BodyKind::Json => {
                    if let Some(fields) = json_fields(&body)? {
                        input.push(SourceKind::Body, fields);
                    }
                }
                BodyKind::Unsupported => {
                    return Err(GatewayValidationError::unsupported_input(
                        "request body must be JSON or urlencoded form data",
                    ));
                }
            }
        }

        Ok(input)
    }

    fn respond_success(&self, value: ValidatedObject) -> Response {
        (StatusCode::OK, Json(value)).into_response()
    }

    fn respond_error(&self, error: GatewayValidationError) -> Response {
        GatewayRejection::from(error).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn captured(uri: &str, content_type: Option<&str>, body: &'static str) -> CapturedRequest {
        let mut builder = Request::builder().uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        CapturedRequest {
            parts,
            path: Vec::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_repeated_keys_become_lists() {
        let fields = urlencoded_fields(b"tag=a&q=x&tag=b&tag=c");
        assert_eq!(
            Value::Object(fields),
            json!({"tag": ["a", "b", "c"], "q": "x"})
        );
    }

    #[test]
    fn test_percent_decoding() {
        let fields = urlencoded_fields(b"name=J%C3%BCrgen+M");
        assert_eq!(fields["name"], json!("Jürgen M"));
    }

    #[test]
    fn test_body_kind_detection() {
        let mut headers = HeaderMap::new();
        assert_eq!(BodyKind::from_headers(&headers), BodyKind::Json);

        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert_eq!(BodyKind::from_headers(&headers), BodyKind::Json);

        headers.insert(CONTENT_TYPE, "application/problem+json".parse().unwrap());
        assert_eq!(BodyKind::from_headers(&headers), BodyKind::Json);

        headers.insert(CONTENT_TYPE, "application/x-www-form-urlencoded".parse().unwrap());
        assert_eq!(BodyKind::from_headers(&headers), BodyKind::Form);

        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert_eq!(BodyKind::from_headers(&headers), BodyKind::Unsupported);
    }

    #[test]
    fn test_json_body_shapes() {
        assert!(json_fields(b"null").unwrap().is_none());
        assert_eq!(json_fields(b"{\"a\":1}").unwrap().unwrap()["a"], json!(1));

        let err = json_fields(b"[1,2]").unwrap_err();
        assert_eq!(err.code(), "malformed_request");

        let err = json_fields(b"{not json").unwrap_err();
        assert_eq!(err.code(), "malformed_request");
    }

    #[test]
    fn test_extract_sources_in_request_order() {
        let mut request = captured("/users/7?page=2", Some("application/json"), r#"{"name":"a"}"#);
        request.path.push(("id".to_string(), "7".to_string()));

        let input = AxumAdapter.extract(request).unwrap();
        let kinds: Vec<SourceKind> = input.sources().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SourceKind::Path, SourceKind::Query, SourceKind::Body]);
    }

    #[test]
    fn test_extract_form_body() {
        let request = captured("/", Some("application/x-www-form-urlencoded"), "a=1&b=2");
        let input = AxumAdapter.extract(request).unwrap();
        assert_eq!(input.sources()[0].kind, SourceKind::Form);
        assert_eq!(input.sources()[0].fields["b"], json!("2"));
    }

    #[test]
    fn test_extract_empty_request() {
        let input = AxumAdapter.extract(captured("/", None, "")).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn test_handle_renders_status() {
        use reqgate_core::{EndpointConfig, IdempotencyCache, ValidationMode, ValidatorPipeline};
        use reqgate_schemas::{Field, FieldSchema, FieldType};
        use std::sync::Arc;

        let schema = FieldSchema::new("count").field(Field::required("n", FieldType::Int));
        let endpoint = EndpointConfig::builder(Arc::new(schema))
            .mode(ValidationMode::Lax)
            .build()
            .unwrap();
        let pipeline = ValidatorPipeline::new(Arc::new(IdempotencyCache::new()));

        let ok = AxumAdapter.handle(&pipeline, &endpoint, captured("/?n=3", None, ""));
        assert_eq!(ok.status(), StatusCode::OK);

        let rejected = AxumAdapter.handle(&pipeline, &endpoint, captured("/?n=three", None, ""));
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_extract_rejects_unsupported_body() {
        let err = AxumAdapter
            .extract(captured("/", Some("text/plain"), "hello"))
            .unwrap_err();
        assert_eq!(err.code(), "unsupported_input");
    }
}
