//! The `Validated<T>` extractor
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::extract::{AxumAdapter, CapturedRequest, DEFAULT_BODY_LIMIT};
use crate::rejection::GatewayRejection;
use crate::route::ValidatedRoute;
use axum::async_trait;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequest, FromRequestParts, RawPathParams, Request};
use axum::http::request::Parts;
use http_body_util::LengthLimitError;
use reqgate_core::{FrameworkAdapter, GatewayValidationError, RawInput, ValidationResult};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use tracing::{debug, warn};

/// Request input that passed the route's validation pipeline
///
/// Use it in place of `Json<T>`. Path parameters, query string, form body
/// and JSON body are merged, validated against the route's
/// [`ValidatedRoute`] and deserialized into `T`. Any failure is answered
/// with the gateway error wire shape.
///
/// # Example
///
/// ```rust,no_run
/// use axum::{routing::post, Json, Router};
/// use reqgate_axum::{Validated, ValidatedRoute};
/// use reqgate_core::{EndpointConfig, IdempotencyCache, ValidatorPipeline};
/// use reqgate_schemas::{Field, FieldSchema, FieldType};
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Deserialize, Serialize)]
/// struct Signup {
///     username: String,
///     age: i64,
/// }
///
/// async fn signup(Validated(user): Validated<Signup>) -> Json<Signup> {
///     Json(user)
/// }
///
/// let schema = FieldSchema::new("signup")
///     .field(Field::required("username", FieldType::Str))
///     .field(Field::required("age", FieldType::Int));
/// let endpoint = EndpointConfig::builder(Arc::new(schema)).build().unwrap();
/// let pipeline = Arc::new(ValidatorPipeline::new(Arc::new(IdempotencyCache::new())));
///
/// let app: Router = Router::new()
///     .route("/signup", post(signup))
///     .layer(ValidatedRoute::new(pipeline, endpoint).layer());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GatewayRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let Some(route) = parts.extensions.get::<ValidatedRoute>().cloned() else {
            warn!(uri = %parts.uri, "validated extractor used on a route without a ValidatedRoute");
            return Err(GatewayRejection::misconfigured());
        };

        let path = path_params(&mut parts, state).await?;
        let body = axum::body::to_bytes(body, DEFAULT_BODY_LIMIT)
            .await
            .map_err(|err| {
                if exceeds_limit(&err) {
                    debug!(limit = DEFAULT_BODY_LIMIT, "request body too large");
                    return GatewayRejection::payload_too_large(DEFAULT_BODY_LIMIT);
                }
                GatewayValidationError::malformed_request(format!(
                    "failed to read request body: {}",
                    err
                ))
                .into()
            })?;

        let input = AxumAdapter.extract(CapturedRequest { parts, path, body })?;
        let value = run_pipeline(route.clone(), input)
            .await
            .into_result()
            .map_err(|error| {
                debug!(endpoint = route.endpoint().name(), code = error.code(), "request rejected");
                GatewayRejection::from(error)
            })?;

        serde_json::from_value(value)
            .map(Validated)
            .map_err(GatewayRejection::deserialize)
    }
}

/// Run the route's pipeline without stalling the async worker
///
/// With single-flight enabled a duplicate request waits on a blocking lock,
/// so the call is moved to the blocking pool.
async fn run_pipeline(route: ValidatedRoute, input: RawInput) -> ValidationResult {
    let config = route.pipeline().cache().config();
    let single_flight = config.enabled && config.single_flight;
    if !single_flight {
        return route.pipeline().validate(input, route.endpoint());
    }

    tokio::task::spawn_blocking(move || route.pipeline().validate(input, route.endpoint()))
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "validation task did not complete");
            ValidationResult::Failure(GatewayValidationError::internal(format!(
                "validation task failed: {}",
                err
            )))
        })
}

/// True when reading the body stopped at the buffering limit
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

/// Captured path parameters; a route without parameters yields none
async fn path_params<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
) -> Result<Vec<(String, String)>, GatewayRejection> {
    match RawPathParams::from_request_parts(parts, state).await {
        Ok(params) => Ok(params
            .iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect()),
        Err(RawPathParamsRejection::MissingPathParams(_)) => Ok(Vec::new()),
        Err(rejection) => Err(GatewayValidationError::malformed_request(rejection.body_text()).into()),
    }
}
