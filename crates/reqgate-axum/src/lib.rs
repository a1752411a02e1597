//! Reqgate Axum - validated request extraction for axum
//!
//! Mount a [`ValidatedRoute`] on a route and take [`Validated<T>`] in the
//! handler. The extractor gathers path, query, form and JSON body fields,
//! runs them through the reqgate pipeline and hands the handler a typed
//! value. Failures are answered with the gateway error wire shape:
//!
//! - `422` for validation, malformed body and unsupported input errors
//! - `413` for a body over [`DEFAULT_BODY_LIMIT`] (`payload_too_large`)
//! - `500` for internal pipeline errors and for a route mounted without its
//!   [`ValidatedRoute`] (`gateway_misconfigured`)
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

pub mod extract;
pub mod rejection;
pub mod route;
pub mod validated;

pub use extract::{AxumAdapter, BodyKind, CapturedRequest, DEFAULT_BODY_LIMIT};
pub use rejection::{GatewayRejection, DESERIALIZE_ERROR_TAG, GATEWAY_MISCONFIGURED_CODE};
pub use route::ValidatedRoute;
pub use validated::Validated;
