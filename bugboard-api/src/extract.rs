/// Request extractors with JSON error bodies
///
/// axum's own `Json` and `Path` reject with plain-text bodies. These
/// wrappers route the rejection through [`ApiError`] instead, so a malformed
/// body or query string is a `400` and an unparsable id is a `404`, all in
/// the usual error format.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
