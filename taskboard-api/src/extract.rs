/// Request extractors that reject with `ApiError`
///
/// Axum's stock `Json`, `Query` and `Path` extractors answer malformed input
/// with plain-text bodies. These wrappers route the rejection through
/// [`ApiError`] so every failure has the same JSON shape.
use axum::extract::{FromRequest, FromRequestParts};
use taskboard_shared::auth::authorization::AuthzError;
use taskboard_shared::error::CoreError;

use crate::error::{ApiError, ApiResult};

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Unwraps a JSON body only after the caller has passed `gate`
///
/// Handlers take the body as `Result<ApiJson<T>, ApiError>` so a rejected
/// caller is answered with 401/403 even when the body is malformed.
pub fn gated<T, G>(
    gate: Result<G, AuthzError>,
    body: Result<ApiJson<T>, ApiError>,
) -> ApiResult<T> {
    gate.map_err(CoreError::from)?;
    let ApiJson(value) = body?;
    Ok(value)
}
