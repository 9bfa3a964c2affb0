/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; domain errors from the
/// `Board` service convert automatically via `?`.
///
/// Every error body has the same shape:
///
/// ```json
/// { "error": "not_found", "message": "Project not found" }
/// ```
///
/// Expired tokens additionally carry `"expired": true`.
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::middleware::AuthError;
use taskboard_shared::error::CoreError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Error raised by the service layer
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed JSON body, path or query string (400)
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Present and true only for expired tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Unauthenticated(_) | CoreError::TokenExpired => {
                    StatusCode::UNAUTHORIZED
                }
                CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::BadRequest(message) => ErrorResponse {
                error: "bad_request".to_string(),
                message,
                expired: None,
            },
            ApiError::Core(CoreError::Internal(msg)) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "An internal error occurred".to_string(),
                    expired: None,
                }
            }
            ApiError::Core(err) => ErrorResponse {
                error: err.code().to_string(),
                message: err.to_string(),
                expired: matches!(err, CoreError::TokenExpired).then_some(true),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Core(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
