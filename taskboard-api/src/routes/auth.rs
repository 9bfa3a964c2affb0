/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Refresh access token
/// - `GET /api/auth/me` - Current user (bearer)
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::middleware::Caller;
use taskboard_shared::board::{RefreshedSession, Session};
use taskboard_shared::models::{Credentials, RegisterUser, UserProfile};

use crate::{app::AppState, error::ApiResult, extract::ApiJson};

/// Wrapper for a single user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "login": "ivan", "password": "pw1", "role": "user" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Login already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterUser>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state.board.register(req).await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Login with login and password
///
/// # Response
///
/// ```json
/// { "accessToken": "eyJ...", "refreshToken": "eyJ...", "user": { ... } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing login or password
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Credentials>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.board.login(req).await?))
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid refresh token, or `token_expired`
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshedSession>> {
    Ok(Json(state.board.refresh(&req.refresh_token).await?))
}

/// The authenticated user with project and task ids
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.board.me(&caller).await?;

    Ok(Json(UserResponse { user }))
}
