/// User listing
///
/// `GET /api/users` returns every user without credentials:
///
/// ```json
/// { "users": [{ "id": "uuid", "login": "ivan", "role": "user", "projects": [], "tasks": [] }] }
/// ```
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::middleware::Caller;
use taskboard_shared::models::UserProfile;

use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserProfile>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<UsersResponse>> {
    let users = state.board.list_users(&caller).await?;

    Ok(Json(UsersResponse { users }))
}
