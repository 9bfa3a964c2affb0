/// Project endpoints
///
/// # Endpoints
///
/// - `GET /api/projects` - Projects visible to the caller
/// - `GET /api/projects/:id` - One project
/// - `POST /api/projects` - Create (admin)
/// - `PUT /api/projects/:id` - Partial update, `users` replaces the member logins (admin)
/// - `DELETE /api/projects/:id` - Delete with its tasks (admin)
use axum::{extract::State, http::StatusCode, Extension, Json};
use taskboard_shared::auth::authorization::require_admin;
use taskboard_shared::auth::middleware::Caller;
use taskboard_shared::models::{NewProject, ProjectDetails, ProjectPatch};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{gated, ApiJson, ApiPath},
};

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<ProjectDetails>>> {
    Ok(Json(state.board.list_projects(&caller).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<ProjectDetails>> {
    Ok(Json(state.board.get_project(&caller, &id).await?))
}

/// Create a project
///
/// ```text
/// POST /api/projects
///
/// { "name": "Website", "description": "...", "users": ["ivan", "maria"] }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `400 Bad Request`: Missing name
/// - `404 Not Found`: Unknown member logins (all of them are named)
pub async fn create_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<ApiJson<NewProject>, ApiError>,
) -> ApiResult<(StatusCode, Json<ProjectDetails>)> {
    let req = gated(require_admin(&caller), body)?;
    let project = state.board.create_project(&caller, req).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
    body: Result<ApiJson<ProjectPatch>, ApiError>,
) -> ApiResult<Json<ProjectDetails>> {
    let req = gated(require_admin(&caller), body)?;
    Ok(Json(state.board.update_project(&caller, &id, req).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.board.delete_project(&caller, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
