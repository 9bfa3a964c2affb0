/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks?projectId=&status=` - Tasks visible to the caller
/// - `GET /api/tasks/:id` - One task
/// - `POST /api/tasks` - Create (admin)
/// - `PUT /api/tasks/:id` - Partial update; the owner may change `status` and `attachments`
/// - `DELETE /api/tasks/:id` - Delete (admin)
use axum::{extract::State, http::StatusCode, Extension, Json};
use taskboard_shared::auth::authorization::{require_admin, require_authenticated};
use taskboard_shared::auth::middleware::Caller;
use taskboard_shared::models::{NewTask, TaskDetails, TaskFilter, TaskPatch};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{gated, ApiJson, ApiPath, ApiQuery},
};

/// List tasks
///
/// Admins see every task; other users see only tasks assigned to them.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown `status` or malformed `projectId`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<Json<Vec<TaskDetails>>> {
    Ok(Json(state.board.list_tasks(&caller, filter).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<TaskDetails>> {
    Ok(Json(state.board.get_task(&caller, &id).await?))
}

/// Create a task
///
/// ```text
/// POST /api/tasks
///
/// { "title": "Design", "user": "ivan", "projectId": "uuid", "status": "todo" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `400 Bad Request`: Missing title, unknown status or invalid attachment
/// - `404 Not Found`: Unknown project or owner login
pub async fn create_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<ApiJson<NewTask>, ApiError>,
) -> ApiResult<(StatusCode, Json<TaskDetails>)> {
    let req = gated(require_admin(&caller), body)?;
    let task = state.board.create_task(&caller, req).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
///
/// Reassign by sending the new owner's login as `user` (admin only).
pub async fn update_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
    body: Result<ApiJson<TaskPatch>, ApiError>,
) -> ApiResult<Json<TaskDetails>> {
    let req = gated(require_authenticated(&caller), body)?;
    Ok(Json(state.board.update_task(&caller, &id, req).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.board.delete_task(&caller, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
