/// Task model
///
/// A task belongs to exactly one project and is owned by exactly one user.
/// `tasks.user_id` is the authoritative side of ownership; the owner's task
/// set is derived from it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     user_id UUID NOT NULL REFERENCES users(id),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::str::FromStr;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;
use crate::error::{CoreError, CoreResult};

/// Default upper bound for a single attachment (5 MiB)
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(CoreError::validation(format!(
                "Invalid status '{}': expected todo, in_progress or done",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File attached to a task, carried inline as base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_data: String,
    pub mime_type: String,
    pub file_size: u64,
}

impl Attachment {
    /// Checks names, payload encoding and declared size
    ///
    /// `file_size` must equal the decoded length of `file_data` and may not
    /// exceed `max_bytes`.
    pub fn check(&self, max_bytes: usize) -> CoreResult<()> {
        if self.file_name.trim().is_empty() {
            return Err(CoreError::validation("Attachment fileName is required"));
        }
        if self.mime_type.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "Attachment '{}' has no mimeType",
                self.file_name
            )));
        }

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(self.file_data.as_bytes())
            .map_err(|_| {
                CoreError::validation(format!(
                    "Attachment '{}' is not valid base64",
                    self.file_name
                ))
            })?;

        if decoded.len() > max_bytes {
            return Err(CoreError::validation(format!(
                "Attachment '{}' exceeds the {} byte limit",
                self.file_name, max_bytes
            )));
        }
        if decoded.len() as u64 != self.file_size {
            return Err(CoreError::validation(format!(
                "Attachment '{}' declares {} bytes but contains {}",
                self.file_name,
                self.file_size,
                decoded.len()
            )));
        }

        Ok(())
    }
}

/// Stored task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task with its owner summary, as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub user: UserSummary,
    pub project_id: Uuid,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskDetails {
    pub fn new(task: Task, user: UserSummary) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            user,
            project_id: task.project_id,
            attachments: task.attachments,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Input for creating a task
///
/// `user` is the owner's login; `status` is parsed and defaults to `todo`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    #[serde(default)]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

/// Partial update of a task
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    #[serde(default)]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    /// New owner login
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

/// Field of a task that a patch can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Owner,
    Status,
    Project,
    Attachments,
}

impl TaskField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Owner => "user",
            TaskField::Status => "status",
            TaskField::Project => "projectId",
            TaskField::Attachments => "attachments",
        }
    }
}

impl TaskPatch {
    /// Fields present in the patch
    pub fn fields(&self) -> Vec<TaskField> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push(TaskField::Title);
        }
        if self.description.is_some() {
            fields.push(TaskField::Description);
        }
        if self.user.is_some() {
            fields.push(TaskField::Owner);
        }
        if self.status.is_some() {
            fields.push(TaskField::Status);
        }
        if self.project_id.is_some() {
            fields.push(TaskField::Project);
        }
        if self.attachments.is_some() {
            fields.push(TaskField::Attachments);
        }
        fields
    }
}

/// Resolved task changes handed to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub attachments: Option<Vec<Attachment>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.user_id.is_none()
            && self.project_id.is_none()
            && self.attachments.is_none()
    }
}

/// Caller-supplied task list filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Resolved task query handed to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub user_id: Option<Uuid>,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id.map_or(true, |id| task.project_id == id)
            && self.status.map_or(true, |status| task.status == status)
            && self.user_id.map_or(true, |id| task.user_id == id)
    }
}
