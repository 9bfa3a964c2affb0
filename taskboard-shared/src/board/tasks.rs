//! Task operations

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{parse_id, Board};
use crate::auth::authorization::{
    require_admin, require_authenticated, require_task_read, require_task_update,
};
use crate::auth::middleware::Caller;
use crate::error::{CoreError, CoreResult};
use crate::models::{
    required_text, NewTask, Task, TaskChanges, TaskDetails, TaskFilter, TaskPatch, TaskQuery,
    TaskStatus,
};

impl Board {
    /// Tasks visible to the caller, optionally filtered
    ///
    /// A non-admin's list is always restricted to their own tasks.
    pub async fn list_tasks(
        &self,
        caller: &Caller,
        filter: TaskFilter,
    ) -> CoreResult<Vec<TaskDetails>> {
        let ctx = require_authenticated(caller)?;

        let project_id = filter
            .project_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                Uuid::parse_str(raw.trim())
                    .map_err(|_| CoreError::validation(format!("Invalid projectId '{}'", raw)))
            })
            .transpose()?;
        let status = filter
            .status
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.trim().parse::<TaskStatus>())
            .transpose()?;

        let query = TaskQuery {
            project_id,
            status,
            user_id: if ctx.is_admin() {
                None
            } else {
                Some(ctx.user_id)
            },
        };
        let tasks = self.store.list_tasks(&query).await?;

        self.task_details(tasks).await
    }

    pub async fn get_task(&self, caller: &Caller, id: &str) -> CoreResult<TaskDetails> {
        let ctx = require_authenticated(caller)?;
        let id = parse_id(id, "Task")?;

        let task = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Task not found"))?;
        require_task_read(ctx, &task)?;

        self.one_task(task).await
    }

    /// Creates a task owned by the user with login `input.user`
    ///
    /// # Errors
    ///
    /// - `Forbidden` for non-admins
    /// - `Validation` for a blank title, unknown status or bad attachment
    /// - `NotFound` if the project or owner login does not exist
    pub async fn create_task(&self, caller: &Caller, input: NewTask) -> CoreResult<TaskDetails> {
        require_admin(caller)?;

        input.validate()?;
        let title = required_text(&input.title, "Title")?;
        let status = match input.status.as_deref() {
            Some(raw) => raw.trim().parse::<TaskStatus>()?,
            None => TaskStatus::default(),
        };
        let attachments = input.attachments.unwrap_or_default();
        self.check_attachments(&attachments)?;
        let owner_login = required_text(&input.user, "Task owner login")?;
        let raw_project_id = required_text(&input.project_id, "projectId")?;

        let project_id = parse_id(&raw_project_id, "Project")?;
        if self.store.find_project(project_id).await?.is_none() {
            return Err(CoreError::not_found("Project not found"));
        }
        let owner = self.resolve_owner(&owner_login).await?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title,
            description: input.description.unwrap_or_default(),
            status,
            user_id: owner.id,
            project_id,
            attachments,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_task(&task).await?;

        info!(task_id = %task.id, project_id = %project_id, owner_id = %owner.id, "Task created");
        Ok(TaskDetails::new(task, owner.summary()))
    }

    /// Applies a partial update
    ///
    /// Admins may change any field, including the owner (by login) and the
    /// project. The owner may change only `status` and `attachments`.
    pub async fn update_task(
        &self,
        caller: &Caller,
        id: &str,
        patch: TaskPatch,
    ) -> CoreResult<TaskDetails> {
        let ctx = require_authenticated(caller)?;
        let id = parse_id(id, "Task")?;

        let existing = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Task not found"))?;
        require_task_update(ctx, &existing, &patch.fields())?;

        patch.validate()?;
        let title = patch
            .title
            .as_deref()
            .map(|title| required_text(title, "Title"))
            .transpose()?;
        let status = patch
            .status
            .as_deref()
            .map(|raw| raw.trim().parse::<TaskStatus>())
            .transpose()?;
        if let Some(attachments) = &patch.attachments {
            self.check_attachments(attachments)?;
        }

        let project_id = match patch.project_id.as_deref() {
            Some(raw) => {
                let project_id = parse_id(raw, "Project")?;
                if self.store.find_project(project_id).await?.is_none() {
                    return Err(CoreError::not_found("Project not found"));
                }
                Some(project_id)
            }
            None => None,
        };
        let user_id = match patch.user.as_deref() {
            Some(login) => Some(self.resolve_owner(login).await?.id),
            None => None,
        };

        let changes = TaskChanges {
            title,
            description: patch.description,
            status,
            user_id,
            project_id,
            attachments: patch.attachments,
        };
        if changes.is_empty() {
            return self.one_task(existing).await;
        }

        let task = self
            .store
            .update_task(id, &changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Task not found"))?;

        if task.user_id != existing.user_id {
            info!(
                task_id = %id,
                from_user = %existing.user_id,
                to_user = %task.user_id,
                "Task reassigned"
            );
        }
        info!(task_id = %id, status = %task.status, "Task updated");
        self.one_task(task).await
    }

    pub async fn delete_task(&self, caller: &Caller, id: &str) -> CoreResult<()> {
        require_admin(caller)?;
        let id = parse_id(id, "Task")?;

        if !self.store.delete_task(id).await? {
            return Err(CoreError::not_found("Task not found"));
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }
}
