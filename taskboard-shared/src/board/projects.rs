//! Project operations

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{parse_id, Board};
use crate::auth::authorization::{require_admin, require_authenticated, require_project_read};
use crate::auth::middleware::Caller;
use crate::error::{CoreError, CoreResult};
use crate::models::{
    required_text, NewProject, Project, ProjectChanges, ProjectDetails, ProjectPatch,
};

impl Board {
    /// Projects visible to the caller
    ///
    /// Admins see every project, users only those they are a member of.
    pub async fn list_projects(&self, caller: &Caller) -> CoreResult<Vec<ProjectDetails>> {
        let ctx = require_authenticated(caller)?;

        let member = if ctx.is_admin() {
            None
        } else {
            Some(ctx.user_id)
        };
        let projects = self.store.list_projects(member).await?;

        self.project_details(projects).await
    }

    pub async fn get_project(&self, caller: &Caller, id: &str) -> CoreResult<ProjectDetails> {
        let ctx = require_authenticated(caller)?;
        let id = parse_id(id, "Project")?;

        let project = self
            .store
            .find_project(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;
        require_project_read(ctx, &project)?;

        self.one_project(project).await
    }

    /// Creates a project with the given member logins
    ///
    /// # Errors
    ///
    /// - `Forbidden` for non-admins
    /// - `Validation` for a blank or oversized name
    /// - `NotFound` naming every member login that does not exist
    pub async fn create_project(
        &self,
        caller: &Caller,
        input: NewProject,
    ) -> CoreResult<ProjectDetails> {
        require_admin(caller)?;

        input.validate()?;
        let name = required_text(&input.name, "Name")?;

        let members = match &input.users {
            Some(logins) => self.resolve_logins(logins).await?,
            None => Vec::new(),
        };

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name,
            description: input.description.unwrap_or_default(),
            members,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_project(&project).await?;

        info!(project_id = %project.id, members = project.members.len(), "Project created");
        self.one_project(project).await
    }

    /// Updates project fields and, if `users` is present, replaces the member set
    pub async fn update_project(
        &self,
        caller: &Caller,
        id: &str,
        patch: ProjectPatch,
    ) -> CoreResult<ProjectDetails> {
        require_admin(caller)?;
        let id = parse_id(id, "Project")?;

        patch.validate()?;
        let name = patch
            .name
            .as_deref()
            .map(|name| required_text(name, "Name"))
            .transpose()?;

        let existing = self
            .store
            .find_project(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;

        let members = match &patch.users {
            Some(logins) => Some(self.resolve_logins(logins).await?),
            None => None,
        };

        let changes = ProjectChanges {
            name,
            description: patch.description,
            members,
        };
        if changes.is_empty() {
            return self.one_project(existing).await;
        }

        let project = self
            .store
            .update_project(id, &changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;

        info!(project_id = %id, "Project updated");
        self.one_project(project).await
    }

    /// Deletes a project together with its tasks and memberships
    pub async fn delete_project(&self, caller: &Caller, id: &str) -> CoreResult<()> {
        require_admin(caller)?;
        let id = parse_id(id, "Project")?;

        let deleted = self
            .store
            .delete_project(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;

        info!(
            project_id = %id,
            tasks_deleted = deleted.task_ids.len(),
            members_detached = deleted.member_ids.len(),
            "Project deleted"
        );
        Ok(())
    }
}
