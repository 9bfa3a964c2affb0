//! In-memory store
//!
//! Keeps every collection behind one `tokio::sync::RwLock`, so each trait
//! method is a single critical section. Referential checks that Postgres
//! enforces with foreign keys are repeated here under the same lock.
//! Used by tests and by `STORAGE=memory` for local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DeletedProject, Store};
use crate::error::{CoreError, CoreResult};
use crate::models::{Project, ProjectChanges, Task, TaskChanges, TaskQuery, User, UserLinks};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

impl MemoryState {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn project_exists(&self, id: Uuid) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn ensure_users(&self, ids: &[Uuid]) -> CoreResult<()> {
        match ids.iter().find(|id| !self.user_exists(**id)) {
            Some(id) => Err(CoreError::not_found(format!("User {} no longer exists", id))),
            None => Ok(()),
        }
    }
}

/// In-memory implementation of [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.login == user.login) {
            return Err(CoreError::Conflict(
                "User with this login already exists".to_string(),
            ));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> CoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.login == login).cloned())
    }

    async fn find_users_by_logins(&self, logins: &[String]) -> CoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| logins.contains(&u.login))
            .cloned()
            .collect())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        Ok(self.state.read().await.users.clone())
    }

    async fn links_for_users(&self, ids: &[Uuid]) -> CoreResult<HashMap<Uuid, UserLinks>> {
        let state = self.state.read().await;
        let mut links: HashMap<Uuid, UserLinks> =
            ids.iter().map(|id| (*id, UserLinks::default())).collect();

        for project in &state.projects {
            for member in &project.members {
                if let Some(entry) = links.get_mut(member) {
                    entry.projects.push(project.id);
                }
            }
        }
        for task in &state.tasks {
            if let Some(entry) = links.get_mut(&task.user_id) {
                entry.tasks.push(task.id);
            }
        }

        Ok(links)
    }

    async fn insert_project(&self, project: &Project) -> CoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_users(&project.members)?;
        state.projects.push(project.clone());
        Ok(())
    }

    async fn find_project(&self, id: Uuid) -> CoreResult<Option<Project>> {
        let state = self.state.read().await;
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&self, member: Option<Uuid>) -> CoreResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .filter(|p| member.map_or(true, |user_id| p.has_member(user_id)))
            .cloned()
            .collect())
    }

    async fn update_project(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> CoreResult<Option<Project>> {
        let mut state = self.state.write().await;
        if let Some(members) = &changes.members {
            state.ensure_users(members)?;
        }

        let Some(project) = state.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            project.name = name.clone();
        }
        if let Some(description) = &changes.description {
            project.description = description.clone();
        }
        if let Some(members) = &changes.members {
            // Surviving members keep their position, new ones are appended.
            project.members.retain(|m| members.contains(m));
            for member in members {
                if !project.members.contains(member) {
                    project.members.push(*member);
                }
            }
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> CoreResult<Option<DeletedProject>> {
        let mut state = self.state.write().await;
        let Some(index) = state.projects.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let project = state.projects.remove(index);
        let task_ids = state
            .tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        state.tasks.retain(|t| t.project_id != id);

        Ok(Some(DeletedProject {
            task_ids,
            member_ids: project.members,
        }))
    }

    async fn insert_task(&self, task: &Task) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if !state.user_exists(task.user_id) {
            return Err(CoreError::not_found("Task owner no longer exists"));
        }
        if !state.project_exists(task.project_id) {
            return Err(CoreError::not_found("Project no longer exists"));
        }
        state.tasks.push(task.clone());
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> CoreResult<Option<Task>> {
        let state = self.state.read().await;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> CoreResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> CoreResult<Option<Task>> {
        let mut state = self.state.write().await;
        if let Some(user_id) = changes.user_id {
            if !state.user_exists(user_id) {
                return Err(CoreError::not_found("Task owner no longer exists"));
            }
        }
        if let Some(project_id) = changes.project_id {
            if !state.project_exists(project_id) {
                return Err(CoreError::not_found("Project no longer exists"));
            }
        }

        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(description) = &changes.description {
            task.description = description.clone();
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(user_id) = changes.user_id {
            task.user_id = user_id;
        }
        if let Some(project_id) = changes.project_id {
            task.project_id = project_id;
        }
        if let Some(attachments) = &changes.attachments {
            task.attachments = attachments.clone();
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> CoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        Ok(state.tasks.len() != before)
    }
}
