//! Transport-agnostic service layer
//!
//! [`Board`] implements every user, project and task operation exactly once.
//! Each operation follows the same order:
//!
//! 1. authentication (is there a caller?)
//! 2. authorization gate (may this caller do this?)
//! 3. validation of the supplied fields
//! 4. resolution of referenced logins and ids
//! 5. one atomic store write
//!
//! A failure at any step returns before the write, so a rejected request
//! never leaves partial state behind.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskboard_shared::board::{Board, BoardConfig};
//! use taskboard_shared::auth::jwt::JwtKeys;
//! use taskboard_shared::models::{Credentials, RegisterUser};
//! use taskboard_shared::store::MemoryStore;
//! use chrono::Duration;
//!
//! # async fn example() -> Result<(), taskboard_shared::error::CoreError> {
//! let keys = JwtKeys::new(
//!     "access-secret-at-least-32-bytes-long!!",
//!     "refresh-secret-at-least-32-bytes-long!",
//!     Duration::minutes(15),
//!     Duration::days(7),
//! );
//! let board = Board::new(Arc::new(MemoryStore::new()), BoardConfig::new(keys));
//!
//! board
//!     .register(RegisterUser {
//!         login: "admin".to_string(),
//!         password: "secret".to_string(),
//!         role: Some("admin".to_string()),
//!     })
//!     .await?;
//!
//! let session = board
//!     .login(Credentials {
//!         login: "admin".to_string(),
//!         password: "secret".to_string(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::auth::password::PasswordParams;
use crate::error::{CoreError, CoreResult};
use crate::models::task::DEFAULT_MAX_ATTACHMENT_BYTES;
use crate::models::{Attachment, Project, ProjectDetails, Task, TaskDetails, User, UserSummary};
use crate::store::Store;

mod accounts;
mod projects;
mod tasks;

pub use accounts::{RefreshedSession, Session};

/// Settings the service needs besides a store
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub jwt: JwtKeys,
    pub password: PasswordParams,
    pub max_attachment_bytes: usize,
}

impl BoardConfig {
    /// Config with default password cost and attachment limit
    pub fn new(jwt: JwtKeys) -> Self {
        Self {
            jwt,
            password: PasswordParams::default(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

/// The Taskboard service
pub struct Board {
    store: Arc<dyn Store>,
    config: BoardConfig,
}

impl Board {
    pub fn new(store: Arc<dyn Store>, config: BoardConfig) -> Self {
        Self { store, config }
    }

    pub fn jwt(&self) -> &JwtKeys {
        &self.config.jwt
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Checks that the backing store is reachable
    pub async fn health(&self) -> CoreResult<()> {
        self.store.health_check().await
    }

    fn check_attachments(&self, attachments: &[Attachment]) -> CoreResult<()> {
        attachments
            .iter()
            .try_for_each(|a| a.check(self.config.max_attachment_bytes))
    }

    /// Resolves logins to user ids in input order
    ///
    /// Logins are trimmed and deduplicated. Fails with one `NotFound` naming
    /// every login that does not exist.
    async fn resolve_logins(&self, logins: &[String]) -> CoreResult<Vec<Uuid>> {
        let mut wanted: Vec<String> = Vec::with_capacity(logins.len());
        for login in logins {
            let login = login.trim();
            if login.is_empty() {
                return Err(CoreError::validation("Member login must not be empty"));
            }
            if !wanted.iter().any(|w| w == login) {
                wanted.push(login.to_string());
            }
        }
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<String, Uuid> = self
            .store
            .find_users_by_logins(&wanted)
            .await?
            .into_iter()
            .map(|u| (u.login, u.id))
            .collect();

        let missing: Vec<&str> = wanted
            .iter()
            .filter(|login| !found.contains_key(*login))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::not_found(format!(
                "Users not found: {}",
                missing.join(", ")
            )));
        }

        Ok(wanted.iter().filter_map(|login| found.get(login).copied()).collect())
    }

    /// Resolves a single owner login
    async fn resolve_owner(&self, login: &str) -> CoreResult<User> {
        let login = login.trim();
        if login.is_empty() {
            return Err(CoreError::validation("Task owner login is required"));
        }

        self.store
            .find_user_by_login(login)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("User not found: {}", login)))
    }

    async fn summaries(&self, ids: &[Uuid]) -> CoreResult<HashMap<Uuid, UserSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .store
            .find_users_by_ids(ids)
            .await?
            .iter()
            .map(|u| (u.id, u.summary()))
            .collect())
    }

    async fn project_details(&self, projects: Vec<Project>) -> CoreResult<Vec<ProjectDetails>> {
        let mut ids: Vec<Uuid> = projects
            .iter()
            .flat_map(|p| p.members.iter().copied())
            .collect();
        ids.sort();
        ids.dedup();
        let users = self.summaries(&ids).await?;

        Ok(projects
            .into_iter()
            .map(|p| ProjectDetails {
                users: p.members.iter().filter_map(|id| users.get(id).cloned()).collect(),
                id: p.id,
                name: p.name,
                description: p.description,
                created_at: p.created_at,
                updated_at: p.updated_at,
            })
            .collect())
    }

    async fn task_details(&self, tasks: Vec<Task>) -> CoreResult<Vec<TaskDetails>> {
        let mut ids: Vec<Uuid> = tasks.iter().map(|t| t.user_id).collect();
        ids.sort();
        ids.dedup();
        let users = self.summaries(&ids).await?;

        tasks
            .into_iter()
            .map(|task| {
                let owner = users.get(&task.user_id).cloned().ok_or_else(|| {
                    CoreError::internal(format!("Owner {} of task {} is missing", task.user_id, task.id))
                })?;
                Ok(TaskDetails::new(task, owner))
            })
            .collect()
    }

    async fn one_project(&self, project: Project) -> CoreResult<ProjectDetails> {
        self.project_details(vec![project])
            .await?
            .pop()
            .ok_or_else(|| CoreError::internal("Project details went missing"))
    }

    async fn one_task(&self, task: Task) -> CoreResult<TaskDetails> {
        self.task_details(vec![task])
            .await?
            .pop()
            .ok_or_else(|| CoreError::internal("Task details went missing"))
    }
}

/// Parses a caller-supplied id; a malformed id cannot exist
fn parse_id(raw: &str, entity: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| CoreError::not_found(format!("{} not found", entity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Task").unwrap(), id);
        assert_eq!(
            parse_id("not-a-uuid", "Task"),
            Err(CoreError::NotFound("Task not found".to_string()))
        );
    }
}
