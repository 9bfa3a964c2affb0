//! Data-access seam
//!
//! [`Store`] is the only way the `Board` touches persistent state. Each
//! method is one atomic unit: implementations apply every relationship
//! change inside a single SQL transaction ([`PgStore`]) or a single write
//! lock ([`MemoryStore`]), so no reader can observe a half-applied update.
//!
//! The user side of both relationships (a user's projects and tasks) is not
//! stored; [`Store::links_for_users`] derives it from membership rows and
//! task owners.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{Project, ProjectChanges, Task, TaskChanges, TaskQuery, User, UserLinks};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// What a project deletion removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedProject {
    pub task_ids: Vec<Uuid>,
    pub member_ids: Vec<Uuid>,
}

/// Abstract interface for all persistence operations
///
/// Lists are returned in creation order.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn health_check(&self) -> CoreResult<()>;

    // ========================================================================
    // Users
    // ========================================================================

    /// Inserts a user; a duplicate login fails with `Conflict`
    async fn insert_user(&self, user: &User) -> CoreResult<()>;

    async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn find_user_by_login(&self, login: &str) -> CoreResult<Option<User>>;

    /// Users whose login is in `logins`; missing logins are simply absent
    async fn find_users_by_logins(&self, logins: &[String]) -> CoreResult<Vec<User>>;

    /// Users whose id is in `ids`; missing ids are simply absent
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<User>>;

    async fn list_users(&self) -> CoreResult<Vec<User>>;

    /// Derived project and task ids for each requested user
    ///
    /// Every requested id is present in the result, with empty links if the
    /// user has none.
    async fn links_for_users(&self, ids: &[Uuid]) -> CoreResult<HashMap<Uuid, UserLinks>>;

    // ========================================================================
    // Projects
    // ========================================================================

    /// Inserts a project together with its membership rows
    ///
    /// Fails with `NotFound` if a member no longer exists.
    async fn insert_project(&self, project: &Project) -> CoreResult<()>;

    async fn find_project(&self, id: Uuid) -> CoreResult<Option<Project>>;

    /// All projects, or only those `member` belongs to
    async fn list_projects(&self, member: Option<Uuid>) -> CoreResult<Vec<Project>>;

    /// Applies field changes and, if given, replaces the membership set
    ///
    /// Returns `None` if the project does not exist.
    async fn update_project(&self, id: Uuid, changes: &ProjectChanges)
        -> CoreResult<Option<Project>>;

    /// Deletes a project, its tasks and its membership rows
    ///
    /// Returns `None` if the project does not exist.
    async fn delete_project(&self, id: Uuid) -> CoreResult<Option<DeletedProject>>;

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Inserts a task
    ///
    /// Fails with `NotFound` if the owner or project no longer exists.
    async fn insert_task(&self, task: &Task) -> CoreResult<()>;

    async fn find_task(&self, id: Uuid) -> CoreResult<Option<Task>>;

    async fn list_tasks(&self, query: &TaskQuery) -> CoreResult<Vec<Task>>;

    /// Applies field changes, returning `None` if the task does not exist
    async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> CoreResult<Option<Task>>;

    /// Deletes a task, returning whether it existed
    async fn delete_task(&self, id: Uuid) -> CoreResult<bool>;
}
