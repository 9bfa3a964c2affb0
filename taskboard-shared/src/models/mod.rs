/// Domain models for Taskboard
///
/// # Models
///
/// - `user`: Accounts, roles and the derived project/task sets
/// - `project`: Projects and their member sets
/// - `task`: Tasks, statuses and attachments
///
/// Each module also holds the input and patch types accepted by the
/// `Board` service and the resolved change sets handed to a `Store`.

pub mod project;
pub mod task;
pub mod user;

pub use project::{NewProject, Project, ProjectChanges, ProjectDetails, ProjectPatch};
pub use task::{
    Attachment, NewTask, Task, TaskChanges, TaskDetails, TaskField, TaskFilter, TaskPatch,
    TaskQuery, TaskStatus,
};
pub use user::{Credentials, RegisterUser, Role, User, UserLinks, UserProfile, UserSummary};

use crate::error::{CoreError, CoreResult};

/// Trims a required text field, rejecting blank values
pub(crate) fn required_text(value: &str, field: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
