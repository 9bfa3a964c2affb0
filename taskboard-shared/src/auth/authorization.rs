/// Authorization gate
///
/// Pure checks that decide whether a caller may perform an operation. Every
/// `Board` operation runs its gate check before validation, reference
/// resolution or any write.
///
/// # Permission Model
///
/// - **Anonymous**: only register, login and refresh
/// - **User**: list users, read member projects, read own tasks, update
///   `status` and `attachments` of own tasks
/// - **Admin**: everything, including create/update/delete of projects and
///   tasks and task reassignment
///
/// A denial is always an error, never an empty result, so callers can tell
/// "not permitted" apart from "not found".
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::require_admin;
/// use taskboard_shared::auth::middleware::{AuthContext, Caller};
/// use taskboard_shared::models::Role;
/// use uuid::Uuid;
///
/// let caller = Caller::Authenticated(AuthContext {
///     user_id: Uuid::new_v4(),
///     login: "ivan".to_string(),
///     role: Role::User,
/// });
///
/// assert!(require_admin(&caller).is_err());
/// ```

use uuid::Uuid;

use super::middleware::{AuthContext, Caller};
use crate::error::CoreError;
use crate::models::{Project, Task, TaskField};

/// Fields a non-admin owner may change on a task
pub const OWNER_EDITABLE_FIELDS: [TaskField; 2] = [TaskField::Status, TaskField::Attachments];

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No credentials were presented
    #[error("Authentication required")]
    NotAuthenticated,

    /// Operation is reserved for admins
    #[error("Admin role required")]
    AdminRequired,

    /// Caller is not a member of the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Caller does not own the task
    #[error("Not the owner of task {0}")]
    NotOwner(Uuid),

    /// Field may only be changed by an admin
    #[error("Only an admin can change task field '{0}'")]
    FieldNotEditable(&'static str),
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAuthenticated => CoreError::Unauthenticated(err.to_string()),
            other => CoreError::Forbidden(other.to_string()),
        }
    }
}

/// Requires any authenticated caller
pub fn require_authenticated(caller: &Caller) -> Result<&AuthContext, AuthzError> {
    caller.context().ok_or(AuthzError::NotAuthenticated)
}

/// Requires an authenticated admin
pub fn require_admin(caller: &Caller) -> Result<&AuthContext, AuthzError> {
    let ctx = require_authenticated(caller)?;
    if !ctx.is_admin() {
        return Err(AuthzError::AdminRequired);
    }
    Ok(ctx)
}

/// Admins read every project; users only projects they belong to
pub fn require_project_read(ctx: &AuthContext, project: &Project) -> Result<(), AuthzError> {
    if ctx.is_admin() || project.has_member(ctx.user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotMember(project.id))
    }
}

/// Admins read every task; users only tasks they own
pub fn require_task_read(ctx: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if ctx.is_admin() || task.user_id == ctx.user_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner(task.id))
    }
}

/// Checks a task patch touching `fields` against the caller
///
/// Admins may change any field. Owners may change only
/// [`OWNER_EDITABLE_FIELDS`]; anyone else is denied outright.
pub fn require_task_update(
    ctx: &AuthContext,
    task: &Task,
    fields: &[TaskField],
) -> Result<(), AuthzError> {
    if ctx.is_admin() {
        return Ok(());
    }

    if task.user_id != ctx.user_id {
        return Err(AuthzError::NotOwner(task.id));
    }

    match fields
        .iter()
        .find(|field| !OWNER_EDITABLE_FIELDS.contains(*field))
    {
        Some(field) => Err(AuthzError::FieldNotEditable(field.as_str())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TaskStatus};
    use chrono::Utc;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            login: "someone".to_string(),
            role,
        }
    }

    fn project_with(members: Vec<Uuid>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "Website".to_string(),
            description: String::new(),
            members,
            created_at: now,
            updated_at: now,
        }
    }

    fn task_owned_by(user_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Fix header".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            user_id,
            project_id: Uuid::new_v4(),
            attachments: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        assert_eq!(
            require_authenticated(&Caller::Anonymous),
            Err(AuthzError::NotAuthenticated)
        );
        assert_eq!(
            require_admin(&Caller::Anonymous),
            Err(AuthzError::NotAuthenticated)
        );
        assert!(matches!(
            CoreError::from(AuthzError::NotAuthenticated),
            CoreError::Unauthenticated(_)
        ));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&Caller::Authenticated(ctx(Role::Admin))).is_ok());
        assert_eq!(
            require_admin(&Caller::Authenticated(ctx(Role::User))),
            Err(AuthzError::AdminRequired)
        );
    }

    #[test]
    fn test_project_read() {
        let member = ctx(Role::User);
        let outsider = ctx(Role::User);
        let project = project_with(vec![member.user_id]);

        assert!(require_project_read(&member, &project).is_ok());
        assert!(require_project_read(&ctx(Role::Admin), &project).is_ok());
        assert_eq!(
            require_project_read(&outsider, &project),
            Err(AuthzError::NotMember(project.id))
        );
    }

    #[test]
    fn test_task_read() {
        let owner = ctx(Role::User);
        let task = task_owned_by(owner.user_id);

        assert!(require_task_read(&owner, &task).is_ok());
        assert!(require_task_read(&ctx(Role::Admin), &task).is_ok());
        assert!(require_task_read(&ctx(Role::User), &task).is_err());
    }

    #[test]
    fn test_owner_may_change_status_and_attachments() {
        let owner = ctx(Role::User);
        let task = task_owned_by(owner.user_id);

        assert!(require_task_update(&owner, &task, &[TaskField::Status]).is_ok());
        assert!(
            require_task_update(&owner, &task, &[TaskField::Status, TaskField::Attachments])
                .is_ok()
        );
    }

    #[test]
    fn test_owner_may_not_change_other_fields() {
        let owner = ctx(Role::User);
        let task = task_owned_by(owner.user_id);

        assert_eq!(
            require_task_update(&owner, &task, &[TaskField::Status, TaskField::Title]),
            Err(AuthzError::FieldNotEditable("title"))
        );
        assert_eq!(
            require_task_update(&owner, &task, &[TaskField::Owner]),
            Err(AuthzError::FieldNotEditable("user"))
        );
    }

    #[test]
    fn test_non_owner_is_denied() {
        let task = task_owned_by(Uuid::new_v4());
        let err = require_task_update(&ctx(Role::User), &task, &[TaskField::Status]).unwrap_err();

        assert_eq!(err, AuthzError::NotOwner(task.id));
        assert!(matches!(CoreError::from(err), CoreError::Forbidden(_)));
    }

    #[test]
    fn test_admin_may_change_everything() {
        let task = task_owned_by(Uuid::new_v4());
        let all = [
            TaskField::Title,
            TaskField::Description,
            TaskField::Owner,
            TaskField::Status,
            TaskField::Project,
            TaskField::Attachments,
        ];

        assert!(require_task_update(&ctx(Role::Admin), &task, &all).is_ok());
    }
}
