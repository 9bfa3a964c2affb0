/// User model
///
/// A user is an account that can log in, belong to projects and own tasks.
/// The project and task sets of a user are not stored on the user row: they
/// are derived from `project_members` and `tasks.user_id` whenever a user is
/// read, so they always agree with the authoritative side.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     login VARCHAR(64) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::CoreError;

/// Longest accepted login
pub const MAX_LOGIN_LENGTH: usize = 64;

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every project and task
    Admin,

    /// Access to own memberships and own tasks
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(CoreError::validation(format!(
                "Invalid role '{}': expected admin or user",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user account
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// service. Use [`UserSummary`] or [`UserProfile`] for output.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            login: self.login.clone(),
            role: self.role,
        }
    }

    pub fn profile(&self, links: UserLinks) -> UserProfile {
        UserProfile {
            id: self.id,
            login: self.login.clone(),
            role: self.role,
            projects: links.projects,
            tasks: links.tasks,
        }
    }
}

/// Derived project and task ids of a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLinks {
    pub projects: Vec<Uuid>,
    pub tasks: Vec<Uuid>,
}

/// Public identity of a user, embedded in projects and tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub login: String,
    pub role: Role,
}

/// User with derived project and task ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub login: String,
    pub role: Role,
    pub projects: Vec<Uuid>,
    pub tasks: Vec<Uuid>,
}

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(max = 64, message = "Login must be at most 64 characters"))]
    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub password: String,

    /// `admin` or `user`; defaults to `user`
    #[serde(default)]
    pub role: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}
