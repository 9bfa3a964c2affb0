/// Project model
///
/// A project groups tasks and has a set of member users. Membership rows in
/// `project_members` are the authoritative side of the user/project
/// relationship; `members` is loaded from them in insertion order.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

/// Stored project with its member ids
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }
}

/// Project with member summaries, as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub users: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
///
/// `users` holds member logins.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    #[serde(default)]
    pub name: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub users: Option<Vec<String>>,
}

/// Partial update of a project
///
/// A present `users` list replaces the membership set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    #[serde(default)]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub users: Option<Vec<String>>,
}

/// Resolved project changes handed to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub members: Option<Vec<Uuid>>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.members.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_deserializes_camel_case() {
        let input: NewProject = serde_json::from_value(serde_json::json!({
            "name": "Website",
            "users": ["ivan", "maria"]
        }))
        .unwrap();

        assert_eq!(input.name, "Website");
        assert_eq!(input.description, None);
        assert_eq!(input.users.unwrap(), vec!["ivan", "maria"]);
    }

    #[test]
    fn test_missing_name_deserializes_blank() {
        let input: NewProject = serde_json::from_value(serde_json::json!({})).unwrap();

        assert_eq!(input.name, "");
        assert!(input.users.is_none());
    }

    #[test]
    fn test_name_length_limit() {
        let input = NewProject {
            name: "n".repeat(201),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let patch = ProjectPatch {
            description: Some("d".repeat(5001)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_details_serialize_camel_case() {
        let now = Utc::now();
        let details = ProjectDetails {
            id: Uuid::new_v4(),
            name: "Website".to_string(),
            description: String::new(),
            users: vec![],
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&details).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_empty_changes() {
        assert!(ProjectChanges::default().is_empty());
        assert!(!ProjectChanges {
            members: Some(vec![]),
            ..Default::default()
        }
        .is_empty());
    }
}
