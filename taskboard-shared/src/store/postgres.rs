//! PostgreSQL store
//!
//! Runtime-checked sqlx queries against the schema in `migrations/`. Every
//! method that touches more than one row set runs inside one transaction.
//! Foreign keys back up the `Board`'s reference resolution: a user or
//! project removed between resolution and write surfaces as `NotFound`
//! instead of a dangling reference.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{DeletedProject, Store};
use crate::db::pool::{close_pool, health_check};
use crate::error::CoreResult;
use crate::models::{
    Attachment, Project, ProjectChanges, Task, TaskChanges, TaskQuery, TaskStatus, User, UserLinks,
};

const USER_COLUMNS: &str = "id, login, password_hash, role, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, title, description, status, user_id, project_id, attachments, created_at, updated_at";

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
           COALESCE(
               ARRAY_AGG(pm.user_id ORDER BY pm.added_at, pm.user_id)
                   FILTER (WHERE pm.user_id IS NOT NULL),
               '{}'
           ) AS members
    FROM projects p
    LEFT JOIN project_members pm ON pm.project_id = p.id
"#;

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: String,
    status: TaskStatus,
    user_id: Uuid,
    project_id: Uuid,
    attachments: Json<Vec<Attachment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            user_id: row.user_id,
            project_id: row.project_id,
            attachments: row.attachments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of [`Store`]
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the underlying pool
    pub async fn close(&self) {
        close_pool(&self.pool).await;
    }
}

async fn fetch_project<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    let query = format!("{} WHERE p.id = $1 GROUP BY p.id", PROJECT_SELECT);
    sqlx::query_as::<_, Project>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Adds membership rows, keeping the order of `members`
async fn insert_members(
    conn: &mut PgConnection,
    project_id: Uuid,
    members: &[Uuid],
) -> Result<(), sqlx::Error> {
    if members.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO project_members (project_id, user_id)
        SELECT $1, member.user_id
        FROM UNNEST($2::uuid[]) WITH ORDINALITY AS member(user_id, position)
        ORDER BY member.position
        ON CONFLICT (project_id, user_id) DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(members.to_vec())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> CoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, login, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user.id, "Inserted user");
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> CoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE login = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users_by_logins(&self, logins: &[String]) -> CoreResult<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE login = ANY($1) ORDER BY created_at, id",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(logins.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY created_at, id",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        let query = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn links_for_users(&self, ids: &[Uuid]) -> CoreResult<HashMap<Uuid, UserLinks>> {
        let mut links: HashMap<Uuid, UserLinks> =
            ids.iter().map(|id| (*id, UserLinks::default())).collect();
        if ids.is_empty() {
            return Ok(links);
        }

        let memberships: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT pm.user_id, pm.project_id
            FROM project_members pm
            JOIN projects p ON p.id = pm.project_id
            WHERE pm.user_id = ANY($1)
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let owned: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT user_id, id FROM tasks WHERE user_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        for (user_id, project_id) in memberships {
            if let Some(entry) = links.get_mut(&user_id) {
                entry.projects.push(project_id);
            }
        }
        for (user_id, task_id) in owned {
            if let Some(entry) = links.get_mut(&user_id) {
                entry.tasks.push(task_id);
            }
        }

        Ok(links)
    }

    async fn insert_project(&self, project: &Project) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_members(&mut tx, project.id, &project.members).await?;
        tx.commit().await?;

        debug!(project_id = %project.id, members = project.members.len(), "Inserted project");
        Ok(())
    }

    async fn find_project(&self, id: Uuid) -> CoreResult<Option<Project>> {
        Ok(fetch_project(&self.pool, id).await?)
    }

    async fn list_projects(&self, member: Option<Uuid>) -> CoreResult<Vec<Project>> {
        let projects = match member {
            Some(user_id) => {
                let query = format!(
                    "{} WHERE p.id IN (SELECT project_id FROM project_members WHERE user_id = $1) \
                     GROUP BY p.id ORDER BY p.created_at, p.id",
                    PROJECT_SELECT
                );
                sqlx::query_as::<_, Project>(&query)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("{} GROUP BY p.id ORDER BY p.created_at, p.id", PROJECT_SELECT);
                sqlx::query_as::<_, Project>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(projects)
    }

    async fn update_project(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> CoreResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        if let Some(members) = &changes.members {
            sqlx::query(
                "DELETE FROM project_members WHERE project_id = $1 AND NOT (user_id = ANY($2))",
            )
            .bind(id)
            .bind(members.clone())
            .execute(&mut *tx)
            .await?;

            insert_members(&mut tx, id, members).await?;
        }

        let project = fetch_project(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(project_id = %id, "Updated project");
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> CoreResult<Option<DeletedProject>> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let member_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM project_members WHERE project_id = $1 ORDER BY added_at, user_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let task_ids: Vec<Uuid> =
            sqlx::query_scalar("DELETE FROM tasks WHERE project_id = $1 RETURNING id")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(project_id = %id, tasks = task_ids.len(), "Deleted project");
        Ok(Some(DeletedProject {
            task_ids,
            member_ids,
        }))
    }

    async fn insert_task(&self, task: &Task) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, status, user_id, project_id,
                               attachments, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.user_id)
        .bind(task.project_id)
        .bind(Json(&task.attachments))
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(task_id = %task.id, "Inserted task");
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> CoreResult<Option<Task>> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn list_tasks(&self, query: &TaskQuery) -> CoreResult<Vec<Task>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS));

        if let Some(project_id) = query.project_id {
            builder.push(" AND project_id = ").push_bind(project_id);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        builder.push(" ORDER BY created_at, id");

        let rows = builder
            .build_query_as::<TaskRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> CoreResult<Option<Task>> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                user_id = COALESCE($5, user_id),
                project_id = COALESCE($6, project_id),
                attachments = COALESCE($7, attachments),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.status)
            .bind(changes.user_id)
            .bind(changes.project_id)
            .bind(changes.attachments.as_ref().map(Json))
            .fetch_optional(&self.pool)
            .await?;

        debug!(task_id = %id, found = row.is_some(), "Updated task");
        Ok(row.map(Task::from))
    }

    async fn delete_task(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
