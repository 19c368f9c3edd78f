/// Project model and database operations
///
/// A project has one manager and a team of users; together they are the
/// only users allowed to see or change it. `tasks` lists the ids of the
/// project's tasks in creation order and is maintained by the integrity
/// engine, never written directly.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_name VARCHAR(255) NOT NULL,
///     client_name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     manager_id UUID NOT NULL REFERENCES users(id),
///     team UUID[] NOT NULL DEFAULT '{}',
///     tasks UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::project::{CreateProject, Project};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, manager: Uuid) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     project_name: "Website".to_string(),
///     client_name: "ACME".to_string(),
///     description: "Marketing site relaunch".to_string(),
///     manager,
/// })
/// .await?;
///
/// // Removes the project together with its tasks and their notes
/// Project::delete(&pool, project.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::integrity::{self, IntegrityReport};

const PROJECT_COLUMNS: &str = "id, project_name, client_name, description, manager_id, team, tasks, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,

    pub project_name: String,

    pub client_name: String,

    pub description: String,

    /// User who created the project
    #[sqlx(rename = "manager_id")]
    pub manager: Uuid,

    /// Collaborators besides the manager
    pub team: Vec<Uuid>,

    /// Task ids in creation order
    pub tasks: Vec<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub manager: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,
}

impl Project {
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO projects (project_name, client_name, description, manager_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(data.project_name)
            .bind(data.client_name)
            .bind(data.description)
            .bind(data.manager)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects the user manages or belongs to, oldest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM projects
            WHERE manager_id = $1 OR $1 = ANY(team)
            ORDER BY created_at, id
            "#,
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE projects
            SET project_name = $2, client_name = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.project_name)
            .bind(data.client_name)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    /// Adds a user to the team
    ///
    /// Returns false when the user was already a member.
    pub async fn add_member(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET team = array_append(team, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(team))
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a user from the team
    ///
    /// Returns false when the user was not a member.
    pub async fn remove_member(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET team = array_remove(team, $2), updated_at = NOW()
            WHERE id = $1 AND $2 = ANY(team)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the project, its tasks and their notes in one transaction
    ///
    /// Returns `None` if the project did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<IntegrityReport>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let report = integrity::purge_project(&mut tx, id).await?;
        tx.commit().await?;

        if let Some(report) = report {
            info!(
                project_id = %id,
                tasks_removed = report.tasks_removed,
                notes_removed = report.notes_removed,
                "Project deleted"
            );
        }

        Ok(report)
    }
}
