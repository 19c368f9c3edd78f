/// Task model and database operations
///
/// Tasks belong to exactly one project for their whole life. `notes` lists
/// the ids of the task's notes and is maintained by the integrity engine.
///
/// # Status
///
/// ```text
/// pending | onHold | inProgress | underReview | completed
/// ```
///
/// Any status may follow any other. Moving to `pending` clears
/// `completed_by`; every other status records the acting user.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'pending', 'onHold', 'inProgress', 'underReview', 'completed'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
///     status task_status NOT NULL DEFAULT 'pending',
///     completed_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     notes UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::integrity;

const TASK_COLUMNS: &str =
    "id, name, description, project_id, status, completed_by, notes, created_at, updated_at";

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    OnHold,
    InProgress,
    UnderReview,
    Completed,
}

/// Returned when parsing a status string that is not one of the five values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status: {0}")]
pub struct InvalidStatus(pub String);

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::OnHold,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::OnHold => "onHold",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::UnderReview => "underReview",
            TaskStatus::Completed => "completed",
        }
    }

    /// Value of `completed_by` after `actor` moves a task to this status
    pub fn completed_by(&self, actor: Uuid) -> Option<Uuid> {
        match self {
            TaskStatus::Pending => None,
            _ => Some(actor),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Owning project, fixed at creation
    #[sqlx(rename = "project_id")]
    pub project: Uuid,

    pub status: TaskStatus,

    /// Last user to move the task out of `pending`
    pub completed_by: Option<Uuid>,

    /// Note ids in creation order
    pub notes: Vec<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub name: String,
    pub description: String,
    pub project: Uuid,
}

impl Task {
    /// Inserts the task and appends it to its project's task sequence
    ///
    /// Both writes share one transaction. The project row is locked
    /// first, so a concurrent project delete either waits for this
    /// task and purges it, or wins and leaves nothing to attach to.
    /// Returns `None` when the project is gone.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR NO KEY UPDATE")
                .bind(data.project)
                .fetch_optional(&mut *tx)
                .await?;

        if project.is_none() {
            return Ok(None);
        }

        let query = format!(
            r#"
            INSERT INTO tasks (name, description, project_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.project)
            .fetch_one(&mut *tx)
            .await?;

        integrity::attach_task(&mut tx, task.project, task.id).await?;
        tx.commit().await?;

        info!(task_id = %task.id, project_id = %task.project, "Task created");
        Ok(Some(task))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tasks of a project in creation order
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_at, id",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Updates name and description; the project reference never changes
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    /// Moves the task to `status` on behalf of `actor`
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
        actor: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET status = $2, completed_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status)
            .bind(status.completed_by(actor))
            .fetch_optional(pool)
            .await
    }

    /// Deletes the task and its notes and detaches it from its project
    ///
    /// Returns false if the task was already gone.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let purged = integrity::purge_task(&mut tx, id).await?;
        tx.commit().await?;

        if let Some(notes_removed) = purged {
            info!(task_id = %id, notes_removed, "Task deleted");
        }

        Ok(purged.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_all_values() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!(
            "done".parse::<TaskStatus>(),
            Err(InvalidStatus("done".to_string()))
        );
        // Case matters
        assert!("OnHold".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_pending_clears_completed_by() {
        let actor = Uuid::new_v4();
        assert_eq!(TaskStatus::Pending.completed_by(actor), None);
    }

    #[test]
    fn test_other_statuses_record_actor() {
        let actor = Uuid::new_v4();
        for status in TaskStatus::ALL {
            if status != TaskStatus::Pending {
                assert_eq!(status.completed_by(actor), Some(actor), "{}", status);
            }
        }
    }

    #[test]
    fn test_status_serde_matches_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::UnderReview).unwrap(),
            "\"underReview\""
        );
        let parsed: TaskStatus = serde_json::from_str("\"onHold\"").unwrap();
        assert_eq!(parsed, TaskStatus::OnHold);
    }
}
