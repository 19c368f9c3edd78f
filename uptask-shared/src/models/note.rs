/// Note model and database operations
///
/// Notes are comments left on a task. Only the author may delete one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     content TEXT NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;
use crate::integrity;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,

    pub content: String,

    pub created_by: Uuid,

    #[sqlx(rename = "task_id")]
    pub task: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A note with its author expanded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    pub id: Uuid,
    pub content: String,
    pub created_by: UserSummary,
    pub task: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct NoteDetailRow {
    id: Uuid,
    content: String,
    task_id: Uuid,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    author_name: String,
    author_email: String,
}

impl From<NoteDetailRow> for NoteDetail {
    fn from(row: NoteDetailRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_by: UserSummary {
                id: row.author_id,
                name: row.author_name,
                email: row.author_email,
            },
            task: row.task_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateNote {
    pub content: String,
    pub created_by: Uuid,
    pub task: Uuid,
}

impl Note {
    /// Inserts the note and appends it to its task's note sequence
    ///
    /// Returns `None` when the task was deleted before its row could be
    /// locked.
    pub async fn create(pool: &PgPool, data: CreateNote) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM tasks WHERE id = $1 FOR NO KEY UPDATE")
                .bind(data.task)
                .fetch_optional(&mut *tx)
                .await?;

        if task.is_none() {
            return Ok(None);
        }

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (content, created_by, task_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, created_by, task_id, created_at, updated_at
            "#,
        )
        .bind(data.content)
        .bind(data.created_by)
        .bind(data.task)
        .fetch_one(&mut *tx)
        .await?;

        integrity::attach_note(&mut tx, note.task, note.id).await?;
        tx.commit().await?;

        Ok(Some(note))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            "SELECT id, content, created_by, task_id, created_at, updated_at FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Notes of a task with authors, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<NoteDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, NoteDetailRow>(
            r#"
            SELECT n.id, n.content, n.task_id, n.created_at,
                   u.id AS author_id, u.name AS author_name, u.email AS author_email
            FROM notes n
            JOIN users u ON u.id = n.created_by
            WHERE n.task_id = $1
            ORDER BY n.created_at, n.id
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(NoteDetail::from).collect())
    }

    /// Deletes the note and detaches it from its task
    ///
    /// Returns false if the note was already gone.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task_id: Option<Uuid> = sqlx::query_scalar("SELECT task_id FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(task_id) = task_id else {
            return Ok(false);
        };

        // Task before note, same order as the task purge.
        sqlx::query("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if deleted {
            integrity::detach_note(&mut tx, task_id, id).await?;
        }

        tx.commit().await?;
        Ok(deleted)
    }
}
