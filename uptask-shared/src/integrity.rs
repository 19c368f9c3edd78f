/// Referential integrity engine
///
/// Keeps the denormalized reference sequences (`projects.tasks`,
/// `tasks.notes`) in step with the child tables and performs the
/// parent → child deletion cascade:
///
/// ```text
/// delete project ──> delete notes of its tasks ──> delete tasks ──> delete project
/// delete task    ──> detach from project ──> delete its notes ──> delete task
/// ```
///
/// Every function here runs on a connection that the caller has put inside
/// a transaction. The model methods (`Task::create`, `Task::delete`,
/// `Note::create`, `Note::delete`, `Project::delete`) are the only callers,
/// which makes the cascade part of the delete itself rather than a step a
/// handler could forget. The child foreign keys are RESTRICT, so any other
/// ordering is rejected by PostgreSQL.
///
/// Lock order is always project → task → note.

use serde::Serialize;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

/// What a project deletion removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub tasks_removed: u64,
    pub notes_removed: u64,
}

/// Appends `task_id` to the project's task sequence
///
/// Idempotent: an id already present is not appended twice.
pub async fn attach_task(
    conn: &mut PgConnection,
    project_id: Uuid,
    task_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE projects
        SET tasks = array_append(tasks, $2), updated_at = NOW()
        WHERE id = $1 AND NOT ($2 = ANY(tasks))
        "#,
    )
    .bind(project_id)
    .bind(task_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes `task_id` from the project's task sequence
///
/// A missing id is a no-op, so a repeated delete never disturbs the
/// remaining entries.
pub async fn detach_task(
    conn: &mut PgConnection,
    project_id: Uuid,
    task_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE projects
        SET tasks = array_remove(tasks, $2), updated_at = NOW()
        WHERE id = $1 AND $2 = ANY(tasks)
        "#,
    )
    .bind(project_id)
    .bind(task_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Appends `note_id` to the task's note sequence
pub async fn attach_note(
    conn: &mut PgConnection,
    task_id: Uuid,
    note_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET notes = array_append(notes, $2), updated_at = NOW()
        WHERE id = $1 AND NOT ($2 = ANY(notes))
        "#,
    )
    .bind(task_id)
    .bind(note_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes `note_id` from the task's note sequence
pub async fn detach_note(
    conn: &mut PgConnection,
    task_id: Uuid,
    note_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET notes = array_remove(notes, $2), updated_at = NOW()
        WHERE id = $1 AND $2 = ANY(notes)
        "#,
    )
    .bind(task_id)
    .bind(note_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes a task with its notes and detaches it from its project
///
/// Returns the number of notes removed, or `None` if the task did not
/// exist.
pub async fn purge_task(
    conn: &mut PgConnection,
    task_id: Uuid,
) -> Result<Option<u64>, sqlx::Error> {
    let project_id: Option<Uuid> =
        sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(project_id) = project_id else {
        return Ok(None);
    };

    sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

    // Re-check under the lock; a concurrent delete may have won.
    let still_there: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(task_id)
            .fetch_optional(&mut *conn)
            .await?;

    if still_there.is_none() {
        return Ok(None);
    }

    detach_task(conn, project_id, task_id).await?;

    let notes_removed = sqlx::query("DELETE FROM notes WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

    debug!(task_id = %task_id, project_id = %project_id, notes_removed, "Task purged");
    Ok(Some(notes_removed))
}

/// Deletes a project, its tasks and every note of those tasks
///
/// Order is notes → tasks → project. Returns `None` if the project did
/// not exist.
pub async fn purge_project(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Option<IntegrityReport>, sqlx::Error> {
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(project_id)
            .fetch_optional(&mut *conn)
            .await?;

    if locked.is_none() {
        return Ok(None);
    }

    let task_ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM tasks WHERE project_id = $1 FOR UPDATE")
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await?;

    let notes_removed = if task_ids.is_empty() {
        0
    } else {
        sqlx::query("DELETE FROM notes WHERE task_id = ANY($1)")
            .bind(&task_ids)
            .execute(&mut *conn)
            .await?
            .rows_affected()
    };

    let tasks_removed = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(IntegrityReport {
        tasks_removed,
        notes_removed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = IntegrityReport {
            tasks_removed: 2,
            notes_removed: 5,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["tasksRemoved"], 2);
        assert_eq!(json["notesRemoved"], 5);
    }
}
