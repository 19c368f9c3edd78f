/// Note endpoints
///
/// # Endpoints
///
/// - `POST /projects/:project_id/tasks/:task_id/notes` - Add a note
/// - `GET /projects/:project_id/tasks/:task_id/notes` - Notes with authors
/// - `DELETE /projects/:project_id/tasks/:task_id/notes/:note_id` - Author only

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{
        body::JsonBody,
        resolve::{parse_id, TaskScope},
    },
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uptask_shared::{
    auth::authorization::require_note_author,
    models::note::{CreateNote, Note, NoteDetail},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

pub async fn create_note(
    State(state): State<AppState>,
    scope: TaskScope,
    JsonBody(mut req): JsonBody<NoteRequest>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    req.content = req.content.trim().to_string();
    req.validate()?;

    let note = Note::create(
        &state.db,
        CreateNote {
            content: req.content,
            created_by: scope.user.id,
            task: scope.task.id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    scope: TaskScope,
) -> ApiResult<Json<Vec<NoteDetail>>> {
    let notes = Note::list_by_task(&state.db, scope.task.id).await?;
    Ok(Json(notes))
}

/// Delete a note
///
/// # Errors
///
/// - `404 Not Found`: No such note on this task
/// - `401 Unauthorized`: Requester is not the author
pub async fn delete_note(
    State(state): State<AppState>,
    scope: TaskScope,
    Path(params): Path<HashMap<String, String>>,
) -> ApiResult<Json<MessageResponse>> {
    let note_id = parse_id(&params, "note_id")?;

    let note = Note::find_by_id(&state.db, note_id)
        .await?
        .filter(|note| note.task == scope.task.id)
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    require_note_author(&note, scope.user.id)
        .map_err(|_| ApiError::Unauthorized("Invalid action".to_string()))?;

    if !Note::delete(&state.db, note.id).await? {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Note deleted")))
}
