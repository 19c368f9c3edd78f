/// Task endpoints
///
/// All task routes are scoped to a project the requester may access. A task
/// addressed under a project it does not belong to is rejected with
/// `400 Task does not belong to project`.
///
/// # Endpoints
///
/// - `POST /projects/:project_id/tasks` - Create a task
/// - `GET /projects/:project_id/tasks` - Tasks of the project
/// - `GET /projects/:project_id/tasks/:task_id` - Task with its notes
/// - `PUT /projects/:project_id/tasks/:task_id` - Replace name and description
/// - `DELETE /projects/:project_id/tasks/:task_id` - Delete task and notes
/// - `POST /projects/:project_id/tasks/:task_id/status` - Change status

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{
        body::JsonBody,
        resolve::{ProjectScope, TaskScope},
    },
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uptask_shared::models::{
    note::{Note, NoteDetail},
    task::{CreateTask, Task, TaskStatus},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 1, max = 255, message = "Task name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

impl TaskRequest {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// Status change body; the value is parsed by the handler so an unknown
/// status is a 400 rather than a body rejection
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// A task with its notes expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub project: Uuid,
    pub status: TaskStatus,
    pub completed_by: Option<Uuid>,
    pub notes: Vec<NoteDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskDetail {
    fn new(task: Task, notes: Vec<NoteDetail>) -> Self {
        Self {
            id: task.id,
            name: task.name,
            description: task.description,
            project: task.project,
            status: task.status,
            completed_by: task.completed_by,
            notes,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    scope: ProjectScope,
    JsonBody(req): JsonBody<TaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let req = req.trimmed();
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            name: req.name,
            description: req.description,
            project: scope.project.id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    scope: ProjectScope,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_project(&state.db, scope.project.id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    scope: TaskScope,
) -> ApiResult<Json<TaskDetail>> {
    let notes = Note::list_by_task(&state.db, scope.task.id).await?;
    Ok(Json(TaskDetail::new(scope.task, notes)))
}

pub async fn update_task(
    State(state): State<AppState>,
    scope: TaskScope,
    JsonBody(req): JsonBody<TaskRequest>,
) -> ApiResult<Json<Task>> {
    let req = req.trimmed();
    req.validate()?;

    let task = Task::update(&state.db, scope.task.id, &req.name, &req.description)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    scope: TaskScope,
) -> ApiResult<Json<MessageResponse>> {
    if !Task::delete(&state.db, scope.task.id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Task deleted")))
}

/// Change a task's status
///
/// ```text
/// POST /projects/:project_id/tasks/:task_id/status
///
/// { "status": "inProgress" }
/// ```
///
/// `pending` clears `completedBy`; any other status records the requester.
///
/// # Errors
///
/// - `400 Bad Request`: Not one of pending, onHold, inProgress,
///   underReview, completed (nothing is written)
pub async fn update_status(
    State(state): State<AppState>,
    scope: TaskScope,
    JsonBody(req): JsonBody<StatusRequest>,
) -> ApiResult<Json<Task>> {
    let status: TaskStatus = req.status.parse()?;

    let task = Task::set_status(&state.db, scope.task.id, status, scope.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(task_id = %task.id, status = %status, user_id = %scope.user.id, "Task status changed");
    Ok(Json(task))
}
