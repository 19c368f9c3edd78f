/// Project endpoints
///
/// A project is visible to its manager and its team members only; anyone
/// else gets `404 Project not found`, the same answer as for a project
/// that does not exist.
///
/// # Endpoints
///
/// - `GET /projects` - Projects the user manages or belongs to
/// - `POST /projects` - Create a project (creator becomes manager)
/// - `GET /projects/:project_id` - Project with its tasks
/// - `PUT /projects/:project_id` - Replace name, client and description
/// - `DELETE /projects/:project_id` - Delete project, tasks and notes

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{body::JsonBody, resolve::ProjectScope},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uptask_shared::{
    auth::middleware::AuthUser,
    integrity::IntegrityReport,
    models::{
        project::{CreateProject, Project, UpdateProject},
        task::Task,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Project name is required"))]
    pub project_name: String,

    #[validate(length(min = 1, max = 255, message = "Client name is required"))]
    pub client_name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

impl ProjectRequest {
    fn trimmed(self) -> Self {
        Self {
            project_name: self.project_name.trim().to_string(),
            client_name: self.client_name.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// A project with its tasks expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: Uuid,
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub manager: Uuid,
    pub team: Vec<Uuid>,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectDetail {
    fn new(project: Project, tasks: Vec<Task>) -> Self {
        Self {
            id: project.id,
            project_name: project.project_name,
            client_name: project.client_name,
            description: project.description,
            manager: project.manager,
            team: project.team,
            tasks,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteProjectResponse {
    pub message: String,

    #[serde(flatten)]
    pub removed: IntegrityReport,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, user.id).await?;
    Ok(Json(projects))
}

/// Create a project
///
/// ```text
/// POST /projects
///
/// { "projectName": "Website", "clientName": "Acme", "description": "Relaunch" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: A field is empty
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(req): JsonBody<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let req = req.trimmed();
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            project_name: req.project_name,
            client_name: req.client_name,
            description: req.description,
            manager: user.id,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, manager = %user.id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    scope: ProjectScope,
) -> ApiResult<Json<ProjectDetail>> {
    let tasks = Task::list_by_project(&state.db, scope.project.id).await?;
    Ok(Json(ProjectDetail::new(scope.project, tasks)))
}

pub async fn update_project(
    State(state): State<AppState>,
    scope: ProjectScope,
    JsonBody(req): JsonBody<ProjectRequest>,
) -> ApiResult<Json<Project>> {
    let req = req.trimmed();
    req.validate()?;

    let project = Project::update(
        &state.db,
        scope.project.id,
        UpdateProject {
            project_name: req.project_name,
            client_name: req.client_name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Delete a project together with its tasks and their notes
///
/// # Response
///
/// ```json
/// { "message": "Project deleted", "tasksRemoved": 3, "notesRemoved": 7 }
/// ```
pub async fn delete_project(
    State(state): State<AppState>,
    scope: ProjectScope,
) -> ApiResult<Json<DeleteProjectResponse>> {
    let removed = Project::delete(&state.db, scope.project.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(DeleteProjectResponse {
        message: "Project deleted".to_string(),
        removed,
    }))
}
