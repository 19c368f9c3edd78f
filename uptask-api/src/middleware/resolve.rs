/// Path entity resolution
///
/// Project- and task-scoped handlers take a [`ProjectScope`] or
/// [`TaskScope`] argument instead of raw path ids. Extraction:
///
/// 1. reads the session user inserted by the session layer,
/// 2. parses `project_id` (and `task_id`) from the path (400 if malformed),
/// 3. loads the project and checks the user is its manager or a team
///    member (404 "Project not found" otherwise),
/// 4. for tasks, loads the task (404) and checks it belongs to the
///    project (400 "Task does not belong to project").
///
/// # Example
///
/// ```no_run
/// use axum::Json;
/// use uptask_api::{error::ApiResult, middleware::resolve::ProjectScope};
/// use uptask_shared::models::project::Project;
///
/// async fn handler(scope: ProjectScope) -> ApiResult<Json<Project>> {
///     Ok(Json(scope.project))
/// }
/// ```

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uptask_shared::{
    auth::{
        authorization::{require_project_access, require_task_in_project},
        middleware::AuthUser,
    },
    models::{project::Project, task::Task},
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// An authorized project and the user acting on it
#[derive(Debug, Clone)]
pub struct ProjectScope {
    pub user: AuthUser,
    pub project: Project,
}

/// An authorized task, its project and the user acting on it
#[derive(Debug, Clone)]
pub struct TaskScope {
    pub user: AuthUser,
    pub project: Project,
    pub task: Task,
}

/// Parses a path segment as a UUID
pub(crate) fn parse_id(params: &HashMap<String, String>, name: &str) -> Result<Uuid, ApiError> {
    let raw = params
        .get(name)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing path parameter: {}", name)))?;

    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {}", name)))
}

async fn path_params(
    parts: &mut Parts,
    state: &AppState,
) -> Result<HashMap<String, String>, ApiError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    Ok(params)
}

fn session_user(parts: &Parts) -> Result<AuthUser, ApiError> {
    parts
        .extensions
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
}

async fn load_project(
    state: &AppState,
    user: &AuthUser,
    project_id: Uuid,
) -> Result<Project, ApiError> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_project_access(&project, user.id)?;
    Ok(project)
}

#[async_trait]
impl FromRequestParts<AppState> for ProjectScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)?;
        let params = path_params(parts, state).await?;
        let project_id = parse_id(&params, "project_id")?;

        let project = load_project(state, &user, project_id).await?;

        Ok(Self { user, project })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TaskScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)?;
        let params = path_params(parts, state).await?;
        let project_id = parse_id(&params, "project_id")?;
        let task_id = parse_id(&params, "task_id")?;

        let project = load_project(state, &user, project_id).await?;

        let task = Task::find_by_id(&state.db, task_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

        require_task_in_project(&task, project.id)?;

        Ok(Self {
            user,
            project,
            task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        let p = params(&[("project_id", &id.to_string())]);
        assert_eq!(parse_id(&p, "project_id").unwrap(), id);
    }

    #[test]
    fn test_parse_id_rejects_malformed() {
        let p = params(&[("project_id", "not-a-uuid")]);
        assert!(matches!(
            parse_id(&p, "project_id"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_id_missing_parameter() {
        let p = params(&[]);
        assert!(matches!(parse_id(&p, "task_id"), Err(ApiError::BadRequest(_))));
    }
}
