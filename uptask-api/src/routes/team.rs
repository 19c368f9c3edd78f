/// Project team endpoints
///
/// The manager and current team members may manage the team. The manager
/// is never part of the team list and cannot be added to it.
///
/// # Endpoints
///
/// - `POST /projects/:project_id/team/find` - Look up a user by email
/// - `GET /projects/:project_id/team` - Team members
/// - `POST /projects/:project_id/team` - Add a member by id
/// - `DELETE /projects/:project_id/team/:user_id` - Remove a member

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{
        body::JsonBody,
        resolve::{parse_id, ProjectScope},
    },
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uptask_shared::{
    auth::authorization::{require_member, require_not_member, AuthzError},
    models::{
        project::Project,
        user::{User, UserSummary},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct FindMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub id: Uuid,
}

/// Look up a user by email, to offer them as a new member
///
/// # Errors
///
/// - `404 Not Found`: No user with that email
pub async fn find_member(
    State(state): State<AppState>,
    _scope: ProjectScope,
    JsonBody(req): JsonBody<FindMemberRequest>,
) -> ApiResult<Json<UserSummary>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserSummary::from(&user)))
}

pub async fn list_members(
    State(state): State<AppState>,
    scope: ProjectScope,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let members = User::find_summaries(&state.db, &scope.project.team).await?;
    Ok(Json(members))
}

/// Add a user to the team
///
/// ```text
/// POST /projects/:project_id/team
///
/// { "id": "5f0c..." }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `400 Bad Request`: Already a member (or the manager)
pub async fn add_member(
    State(state): State<AppState>,
    scope: ProjectScope,
    JsonBody(req): JsonBody<AddMemberRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user = User::find_by_id(&state.db, req.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    require_not_member(&scope.project, user.id)?;

    // A concurrent add may have won since the project was loaded
    if !Project::add_member(&state.db, scope.project.id, user.id).await? {
        return Err(AuthzError::AlreadyMember(user.id).into());
    }

    info!(project_id = %scope.project.id, user_id = %user.id, "Team member added");
    Ok(Json(MessageResponse::new("User added to the project")))
}

/// Remove a user from the team
///
/// # Errors
///
/// - `404 Not Found`: User is not on the team
pub async fn remove_member(
    State(state): State<AppState>,
    scope: ProjectScope,
    Path(params): Path<HashMap<String, String>>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = parse_id(&params, "user_id")?;

    require_member(&scope.project, user_id)?;

    if !Project::remove_member(&state.db, scope.project.id, user_id).await? {
        return Err(AuthzError::NotMember(user_id).into());
    }

    info!(project_id = %scope.project.id, user_id = %user_id, "Team member removed");
    Ok(Json(MessageResponse::new("User removed from the project")))
}
