/// Access-control predicates
///
/// Pure checks over records that have already been loaded. The HTTP layer
/// maps each [`AuthzError`] to its status; in particular a project the
/// requester may not see is reported as not found.
///
/// # Permission Model
///
/// 1. **Project**: the manager and every team member may read and modify
///    the project, its tasks and its notes.
/// 2. **Task**: additionally must belong to the project named in the path.
/// 3. **Note deletion**: author only.
///
/// # Example
///
/// ```no_run
/// use uptask_shared::auth::authorization::{require_project_access, require_task_in_project};
/// use uptask_shared::models::{project::Project, task::Task};
/// use uuid::Uuid;
///
/// fn check(project: &Project, task: &Task, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     require_project_access(project, user_id)?;
///     require_task_in_project(task, project.id)?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use crate::models::{note::Note, project::Project, task::Task};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Requester is neither manager nor team member, or not the note author
    #[error("Not authorized to access this resource")]
    NotAuthorized,

    /// Task does not belong to the project in the path
    #[error("Task {task_id} does not belong to project {project_id}")]
    Mismatch { task_id: Uuid, project_id: Uuid },

    #[error("User {0} is already a member of the project")]
    AlreadyMember(Uuid),

    #[error("User {0} is not a member of the project")]
    NotMember(Uuid),
}

pub fn is_manager(project: &Project, user_id: Uuid) -> bool {
    project.manager == user_id
}

pub fn is_team_member(project: &Project, user_id: Uuid) -> bool {
    project.team.contains(&user_id)
}

/// Manager or team member
pub fn can_access_project(project: &Project, user_id: Uuid) -> bool {
    is_manager(project, user_id) || is_team_member(project, user_id)
}

pub fn require_project_access(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
    if can_access_project(project, user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

pub fn require_task_in_project(task: &Task, project_id: Uuid) -> Result<(), AuthzError> {
    if task.project == project_id {
        Ok(())
    } else {
        Err(AuthzError::Mismatch {
            task_id: task.id,
            project_id,
        })
    }
}

pub fn require_note_author(note: &Note, user_id: Uuid) -> Result<(), AuthzError> {
    if note.created_by == user_id {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

/// Precondition for adding `user_id` to the team
///
/// The manager counts as a member already.
pub fn require_not_member(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
    if can_access_project(project, user_id) {
        Err(AuthzError::AlreadyMember(user_id))
    } else {
        Ok(())
    }
}

/// Precondition for removing `user_id` from the team
pub fn require_member(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
    if is_team_member(project, user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotMember(user_id))
    }
}
