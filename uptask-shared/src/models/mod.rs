/// Database models for UpTask
///
/// # Models
///
/// - `user`: Accounts and their public projection
/// - `token`: One-time confirmation / password-reset codes
/// - `project`: Projects with manager and team
/// - `task`: Tasks and their status
/// - `note`: Notes left on tasks
///
/// Creating or deleting tasks and notes goes through the model methods,
/// which keep the parents' reference sequences consistent via
/// [`crate::integrity`].

pub mod note;
pub mod project;
pub mod task;
pub mod token;
pub mod user;
