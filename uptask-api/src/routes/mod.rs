/// API route handlers
///
/// - `health`: Health check
/// - `auth`: Signup, confirmation, login, password reset, profile
/// - `projects`: Project CRUD
/// - `tasks`: Task CRUD and status transitions
/// - `notes`: Notes on tasks
/// - `team`: Project team membership

pub mod auth;
pub mod health;
pub mod notes;
pub mod projects;
pub mod tasks;
pub mod team;

use serde::{Deserialize, Serialize};

/// Body of responses that only carry a confirmation text
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
