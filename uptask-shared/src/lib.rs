//! # UpTask Shared Library
//!
//! Domain types, persistence and authentication primitives used by the
//! UpTask API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Users, projects, tasks, notes and one-time tokens
//! - `integrity`: Cascading deletes and back-reference maintenance
//! - `auth`: Password hashing, session tokens, one-time codes, access control
//! - `mail`: Outbound transactional email

pub mod auth;
pub mod db;
pub mod integrity;
pub mod mail;
pub mod models;

/// Current version of the UpTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
