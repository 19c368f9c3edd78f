/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: Session token issuing and validation
/// - [`code`]: One-time confirmation / reset codes
/// - [`middleware`]: Bearer session verification
/// - [`authorization`]: Project, task and note access predicates
///
/// # Example
///
/// ```
/// use uptask_shared::auth::password::{hash_password, verify_password};
/// use uptask_shared::auth::jwt::{issue_session_token, validate_token};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let user_id = Uuid::new_v4();
/// let token = issue_session_token(user_id, Duration::days(1), "a-secret-key-of-at-least-32-bytes!")?;
/// assert_eq!(validate_token(&token, "a-secret-key-of-at-least-32-bytes!")?.sub, user_id);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod code;
pub mod jwt;
pub mod middleware;
pub mod password;
