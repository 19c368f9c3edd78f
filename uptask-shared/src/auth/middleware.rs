/// Session verification
///
/// Every protected route runs [`authenticate_bearer`] on the request's
/// `Authorization` header. On success the minimal user projection
/// ([`AuthUser`]) is attached to the request extensions for handlers and
/// access-control predicates.
///
/// # Example
///
/// ```no_run
/// use uptask_shared::auth::middleware::{authenticate_bearer, AuthUser};
///
/// # async fn example(pool: sqlx::PgPool, secret: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let user: AuthUser = authenticate_bearer(&pool, secret, Some("Bearer eyJ...")).await?;
/// println!("Hello, {}!", user.name);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::{User, UserSummary};

/// Identity of the requester, attached to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<AuthUser> for UserSummary {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    /// No `Authorization` header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat,

    /// Token did not decode or its user no longer exists
    InvalidToken(String),

    DatabaseError(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Unauthorized"),
            AuthError::InvalidFormat => write!(f, "Invalid token"),
            AuthError::InvalidToken(_) => write!(f, "Invalid token"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Verifies a bearer header and loads the user it names
///
/// # Errors
///
/// - `MissingCredentials` when `header` is `None`
/// - `InvalidFormat` / `InvalidToken` for a malformed, expired or
///   foreign token, or a token whose user has been removed
pub async fn authenticate_bearer(
    pool: &PgPool,
    secret: &str,
    header: Option<&str>,
) -> Result<AuthUser, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let token = bearer_token(header)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or_else(|| {
            debug!(user_id = %claims.sub, "Session token for unknown user");
            AuthError::InvalidToken("User not found".to_string())
        })?;

    Ok(AuthUser::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(matches!(bearer_token("Basic abc"), Err(AuthError::InvalidFormat)));
        assert!(matches!(bearer_token("Bearer "), Err(AuthError::InvalidFormat)));
        assert!(matches!(bearer_token("abc.def.ghi"), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_auth_user_from_user() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "hash".to_string(),
            confirmed: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let auth = AuthUser::from(&user);
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.email, user.email);

        let summary = UserSummary::from(auth);
        assert_eq!(summary.name, "Ana");
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(AuthError::MissingCredentials.to_string(), "Unauthorized");
        assert_eq!(AuthError::InvalidFormat.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_before_touching_store() {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let secret = "test-secret-key-at-least-32-bytes-long";

        assert!(matches!(
            authenticate_bearer(&pool, secret, None).await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            authenticate_bearer(&pool, secret, Some("Bearer not-a-jwt")).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
