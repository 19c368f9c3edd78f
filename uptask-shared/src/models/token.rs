/// One-time token model
///
/// Tokens back account confirmation and password reset. The user receives
/// a short numeric code by email; only its SHA-256 digest is stored.
/// A token is consumed (deleted) when redeemed and stops matching once
/// `expires_at` has passed. A user may hold several outstanding tokens.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::code::{generate_code, hash_code, CODE_TTL_MINUTES};

/// Attempts made to find an unused code before giving up
const MAX_ISSUE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Token {
    pub id: Uuid,

    #[serde(skip_serializing)]
    pub token_hash: String,

    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

/// A freshly issued token together with the plaintext code to email
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: Token,
    pub code: String,
}

impl Token {
    /// Issues a new code for `user_id`
    ///
    /// Expired tokens of the same user are purged first. Digest collisions
    /// with another outstanding code are retried with a new code.
    pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<IssuedToken, sqlx::Error> {
        let purged = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND expires_at <= NOW()")
            .bind(user_id)
            .execute(pool)
            .await?
            .rows_affected();

        if purged > 0 {
            debug!(user_id = %user_id, purged, "Purged expired tokens");
        }

        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);
        let mut last_error = None;

        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let code = generate_code();

            let inserted = sqlx::query_as::<_, Token>(
                r#"
                INSERT INTO tokens (token_hash, user_id, expires_at)
                VALUES ($1, $2, $3)
                RETURNING id, token_hash, user_id, created_at, expires_at
                "#,
            )
            .bind(hash_code(&code))
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(pool)
            .await;

            match inserted {
                Ok(token) => return Ok(IssuedToken { token, code }),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    warn!(user_id = %user_id, "Token code collision, retrying");
                    last_error = Some(sqlx::Error::Database(db_err));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(sqlx::Error::RowNotFound))
    }

    /// Looks up an unexpired token by its plaintext code
    pub async fn find_valid(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Token>(
            r#"
            SELECT id, token_hash, user_id, created_at, expires_at
            FROM tokens
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(hash_code(code.trim()))
        .fetch_optional(pool)
        .await
    }

    /// Consumes a token
    ///
    /// Returns false when it was already gone.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every expired token
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
