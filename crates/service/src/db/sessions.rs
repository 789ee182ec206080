//! Session store.
//!
//! A session is a row in `pizza.auth` keyed by the signature segment of the
//! bearer token. Its presence is the only "logged in" predicate; sessions do
//! not expire.

use pizza_core::UserId;
use sqlx::PgPool;

use super::DbError;

/// Return the third dot-delimited segment of a token, or `""` if the token
/// has fewer than three segments.
#[must_use]
pub fn token_signature(token: &str) -> &str {
    token.split('.').nth(2).unwrap_or("")
}

/// Repository for session rows.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a session for `token`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the insert fails.
    pub async fn login_user(&self, user_id: UserId, token: &str) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            r"
            INSERT INTO pizza.auth (token, user_id)
            VALUES ($1, $2)
            ON CONFLICT (token) DO UPDATE SET user_id = EXCLUDED.user_id
            ",
        )
        .bind(token_signature(token))
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Whether a session exists for `token`.
    ///
    /// A token without a signature segment is never logged in.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the query fails.
    pub async fn is_logged_in(&self, token: &str) -> Result<bool, DbError> {
        let signature = token_signature(token);
        if signature.is_empty() {
            return Ok(false);
        }

        let mut conn = self.pool.acquire().await?;
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pizza.auth WHERE token = $1)")
                .bind(signature)
                .fetch_one(&mut *conn)
                .await?;
        Ok(found)
    }

    /// Delete the session for `token`. No-op if none exists.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the delete fails.
    pub async fn logout_user(&self, token: &str) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("DELETE FROM pizza.auth WHERE token = $1")
            .bind(token_signature(token))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
