//! Authentication error types.

use thiserror::Error;

use crate::db::DbError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration without a name, email or password.
    #[error("name, email, and password are required")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] pizza_core::EmailError),

    /// Missing, malformed, forged or logged-out token.
    #[error("unauthorized")]
    Unauthenticated,

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error(transparent)]
    Database(#[from] DbError),
}
