//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Errors render as a JSON
//! body `{"message": "..."}`; server-side failures are captured to Sentry
//! before responding.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;
use crate::policy::PolicyError;
use crate::services::auth::AuthError;

/// Application-level error type for the service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Data access failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The caller may not perform the action.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Missing or invalid bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// Status and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Database(err)) => db_status(err),
            Self::Policy(err) => (StatusCode::FORBIDDEN, err.to_string()),
            Self::Auth(err) => match err {
                AuthError::MissingFields | AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, err.to_string()),
                AuthError::Token(_) | AuthError::Database(_) => internal(),
            },
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        }
    }
}

fn db_status(err: &DbError) -> (StatusCode, String) {
    match err {
        DbError::UnknownUser | DbError::NoIdFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DbError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
        DbError::UnableToDelete(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        DbError::Database(_) | DbError::DataCorruption(_) | DbError::PasswordHash(_) => internal(),
    }
}

// Don't expose internal error details to clients
fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
