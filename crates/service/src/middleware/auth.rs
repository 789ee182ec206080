//! Authentication extractors.
//!
//! A request is authenticated by `Authorization: Bearer <token>` when the
//! token's session row exists and the token verifies.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// An authenticated caller and the token it presented.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

/// Extract the bearer token from the request headers.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
    let user = state.auth().authenticate(token).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(AuthUser {
        user,
        token: token.to_string(),
    })
}

/// Extractor that requires an authenticated caller.
///
/// Rejects with 401 `{"message": "unauthorized"}` when the token is missing,
/// invalid or logged out.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(auth): RequireAuth) -> Json<User> {
///     Json(auth.user)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

/// Extractor that optionally gets the authenticated caller.
///
/// Unlike `RequireAuth`, this never rejects: a missing or invalid token
/// yields `None`.
pub struct OptionalAuth(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(auth) => Ok(Self(Some(auth))),
            Err(AppError::Unauthorized | AppError::Auth(AuthError::Unauthenticated)) => Ok(Self(None)),
            Err(e) => {
                tracing::warn!(error = %e, "Optional authentication failed");
                Ok(Self(None))
            }
        }
    }
}
