//! User profile routes.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use pizza_core::UserId;

use super::auth::AuthResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{User, UserUpdate};
use crate::policy;
use crate::state::AppState;

/// `GET /api/user/me`
pub async fn me(RequireAuth(auth): RequireAuth) -> Json<User> {
    Json(auth.user)
}

/// `PUT /api/user/{userId}`
///
/// The caller must be the target user or an admin. Answers with the updated
/// user and a fresh token carrying the new claims.
#[tracing::instrument(skip(state, auth, payload), fields(requester = %auth.user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<UserId>,
    payload: std::result::Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let grant = policy::authorize_user(&auth.user, user_id)?;
    let Json(update) = payload?;

    let user = state.db().users().update_user(&grant, &update).await?;
    let token = state.auth().set_auth(&user).await?;

    Ok(Json(AuthResponse { user, token }))
}
