//! Registration, login and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::db::DbError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Registration body. Fields are optional so a missing one answers 400
/// with a message rather than a deserialization error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user and a freshly issued bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// `POST /api/auth`
#[tracing::instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(body) = payload?;
    let (user, token) = state
        .auth()
        .register(
            body.name.as_deref(),
            body.email.as_deref(),
            body.password.as_deref(),
        )
        .await?;

    state.metrics().record_auth(true);
    state.metrics().user_logged_in();
    tracing::info!(user_id = %user.id, "Diner registered");

    Ok(Json(AuthResponse { user, token }))
}

/// `PUT /api/auth`
#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(body) = payload?;
    match state.auth().login(&body.email, &body.password).await {
        Ok((user, token)) => {
            state.metrics().record_auth(true);
            state.metrics().user_logged_in();
            Ok(Json(AuthResponse { user, token }))
        }
        Err(e) => {
            if matches!(e, AuthError::Database(DbError::UnknownUser)) {
                state.metrics().record_auth(false);
            }
            Err(AppError::from(e))
        }
    }
}

/// `DELETE /api/auth`
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Value>> {
    state.auth().logout(&auth.token).await?;
    state.metrics().user_logged_out();

    Ok(Json(json!({ "message": "logout successful" })))
}
