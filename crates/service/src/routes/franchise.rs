//! Franchise and store routes.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use pizza_core::{FranchiseId, StoreId, UserId};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::DEFAULT_FRANCHISE_LIMIT;
use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{Franchise, FranchisePage, NewFranchise, NewStore, Store, User};
use crate::policy::{self, FranchiseGrant, PolicyError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
}

/// `GET /api/franchise`
///
/// Admins get admins and revenue per store; everyone else gets store names.
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<FranchisePage>> {
    let (franchises, more) = state
        .db()
        .franchises()
        .get_franchises(
            auth.as_ref().map(|a| &a.user),
            query.page.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_FRANCHISE_LIMIT),
            query.name.as_deref().unwrap_or("*"),
        )
        .await?;

    Ok(Json(FranchisePage { franchises, more }))
}

/// `GET /api/franchise/{userId}`
///
/// Anyone other than the user or an admin gets an empty list.
pub async fn list_for_user(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Franchise>>> {
    let Ok(grant) = policy::authorize_user(&auth.user, user_id) else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(
        state.db().franchises().get_user_franchises(&grant).await?,
    ))
}

/// `POST /api/franchise`
#[tracing::instrument(skip(state, auth, payload), fields(requester = %auth.user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    payload: std::result::Result<Json<NewFranchise>, JsonRejection>,
) -> Result<Json<Franchise>> {
    let grant = policy::authorize_admin(&auth.user)?;
    let Json(franchise) = payload?;

    Ok(Json(
        state
            .db()
            .franchises()
            .create_franchise(&grant, &franchise)
            .await?,
    ))
}

/// `DELETE /api/franchise/{franchiseId}`
#[tracing::instrument(skip(state, auth), fields(requester = %auth.user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(franchise_id): Path<FranchiseId>,
) -> Result<Json<Value>> {
    let grant = policy::authorize_admin(&auth.user)?;
    state
        .db()
        .franchises()
        .delete_franchise(&grant, franchise_id)
        .await?;

    Ok(Json(json!({ "message": "franchise deleted" })))
}

/// Authorize store management, treating a missing franchise as a denial.
async fn franchise_grant(
    state: &AppState,
    user: &User,
    franchise_id: FranchiseId,
) -> Result<FranchiseGrant> {
    let franchise = state
        .db()
        .franchises()
        .get_franchise(franchise_id)
        .await?
        .ok_or(PolicyError::Unauthorized)?;
    Ok(policy::authorize_franchise(user, &franchise)?)
}

/// `POST /api/franchise/{franchiseId}/store`
#[tracing::instrument(skip(state, auth, payload), fields(requester = %auth.user.id))]
pub async fn create_store(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(franchise_id): Path<FranchiseId>,
    payload: std::result::Result<Json<NewStore>, JsonRejection>,
) -> Result<Json<Store>> {
    let grant = franchise_grant(&state, &auth.user, franchise_id).await?;
    let Json(store) = payload?;

    Ok(Json(
        state.db().franchises().create_store(&grant, &store).await?,
    ))
}

/// `DELETE /api/franchise/{franchiseId}/store/{storeId}`
#[tracing::instrument(skip(state, auth), fields(requester = %auth.user.id))]
pub async fn delete_store(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path((franchise_id, store_id)): Path<(FranchiseId, StoreId)>,
) -> Result<Json<Value>> {
    let grant = franchise_grant(&state, &auth.user, franchise_id).await?;
    state
        .db()
        .franchises()
        .delete_store(&grant, store_id)
        .await?;

    Ok(Json(json!({ "message": "store deleted" })))
}
