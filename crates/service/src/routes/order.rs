//! Menu and order routes.

use std::time::Instant;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{MenuItem, NewMenuItem, NewOrder, Order, OrderHistory};
use crate::policy;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
}

/// A fulfilled order with the factory's receipt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order: Order,
    pub follow_link_to_end_chaos: Option<String>,
    pub jwt: String,
}

/// `GET /api/order/menu`
pub async fn menu(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>> {
    Ok(Json(state.db().menu().get_menu().await?))
}

/// `PUT /api/order/menu`
///
/// Admin only. Answers with the whole menu after the insert.
pub async fn add_menu_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    payload: std::result::Result<Json<NewMenuItem>, JsonRejection>,
) -> Result<Json<Vec<MenuItem>>> {
    let grant = policy::authorize_admin(&auth.user)?;
    let Json(item) = payload?;

    let menu = state.db().menu();
    menu.add_menu_item(&grant, &item).await?;
    Ok(Json(menu.get_menu().await?))
}

/// `GET /api/order`
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<OrderHistory>> {
    let history = state
        .db()
        .orders()
        .get_orders(
            &auth.user,
            query.page.unwrap_or(1),
            state.config().list_per_page,
        )
        .await?;
    Ok(Json(history))
}

/// `POST /api/order`
///
/// Stores the order, then has the factory bake it. A factory failure leaves
/// the stored order in place and answers 500 with the factory's report link.
#[tracing::instrument(skip(state, auth, payload), fields(diner = %auth.user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    payload: std::result::Result<Json<NewOrder>, JsonRejection>,
) -> Result<Response> {
    let Json(new_order) = payload?;
    let order = state
        .db()
        .orders()
        .add_diner_order(&auth.user, &new_order)
        .await?;

    let started = Instant::now();
    let result = state.factory().fulfill(&auth.user, &order).await;
    let latency = started.elapsed();

    match result {
        Ok(receipt) => {
            state
                .metrics()
                .record_purchase(order.items.len(), order.total().amount(), latency);
            Ok(Json(OrderReceipt {
                order,
                follow_link_to_end_chaos: receipt.report_url,
                jwt: receipt.jwt,
            })
            .into_response())
        }
        Err(e) => {
            state.metrics().record_purchase_failure(latency);
            tracing::error!(error = %e, order_id = %order.id, "Factory failed to fulfill order");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to fulfill order at factory",
                    "followLinkToEndChaos": e.report_url(),
                })),
            )
                .into_response())
        }
    }
}
