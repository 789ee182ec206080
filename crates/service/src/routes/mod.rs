//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                                   - Welcome document
//! GET    /api/docs                           - Endpoint catalogue
//!
//! # Auth (rate limited)
//! POST   /api/auth                           - Register a diner
//! PUT    /api/auth                           - Login
//! DELETE /api/auth                           - Logout
//!
//! # Users
//! GET    /api/user/me                        - Authenticated user
//! PUT    /api/user/{userId}                  - Update own profile (or any, as admin)
//!
//! # Orders
//! GET    /api/order/menu                     - Menu
//! PUT    /api/order/menu                     - Add menu item (admin)
//! GET    /api/order                          - Order history
//! POST   /api/order                          - Place an order
//!
//! # Franchises
//! GET    /api/franchise                      - List franchises
//! GET    /api/franchise/{userId}             - Franchises administered by a user
//! POST   /api/franchise                      - Create franchise (admin)
//! DELETE /api/franchise/{franchiseId}        - Delete franchise (admin)
//! POST   /api/franchise/{franchiseId}/store  - Create store
//! DELETE /api/franchise/{franchiseId}/store/{storeId} - Delete store
//! ```

pub mod auth;
pub mod docs;
pub mod franchise;
pub mod order;
pub mod user;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Version reported by the welcome document.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(auth::register).put(auth::login).delete(auth::logout),
        )
        .layer(auth_rate_limiter())
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(user::me))
        .route("/{user_id}", put(user::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/menu", get(order::menu).put(order::add_menu_item))
        .route("/", get(order::history).post(order::create))
}

/// Create the franchise routes router.
pub fn franchise_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(franchise::list).post(franchise::create))
        .route(
            "/{id}",
            get(franchise::list_for_user).delete(franchise::remove),
        )
        .route("/{franchise_id}/store", post(franchise::create_store))
        .route(
            "/{franchise_id}/store/{store_id}",
            delete(franchise::delete_store),
        )
}

/// Create the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/api/docs", get(docs::docs))
        .nest("/api/auth", auth_routes())
        .nest("/api/user", user_routes())
        .nest("/api/order", order_routes())
        .nest("/api/franchise", franchise_routes())
        .fallback(unknown_endpoint)
}

async fn welcome() -> impl IntoResponse {
    Json(json!({
        "message": "welcome to JWT Pizza",
        "version": VERSION,
    }))
}

async fn unknown_endpoint() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "unknown endpoint" })),
    )
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::test_support::{send, test_app};

    #[tokio::test]
    async fn test_welcome() {
        let (app, _) = test_app();
        let (status, body) = send(app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "welcome to JWT Pizza");
        assert_eq!(body["version"], super::VERSION);
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let (app, _) = test_app();
        let (status, body) = send(app, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "unknown endpoint");
    }

    #[tokio::test]
    async fn test_requests_are_tracked_by_route_template() {
        let (app, metrics) = test_app();
        let (status, _) = send(app, "PUT", "/api/user/7", Some("{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot.requests_by_endpoint.get("[PUT] /api/user/{user_id}"),
            Some(&1)
        );
        assert_eq!(snapshot.requests_by_method.get("PUT"), Some(&1));
    }

    #[tokio::test]
    async fn test_unknown_paths_share_one_metrics_key() {
        let (app, metrics) = test_app();
        for n in 0..50 {
            let (status, _) = send(app.clone(), "GET", &format!("/scan/{n}"), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_by_endpoint.len(), 1);
        assert_eq!(
            snapshot.requests_by_endpoint.get("[GET] <unmatched>"),
            Some(&50)
        );
    }
}
