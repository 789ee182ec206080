//! JWT Pizza service library.
//!
//! The HTTP API of the pizza chain: diners, the menu, franchises, stores
//! and orders. Data access is scoped by the authorization policy in
//! [`policy`]; the binary in `main.rs` wires configuration, the database,
//! metrics and the router built by [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::{Method, StatusCode, header},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(from_fn_with_state(state.clone(), middleware::track_requests))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.db().pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::middleware::REQUEST_ID_HEADER;
    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let (status, _) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let (app, _) = test_app();
        let (status, _) = send(app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let (app, _) = test_app();
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "req-123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }

    #[tokio::test]
    async fn test_oversized_request_id_is_replaced() {
        let (app, _) = test_app();
        let oversized = "x".repeat(4096);
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, oversized.as_str())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let echoed = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert_ne!(echoed, oversized);
        assert!(uuid::Uuid::parse_str(echoed).is_ok());
    }
}
