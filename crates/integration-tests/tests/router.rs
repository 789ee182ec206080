//! HTTP behavior that answers before touching the database.
//!
//! The router runs over a pool that never connects, so every request here
//! must be answered by routing, extraction, validation or authentication.

use axum::http::StatusCode;
use pizza_integration_tests::{offline_app, send};
use serde_json::json;

// =============================================================================
// Public documents
// =============================================================================

#[tokio::test]
async fn test_welcome_document() {
    let app = offline_app();
    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "welcome to JWT Pizza");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_docs() {
    let app = offline_app();
    let (status, body) = send(&app, "GET", "/api/docs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["endpoints"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let app = offline_app();
    for uri in ["/api/pizza", "/nope/deeper"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["message"], "unknown endpoint");
    }
}

// =============================================================================
// Authentication gate
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = offline_app();
    let protected = [
        ("DELETE", "/api/auth"),
        ("GET", "/api/user/me"),
        ("PUT", "/api/user/1"),
        ("PUT", "/api/order/menu"),
        ("GET", "/api/order"),
        ("POST", "/api/order"),
        ("GET", "/api/franchise/1"),
        ("POST", "/api/franchise"),
        ("DELETE", "/api/franchise/1"),
        ("POST", "/api/franchise/1/store"),
        ("DELETE", "/api/franchise/1/store/1"),
    ];

    for (method, uri) in protected {
        let (status, body) = send(&app, method, uri, None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["message"], "unauthorized", "{method} {uri}");
    }
}

// =============================================================================
// Registration validation
// =============================================================================

#[tokio::test]
async fn test_register_missing_fields() {
    let app = offline_app();
    let bodies = [
        json!({}),
        json!({"name": "d", "email": "d@jwt.com"}),
        json!({"name": "", "email": "d@jwt.com", "password": "diner"}),
    ];
    for body in bodies {
        let (status, answer) = send(&app, "POST", "/api/auth", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(answer["message"], "name, email, and password are required");
    }
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let app = offline_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({"name": "d", "email": "not-an-email", "password": "diner"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
