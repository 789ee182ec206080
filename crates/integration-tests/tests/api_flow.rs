//! End-to-end HTTP flows against a live database.
//!
//! Skipped unless `PIZZA_TEST_DATABASE_URL` is set.

use axum::http::StatusCode;
use pizza_core::Role;
use pizza_integration_tests::{create_user, live_app, send, unique, unique_email};
use serde_json::{Value, json};

async fn register(app: &axum::Router) -> (Value, String, String) {
    let email = unique_email("diner").to_string();
    let (status, body) = send(
        app,
        "POST",
        "/api/auth",
        None,
        Some(json!({"name": "pizza diner", "email": email, "password": "diner"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["token"].as_str().unwrap().to_owned();
    (body["user"].clone(), email, token)
}

#[tokio::test]
async fn test_register_login_update_logout() {
    let Some((app, _db)) = live_app().await else { return };
    let (user, email, register_token) = register(&app).await;
    assert_eq!(user["roles"], json!([{"role": "diner"}]));
    assert!(user.get("password").is_none());
    assert_eq!(register_token.split('.').count(), 3);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/auth",
        None,
        Some(json!({"email": email, "password": "diner"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();

    let id = user["id"].as_i64().unwrap();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/user/{id}"),
        Some(&token),
        Some(json!({"name": "renamed diner"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["name"], "renamed diner");
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["roles"], user["roles"]);
    let fresh = body["token"].as_str().unwrap().to_owned();

    let (status, me) = send(&app, "GET", "/api/user/me", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "renamed diner");

    let (status, body) = send(&app, "DELETE", "/api/auth", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "logout successful");

    let (status, body) = send(&app, "GET", "/api/user/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_password_is_unknown_user() {
    let Some((app, _db)) = live_app().await else { return };
    let (_, email, _) = register(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/auth",
        None,
        Some(json!({"email": email, "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "unknown user");
}

#[tokio::test]
async fn test_diner_cannot_touch_other_accounts_or_admin_routes() {
    let Some((app, db)) = live_app().await else { return };
    let (_, _, token) = register(&app).await;
    let other = create_user(&db, Vec::new()).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/user/{}", other.id),
        Some(&token),
        Some(json!({"name": "hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "unauthorized");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/franchise/{}", other.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(
        &app,
        "POST",
        "/api/franchise",
        Some(&token),
        Some(json!({"name": unique("nope"), "admins": []})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/order/menu",
        Some(&token),
        Some(json!({"title": "x", "description": "x", "image": "x.png", "price": 0.01})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_manages_franchise_and_stores() {
    let Some((app, db)) = live_app().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let (status, body) = send(
        &app,
        "PUT",
        "/api/auth",
        None,
        Some(json!({"email": admin.email.as_str(), "password": "pizza"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();

    let owner = create_user(&db, Vec::new()).await;
    let name = unique("pizzaPocket");
    let (status, franchise) = send(
        &app,
        "POST",
        "/api/franchise",
        Some(&token),
        Some(json!({"name": name, "admins": [{"email": owner.email.as_str()}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{franchise}");
    let franchise_id = franchise["id"].as_i64().unwrap();
    assert_eq!(franchise["admins"][0]["id"], owner.id.as_i32());

    let (status, store) = send(
        &app,
        "POST",
        &format!("/api/franchise/{franchise_id}/store"),
        Some(&token),
        Some(json!({"name": "SLC"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store["franchiseId"], franchise_id);
    assert_eq!(store["name"], "SLC");

    let (status, page) = send(
        &app,
        "GET",
        &format!("/api/franchise?page=0&limit=5&name={name}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["more"], false);
    assert_eq!(page["franchises"][0]["stores"][0]["totalRevenue"], 0.0);

    let (status, page) = send(
        &app,
        "GET",
        &format!("/api/franchise?name={name}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["franchises"][0].get("admins").is_none());

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/franchise/{franchise_id}/store/{}", store["id"]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "store deleted");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/franchise/{franchise_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "franchise deleted");
}
