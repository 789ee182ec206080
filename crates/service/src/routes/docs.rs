//! Endpoint catalogue.

use axum::Json;
use serde::Serialize;

use super::VERSION;

/// One documented endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub requires_auth: bool,
    pub description: &'static str,
}

const fn endpoint(
    method: &'static str,
    path: &'static str,
    requires_auth: bool,
    description: &'static str,
) -> Endpoint {
    Endpoint {
        method,
        path,
        requires_auth,
        description,
    }
}

pub const ENDPOINTS: &[Endpoint] = &[
    endpoint("POST", "/api/auth", false, "Register a new diner"),
    endpoint("PUT", "/api/auth", false, "Login existing user"),
    endpoint("DELETE", "/api/auth", true, "Logout a user"),
    endpoint("GET", "/api/user/me", true, "Get authenticated user"),
    endpoint("PUT", "/api/user/{userId}", true, "Update user"),
    endpoint("GET", "/api/order/menu", false, "Get the pizza menu"),
    endpoint("PUT", "/api/order/menu", true, "Add an item to the menu"),
    endpoint("GET", "/api/order", true, "Get the orders for the authenticated user"),
    endpoint("POST", "/api/order", true, "Create an order for the authenticated user"),
    endpoint("GET", "/api/franchise", false, "List all the franchises"),
    endpoint("GET", "/api/franchise/{userId}", true, "List a user's franchises"),
    endpoint("POST", "/api/franchise", true, "Create a new franchise"),
    endpoint("DELETE", "/api/franchise/{franchiseId}", true, "Delete a franchise"),
    endpoint("POST", "/api/franchise/{franchiseId}/store", true, "Create a new franchise store"),
    endpoint(
        "DELETE",
        "/api/franchise/{franchiseId}/store/{storeId}",
        true,
        "Delete a store",
    ),
];

#[derive(Debug, Serialize)]
pub struct Docs {
    pub version: &'static str,
    pub endpoints: &'static [Endpoint],
}

/// `GET /api/docs`
pub async fn docs() -> Json<Docs> {
    Json(Docs {
        version: VERSION,
        endpoints: ENDPOINTS,
    })
}
