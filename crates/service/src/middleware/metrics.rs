//! Request tracker feeding the metrics aggregator.

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Route key for requests that match no route.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Method key for extension methods outside the standard set.
const OTHER_METHOD: &str = "OTHER";

/// Count every request under its method and matched route template.
///
/// Requests that match no route share [`UNMATCHED_ROUTE`], so probing random
/// paths cannot grow the endpoint table.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = method_key(request.method());
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str);

    state.metrics().record_request(method, route);
    next.run(request).await
}

fn method_key(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::CONNECT => "CONNECT",
        Method::TRACE => "TRACE",
        _ => OTHER_METHOD,
    }
}
