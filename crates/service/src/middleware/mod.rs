//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (tag span, Sentry scope and response)
//! 4. Request tracker (metrics per matched route)
//! 5. Rate limiting on `/api/auth` (governor)

pub mod auth;
pub mod metrics;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthUser, OptionalAuth, RequireAuth};
pub use metrics::{UNMATCHED_ROUTE, track_requests};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
