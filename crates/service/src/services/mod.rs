//! Service layer.
//!
//! - `auth` - Registration, login, logout and bearer-token authentication
//! - `factory` - Pizza factory client

pub mod auth;
pub mod factory;
