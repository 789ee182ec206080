//! Core types for the pizza service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{NegativePrice, Price};
pub use role::{Role, RoleError, RoleKind};
