//! Pizza Core - Shared types library.
//!
//! This crate provides the types shared by the pizza service components:
//! - `service` - HTTP API and data access layer
//! - `cli` - Command-line tools for schema bootstrap and user seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is opt-in through the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
