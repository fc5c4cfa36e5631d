//! Middleware layer.
//!
//! Cross-cutting request handling that wraps ordinary handlers. Request
//! logging lives in [`Router::dispatch`](crate::Router::dispatch); this module
//! holds the bearer-token gate.

mod auth;

pub use auth::{AuthGate, UserLookup};
