//! Route table wiring.
//!
//! The public surface is the two user endpoints. Everything else falls
//! through to a private router behind [`AuthGate`], so an unknown path is
//! `401` without a token and `404` with one.

use std::sync::Arc;

use crate::method::Method;
use crate::middleware::AuthGate;
use crate::route::{ApiRoute, RouteDescriptor};
use crate::router::Router;
use crate::token::TokenCodec;
use crate::users;

/// Assembles the API router. `private` holds the authenticated routes.
pub fn router(codec: Arc<TokenCodec>, private: Router) -> Router {
    let gate = AuthGate::new(codec);

    Router::new()
        .route(&ApiRoute::CreateUser.descriptor(), users::create(gate.clone()))
        .route(&ApiRoute::GetUser.descriptor(),    users::exists(gate.clone()))
        // An empty id is still an existence check, not a private path.
        .route(&RouteDescriptor::new([Method::Get, Method::Head], "/users/"), users::exists(gate.clone()))
        .fallback(gate.protect_router(private))
}
