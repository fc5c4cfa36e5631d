//! # saypi
//!
//! The say API: a small HTTP service and its typed client, sharing one
//! route table and one error format.
//!
//! ## Authentication
//!
//! Users are stateless. `POST /users` mints a random 16-byte [`Identity`] and
//! returns it as a [`Token`]: the identity followed by its HMAC-SHA256 under
//! the server secret, base64url-encoded. Nothing is stored; a token is valid
//! exactly when its MAC checks out. [`AuthGate`](middleware::AuthGate) guards
//! everything outside the public user endpoints with
//! `Authorization: Bearer <token>`.
//!
//! ## Routes as data
//!
//! Each endpoint is a [`RouteDescriptor`]: its methods and a `{name}` path
//! template. The server registers handlers from it; the
//! [`Client`](client::Client) builds requests from it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saypi::{Router, Server, TokenCodec, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), saypi::Error> {
//!     let codec = Arc::new(TokenCodec::new(b"change me"));
//!     let router = app::router(codec, Router::new());
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap())
//!         .await?
//!         .serve(router)
//!         .await
//! }
//! ```

mod domain_error;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod route;
mod router;
mod server;
mod token;

pub mod app;
pub mod client;
pub mod config;
pub mod middleware;
pub mod users;

pub use domain_error::{DomainError, ErrorKind};
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use route::{ApiRoute, RouteDescriptor, RouteError, Vars};
pub use router::Router;
pub use server::{MAX_BODY_LEN, Server};
pub use token::{IDENTITY_LEN, Identity, MAC_LEN, Token, TokenCodec};
