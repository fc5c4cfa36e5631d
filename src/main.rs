//! saypi server.
//!
//! Run with:
//!   SAYPI_USER_SECRET=dev RUST_LOG=info cargo run
//!
//! Try:
//!   curl -X POST http://localhost:3000/users
//!   curl -i http://localhost:3000/users/<id>
//!   curl -i -H 'authorization: Bearer <id>' http://localhost:3000/moods

use std::sync::Arc;

use saypi::config::Config;
use saypi::{Router, Server, TokenCodec, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), saypi::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let codec = Arc::new(TokenCodec::new(&config.user_secret));
    let router = app::router(codec, Router::new());

    Server::bind(config.addr).await?.serve(router).await
}
