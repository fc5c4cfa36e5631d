//! Unified infrastructure error type.

use crate::config::ConfigError;

/// The error type returned by the server and process setup.
///
/// Application-level errors (404, 401, etc.) are expressed as HTTP responses
/// carrying a [`DomainError`](crate::DomainError), not as `Error`s. This type
/// surfaces infrastructure failures: bad configuration, binding to a port or
/// accepting a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}
