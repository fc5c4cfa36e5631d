//! Application-level errors and their JSON wire form.
//!
//! The server renders a [`DomainError`] as
//! `{"kind": "not_found", "message": "..."}` with the status its kind maps to;
//! the client decodes the same shape back so callers branch on
//! [`ErrorKind`] rather than on message text.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::response::{IntoResponse, Response};

/// Machine-readable error category.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    PayloadTooLarge,
    InvalidParams,
    Internal,
    /// Any kind this build does not know about.
    #[serde(other)]
    Other,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest       => "bad_request",
            Self::Unauthorized     => "unauthorized",
            Self::Forbidden        => "forbidden",
            Self::NotFound         => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Conflict         => "conflict",
            Self::PayloadTooLarge  => "payload_too_large",
            Self::InvalidParams    => "invalid_params",
            Self::Internal         => "internal",
            Self::Other            => "other",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest       => StatusCode::BAD_REQUEST,
            Self::Unauthorized     => StatusCode::UNAUTHORIZED,
            Self::Forbidden        => StatusCode::FORBIDDEN,
            Self::NotFound         => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict         => StatusCode::CONFLICT,
            Self::PayloadTooLarge  => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidParams    => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal | Self::Other => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Reverse of [`status`](Self::status) for the statuses the API emits.
    /// `None` means the status is not one the API uses for errors.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::BAD_REQUEST           => Some(Self::BadRequest),
            StatusCode::UNAUTHORIZED          => Some(Self::Unauthorized),
            StatusCode::FORBIDDEN             => Some(Self::Forbidden),
            StatusCode::NOT_FOUND             => Some(Self::NotFound),
            StatusCode::METHOD_NOT_ALLOWED    => Some(Self::MethodNotAllowed),
            StatusCode::CONFLICT              => Some(Self::Conflict),
            StatusCode::PAYLOAD_TOO_LARGE     => Some(Self::PayloadTooLarge),
            StatusCode::UNPROCESSABLE_ENTITY  => Some(Self::InvalidParams),
            StatusCode::INTERNAL_SERVER_ERROR => Some(Self::Internal),
            _                                 => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error the API reports to its callers.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DomainError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, "internal server error")
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        // Serialising two strings cannot fail; fall back to a bare status anyway.
        match serde_json::to_vec(&self) {
            Ok(body) => Response::builder().status(self.kind.status()).json(body),
            Err(_)   => Response::status(self.kind.status()),
        }
    }
}
