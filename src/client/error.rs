//! Everything a client call can fail with.
//!
//! The variants separate "the server said no" ([`ClientError::Domain`]) from
//! "the request never made sense" (route and path errors) and from "the
//! server's answer made no sense" (parse failures, unexpected status).

use crate::domain_error::{DomainError, ErrorKind};
use crate::method::Method;
use crate::route::RouteError;

/// A failure reported by the underlying transport (connection refused,
/// timeout, TLS), passed through untouched.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("route does not define any HTTP methods")]
    NoMethodsDefined,

    #[error("route defines multiple non-HEAD/OPTIONS methods: {0:?}")]
    AmbiguousMethod(Vec<Method>),

    #[error("unable to generate request path")]
    PathExpansionFailed(#[source] RouteError),

    #[error("authorization token is not a valid header value")]
    InvalidAuthorization(#[source] http::header::InvalidHeaderValue),

    #[error("transport: {0}")]
    Transport(#[source] TransportError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("unable to parse response body")]
    ResponseParseFailed(#[source] serde_json::Error),

    #[error("unable to parse error body")]
    ErrorBodyParseFailed(#[source] serde_json::Error),

    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),
}

impl ClientError {
    /// The application error, if the server sent one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.domain().map(|e| e.kind)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == Some(ErrorKind::Unauthorized)
    }
}

impl From<RouteError> for ClientError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::NoMethodsDefined => Self::NoMethodsDefined,
            RouteError::AmbiguousMethod(methods) => Self::AmbiguousMethod(methods),
            other => Self::PathExpansionFailed(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_errors_map_onto_build_errors() {
        assert!(matches!(
            ClientError::from(RouteError::NoMethodsDefined),
            ClientError::NoMethodsDefined
        ));
        assert!(matches!(
            ClientError::from(RouteError::MissingVariable("id".to_owned())),
            ClientError::PathExpansionFailed(RouteError::MissingVariable(_))
        ));
    }

    #[test]
    fn kind_helpers() {
        let err = ClientError::from(DomainError::not_found("gone"));
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
        assert_eq!(ClientError::UnexpectedStatus(418).kind(), None);
    }
}
