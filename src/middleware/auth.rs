//! Bearer-token authentication.
//!
//! [`AuthGate`] sits in front of protected handlers. It reads
//! `Authorization: Bearer <token>`, verifies the token with the shared
//! [`TokenCodec`], and either answers `401 Unauthorized` itself or calls the
//! handler with the caller's [`Identity`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saypi::middleware::AuthGate;
//! use saypi::{Identity, Method, Request, Router, TokenCodec};
//!
//! async fn whoami(_req: Request, who: Identity) -> String {
//!     who.to_string()
//! }
//!
//! let gate = AuthGate::new(Arc::new(TokenCodec::new(b"secret")));
//! let app = Router::new().on(Method::Get, "/whoami", gate.protect(whoami));
//! ```

use std::future::Future;
use std::sync::Arc;

use http::HeaderMap;
use http::header::AUTHORIZATION;
use tracing::debug;

use crate::domain_error::DomainError;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::token::{Identity, TokenCodec};

const BEARER: &str = "Bearer ";

/// Outcome of an existence check. Malformed and never-issued ids are both
/// `NotFound`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserLookup {
    Exists(Identity),
    NotFound,
}

/// Why a request was turned away. Logged, never sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Rejection {
    MissingBearer,
    InvalidToken,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingBearer => "You must provide a Bearer token in an Authorization header",
            Self::InvalidToken  => "Invalid authentication string",
        };
        DomainError::unauthorized(message).into_response()
    }
}

/// Verifies bearer tokens in front of protected handlers.
///
/// Holds nothing but the codec, so clones are cheap and share one secret.
#[derive(Clone, Debug)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Resolves the caller behind an `Authorization` header, if any.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<Identity> {
        authenticate(&self.codec, headers).ok()
    }

    /// Existence check for a candidate user id.
    pub fn user_exists(&self, candidate: &str) -> UserLookup {
        match self.codec.verify(candidate) {
            Some(identity) => UserLookup::Exists(identity),
            None => UserLookup::NotFound,
        }
    }

    /// Wraps a handler that needs a caller.
    ///
    /// On success the identity is stored on the request (see
    /// [`Request::identity`]) and also passed as the second argument, so the
    /// handler cannot run without one.
    pub fn protect<F, Fut, R>(&self, handler: F) -> impl Handler + use<F, Fut, R>
    where
        F: Fn(Request, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        let codec = Arc::clone(&self.codec);
        let handler = Arc::new(handler);
        move |mut req: Request| {
            let verdict = authenticate(&codec, &req.headers);
            let handler = Arc::clone(&handler);
            async move {
                match verdict {
                    Ok(identity) => {
                        req.identity = Some(identity);
                        (*handler)(req, identity).await.into_response()
                    }
                    Err(rejection) => {
                        debug!(path = req.path(), reason = ?rejection, "rejected request");
                        rejection.into_response()
                    }
                }
            }
        }
    }

    /// Puts a whole router behind the gate.
    pub fn protect_router(&self, router: Router) -> impl Handler + use<> {
        let router = Arc::new(router);
        self.protect(move |req: Request, _who: Identity| {
            let router = Arc::clone(&router);
            async move { router.call(req).await }
        })
    }
}

fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<Identity, Rejection> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER))
        .ok_or(Rejection::MissingBearer)?;
    codec.verify(token).ok_or(Rejection::InvalidToken)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::method::Method;

    fn gate() -> AuthGate {
        AuthGate::new(Arc::new(TokenCodec::new(b"gate secret")))
    }

    fn request(auth: Option<&str>) -> http::Request<Bytes> {
        let mut builder = http::Request::get("/whoami");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Bytes::new()).unwrap()
    }

    /// Router whose one protected route counts calls and echoes the caller.
    fn app(gate: &AuthGate, calls: Arc<AtomicUsize>) -> Router {
        Router::new().on(
            Method::Get,
            "/whoami",
            gate.protect(move |req: Request, who: Identity| {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(req.identity(), Some(&who));
                async move { who.to_string() }
            }),
        )
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_identity() {
        let gate = gate();
        let identity = Identity::random();
        let token = gate.codec().issue_for(&identity);
        let calls = Arc::new(AtomicUsize::new(0));
        let router = app(&gate, Arc::clone(&calls));

        let res = router.dispatch(request(Some(&format!("Bearer {token}")))).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), identity.to_string().as_bytes());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mutated_token_is_401_and_handler_skipped() {
        let gate = gate();
        let mut token = gate.codec().issue().into_string();
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });
        let calls = Arc::new(AtomicUsize::new(0));
        let router = app(&gate, Arc::clone(&calls));

        let res = router.dispatch(request(Some(&format!("Bearer {token}")))).await;

        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        let err: DomainError = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(err.kind, crate::ErrorKind::Unauthorized);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_401() {
        let gate = gate();
        let token = gate.codec().issue();
        let calls = Arc::new(AtomicUsize::new(0));
        let router = app(&gate, Arc::clone(&calls));

        for auth in [
            None,
            Some(token.as_str().to_owned()),
            Some(format!("bearer {token}")),
            Some(format!("Basic {token}")),
            Some(format!("Bearer  {token}")),
        ] {
            let res = router.dispatch(request(auth.as_deref())).await;
            assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED, "{auth:?}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn token_from_other_secret_is_401() {
        let token = TokenCodec::new(b"elsewhere").issue();
        let router = app(&gate(), Arc::new(AtomicUsize::new(0)));
        let res = router.dispatch(request(Some(&format!("Bearer {token}")))).await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_router_sees_identity() {
        let gate = gate();
        let identity = Identity::random();
        let token = gate.codec().issue_for(&identity);
        let private = Router::new().on(Method::Get, "/whoami", |req: Request| async move {
            req.identity().map(ToString::to_string).unwrap_or_default()
        });
        let router = Router::new().fallback(gate.protect_router(private));

        let res = router.dispatch(request(Some(&format!("Bearer {token}")))).await;
        assert_eq!(res.body(), identity.to_string().as_bytes());

        let res = router.dispatch(request(None)).await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn user_exists_conflates_malformed_and_unissued() {
        let gate = gate();
        let token = gate.codec().issue();
        assert!(matches!(gate.user_exists(token.as_str()), UserLookup::Exists(_)));
        assert_eq!(gate.user_exists("garbage"), UserLookup::NotFound);
        let unissued = TokenCodec::new(b"other").issue();
        assert_eq!(gate.user_exists(unissued.as_str()), UserLookup::NotFound);
    }

    #[test]
    fn authenticate_reads_header() {
        let gate = gate();
        let identity = Identity::random();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", gate.codec().issue_for(&identity)).parse().unwrap(),
        );
        assert_eq!(gate.authenticate(&headers), Some(identity));
        assert_eq!(gate.authenticate(&HeaderMap::new()), None);
    }
}
