//! Typed client for the API.
//!
//! A call is three steps: [`RequestBuilder`] turns a route into an
//! [`OutboundRequest`], a [`Transport`] executes it, and
//! [`translate`](response::translate) interprets the answer.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), saypi::client::ClientError> {
//! use saypi::client::Client;
//!
//! let mut client = Client::new("http://localhost:3000/".parse().unwrap());
//! let user = client.create_user().await?;
//! client.set_authorization(user.id.clone());
//! assert!(client.user_exists(&user.id).await?);
//! # Ok(())
//! # }
//! ```
//!
//! [`Client::for_router`] runs the same calls in-process against a
//! [`Router`], which is how the integration tests drive the API.

mod error;
mod request;
pub mod response;

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

pub use error::{ClientError, TransportError};
pub use request::{Form, OutboundRequest, RequestBuilder};

use crate::route::{ApiRoute, RouteDescriptor, RouteError, Vars};
use crate::router::Router;
use crate::users::User;

// ── Transport ─────────────────────────────────────────────────────────────────

/// Executes an [`OutboundRequest`]. Timeouts and cancellation are the
/// transport's business; its errors reach the caller as
/// [`ClientError::Transport`].
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<http::Response<Bytes>, TransportError>> + Send;
}

/// Sends requests over the network with reqwest.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<http::Response<Bytes>, TransportError> {
        let OutboundRequest { method, url, headers, body } = request;

        let mut builder = self.client.request(method.into(), url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let res = builder.send().await?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?;

        let mut out = http::Response::new(body);
        *out.status_mut() = status;
        *out.headers_mut() = headers;
        Ok(out)
    }
}

/// Hands requests straight to a [`Router`] in the same process.
#[derive(Clone)]
pub struct LocalTransport {
    router: Arc<Router>,
}

impl LocalTransport {
    pub fn new(router: Router) -> Self {
        Self { router: Arc::new(router) }
    }
}

impl Transport for LocalTransport {
    async fn send(&self, request: OutboundRequest) -> Result<http::Response<Bytes>, TransportError> {
        let req = request.into_http()?;
        Ok(self.router.dispatch(req).await.into_http())
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// API client bound to one base URL and, optionally, one user's token.
pub struct Client<T = HttpTransport> {
    base_url: Url,
    transport: T,
    token: Option<String>,
}

impl Client<HttpTransport> {
    pub fn new(base_url: Url) -> Self {
        Self::with_transport(base_url, HttpTransport::default())
    }

    /// Uses a preconfigured reqwest client (timeouts, proxies, TLS roots).
    pub fn with_http_client(base_url: Url, client: reqwest::Client) -> Self {
        Self::with_transport(base_url, HttpTransport::new(client))
    }
}

impl Client<LocalTransport> {
    /// A client that calls `router` directly, without a socket.
    pub fn for_router(router: Router) -> Self {
        let base_url = Url::parse("http://localhost/").expect("static URL is valid");
        Self::with_transport(base_url, LocalTransport::new(router))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(base_url: Url, transport: T) -> Self {
        Self { base_url, transport, token: None }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends `Authorization: Bearer <token>` on every following request.
    pub fn set_authorization(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_authorization(&mut self) {
        self.token = None;
    }

    pub fn new_request(
        &self,
        route: &RouteDescriptor,
        vars: &Vars,
        form: Option<&Form>,
    ) -> Result<OutboundRequest, ClientError> {
        let mut builder = RequestBuilder::new(&self.base_url);
        if let Some(token) = &self.token {
            builder = builder.bearer(token);
        }
        builder.build(route, vars, form)
    }

    /// Executes a request and returns the raw response, whatever its status.
    pub async fn send(&self, request: OutboundRequest) -> Result<http::Response<Bytes>, ClientError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        self.transport.send(request).await.map_err(ClientError::Transport)
    }

    /// Builds, sends and decodes a call that answers with a JSON payload.
    pub async fn execute<R: DeserializeOwned>(
        &self,
        route: &RouteDescriptor,
        vars: &Vars,
        form: Option<&Form>,
    ) -> Result<R, ClientError> {
        let res = self.send(self.new_request(route, vars, form)?).await?;
        response::translate(&res)
    }

    /// Like [`execute`](Self::execute) for calls whose success has no payload.
    pub async fn execute_empty(
        &self,
        route: &RouteDescriptor,
        vars: &Vars,
        form: Option<&Form>,
    ) -> Result<StatusCode, ClientError> {
        let res = self.send(self.new_request(route, vars, form)?).await?;
        response::translate_empty(&res)?;
        Ok(res.status())
    }

    /// Mints a new user. Its `id` is the bearer token for later calls.
    pub async fn create_user(&self) -> Result<User, ClientError> {
        self.execute(&ApiRoute::CreateUser.descriptor(), &Vars::new(), None).await
    }

    /// `true` if `id` names a user this server issued.
    pub async fn user_exists(&self, id: &str) -> Result<bool, ClientError> {
        let user = User { id: id.to_owned() };
        let req = match self.new_request(&ApiRoute::GetUser.descriptor(), &Vars::from(&user), None) {
            Ok(req) => req,
            // An id that cannot be a path segment names no user.
            Err(ClientError::PathExpansionFailed(RouteError::InvalidSegment { .. })) => return Ok(false),
            Err(e) => return Err(e),
        };
        let res = self.send(req).await?;

        // The existence check answers 404 without a body.
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response::translate_empty(&res)?;
        Ok(res.status() == StatusCode::NO_CONTENT)
    }
}
