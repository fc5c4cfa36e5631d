//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Requests nothing matches
//! go to the fallback handler if one is set, otherwise they get a JSON 404.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use matchit::Router as MatchitRouter;
use tracing::info;

use crate::domain_error::{DomainError, ErrorKind};
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::route::RouteDescriptor;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so they chain naturally.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if the path is invalid or conflicts with an existing route.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(&[method], path, handler.into_boxed_handler())
    }

    /// Registers a handler under every method a descriptor accepts.
    ///
    /// ```rust,no_run
    /// # use saypi::{ApiRoute, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// Router::new().route(&ApiRoute::GetUser.descriptor(), get_user);
    /// ```
    pub fn route(self, route: &RouteDescriptor, handler: impl Handler) -> Self {
        self.add(route.methods(), route.template(), handler.into_boxed_handler())
    }

    /// Handles every request no route matched.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    fn add(mut self, methods: &[Method], path: &str, handler: BoxedHandler) -> Self {
        for &method in methods {
            self.routes
                .entry(method)
                .or_default()
                .insert(path, Arc::clone(&handler))
                .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        }
        self
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, Vec<(String, String)>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Routes a request that has already been parsed.
    pub async fn call(&self, mut req: Request) -> Response {
        match self.lookup(req.method, req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(req).await
            }
            None => match &self.fallback {
                Some(fallback) => fallback.call(req).await,
                None => DomainError::not_found(format!("no route for {}", req.path())).into_response(),
            },
        }
    }

    /// Routes one fully-read HTTP request and logs the outcome.
    ///
    /// Independent of any socket, so the same path serves the network server
    /// and in-process clients.
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> Response {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_owned();

        let response = match Method::try_from(&parts.method) {
            Ok(method) => self.call(Request::new(method, parts.uri, parts.headers, body)).await,
            Err(()) => DomainError::new(
                ErrorKind::MethodNotAllowed,
                format!("unsupported method {}", parts.method),
            )
            .into_response(),
        };

        info!(
            method = %parts.method,
            path = %path,
            status = response.status.as_u16(),
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "request"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    fn get(path: &str) -> http::Request<Bytes> {
        http::Request::get(path).body(Bytes::new()).unwrap()
    }

    async fn echo_id(req: Request) -> String {
        req.param("id").unwrap_or_default().to_owned()
    }

    #[tokio::test]
    async fn matches_and_decodes_params() {
        let router = Router::new().on(Method::Get, "/users/{id}", echo_id);
        let res = router.dispatch(get("/users/a%20b")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"a b");
    }

    #[tokio::test]
    async fn descriptor_registers_every_method() {
        let route = RouteDescriptor::new([Method::Get, Method::Head], "/users/{id}");
        let router = Router::new().route(&route, echo_id);

        let head = http::Request::head("/users/7").body(Bytes::new()).unwrap();
        assert_eq!(router.dispatch(head).await.status_code(), StatusCode::OK);
        assert_eq!(router.dispatch(get("/users/7")).await.body(), b"7");
    }

    #[tokio::test]
    async fn miss_without_fallback_is_json_404() {
        let res = Router::new().dispatch(get("/nowhere")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        let err: DomainError = serde_json::from_slice(res.body()).unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn miss_goes_to_fallback() {
        let router = Router::new()
            .on(Method::Get, "/users/{id}", echo_id)
            .fallback(|_req: Request| async { StatusCode::IM_A_TEAPOT });
        assert_eq!(router.dispatch(get("/moods")).await.status_code(), StatusCode::IM_A_TEAPOT);
        let post = http::Request::post("/users/1").body(Bytes::new()).unwrap();
        assert_eq!(router.dispatch(post).await.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn unknown_method_is_405() {
        let req = http::Request::builder()
            .method("PURGE")
            .uri("/users/1")
            .body(Bytes::new())
            .unwrap();
        let res = Router::new().dispatch(req).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    #[should_panic(expected = "invalid route `GET /users/{id}`")]
    fn conflicting_route_panics() {
        let _ = Router::new()
            .on(Method::Get, "/users/{id}", echo_id)
            .on(Method::Get, "/users/{id}", echo_id);
    }
}
