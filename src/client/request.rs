//! Turning a [`RouteDescriptor`] into a concrete HTTP request.
//!
//! Form data goes where the method wants it: in the query string for GET and
//! HEAD, in an `application/x-www-form-urlencoded` body for everything else.
//! The same descriptor therefore serves reads and writes.

use bytes::Bytes;
use http::HeaderMap;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use url::Url;
use url::form_urlencoded;

use crate::client::error::ClientError;
use crate::method::Method;
use crate::response::ContentType;
use crate::route::{RouteDescriptor, RouteError, Vars};

// ── Form ──────────────────────────────────────────────────────────────────────

/// Ordered form fields. Repeated keys are kept.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Form(Vec<(String, String)>);

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialisation.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.0)
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Form {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── OutboundRequest ───────────────────────────────────────────────────────────

/// A request ready for a transport.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    pub fn into_http(self) -> Result<http::Request<Bytes>, http::Error> {
        let mut req = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(self.url.as_str())
            .body(self.body.unwrap_or_default())?;
        *req.headers_mut() = self.headers;
        Ok(req)
    }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Builds [`OutboundRequest`]s against one base URL, optionally as one user.
#[derive(Clone, Copy, Debug)]
pub struct RequestBuilder<'a> {
    base_url: &'a Url,
    token: Option<&'a str>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(base_url: &'a Url) -> Self {
        Self { base_url, token: None }
    }

    /// Sends `Authorization: Bearer <token>` on every built request.
    pub fn bearer(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    pub fn build(
        &self,
        route: &RouteDescriptor,
        vars: &Vars,
        form: Option<&Form>,
    ) -> Result<OutboundRequest, ClientError> {
        let method = route.resolve_method()?;
        let path = route.expand_path(vars)?;

        // Same rules as a browser: an absolute path replaces the base path.
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|source| ClientError::PathExpansionFailed(RouteError::InvalidPath { path, source }))?;

        let mut headers = HeaderMap::new();
        let mut body = None;

        if let Some(form) = form.filter(|f| !f.is_empty()) {
            let encoded = form.encode();
            if method.is_read() {
                url.set_query(Some(&encoded));
            } else {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(ContentType::FormData.as_str()));
                body = Some(Bytes::from(encoded));
            }
        }

        if let Some(token) = self.token {
            let value = HeaderValue::try_from(format!("Bearer {token}"))
                .map_err(ClientError::InvalidAuthorization)?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(OutboundRequest { method, url, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.example.com/").unwrap()
    }

    fn mood_form() -> Form {
        Form::new().with("eyes", "oO").with("tongue", "U ")
    }

    #[test]
    fn get_puts_form_in_query() {
        let base = base();
        let route = RouteDescriptor::new([Method::Get, Method::Head], "/moods/{name}");
        let req = RequestBuilder::new(&base)
            .build(&route, &Vars::new().with("name", "happy"), Some(&mood_form()))
            .unwrap();

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url.as_str(), "https://api.example.com/moods/happy?eyes=oO&tongue=U+");
        assert!(req.body.is_none());
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn head_puts_form_in_query() {
        let base = base();
        let route = RouteDescriptor::new([Method::Head], "/moods");
        let req = RequestBuilder::new(&base)
            .build(&route, &Vars::new(), Some(&mood_form()))
            .unwrap();
        assert_eq!(req.url.query(), Some("eyes=oO&tongue=U+"));
        assert!(req.body.is_none());
    }

    #[test]
    fn post_puts_form_in_body() {
        let base = base();
        let route = RouteDescriptor::new([Method::Post], "/moods/{name}");
        let req = RequestBuilder::new(&base)
            .build(&route, &Vars::new().with("name", "happy"), Some(&mood_form()))
            .unwrap();

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url.query(), None);
        assert_eq!(req.body.as_deref(), Some(&b"eyes=oO&tongue=U+"[..]));
        assert_eq!(req.headers[CONTENT_TYPE], "application/x-www-form-urlencoded");
    }

    #[test]
    fn empty_form_adds_nothing() {
        let base = base();
        let route = RouteDescriptor::new([Method::Put], "/moods/x");
        let req = RequestBuilder::new(&base)
            .build(&route, &Vars::new(), Some(&Form::new()))
            .unwrap();
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn bearer_token_attached() {
        let base = base();
        let route = RouteDescriptor::new([Method::Delete], "/moods/{name}");
        let req = RequestBuilder::new(&base)
            .bearer("abc123")
            .build(&route, &Vars::new().with("name", "sad"), None)
            .unwrap();
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.headers[AUTHORIZATION], "Bearer abc123");
    }

    #[test]
    fn no_token_no_header() {
        let base = base();
        let route = RouteDescriptor::new([Method::Post], "/users");
        let req = RequestBuilder::new(&base).build(&route, &Vars::new(), None).unwrap();
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn base_path_is_replaced_by_absolute_template() {
        let base = Url::parse("http://localhost:3000/v1/").unwrap();
        let route = RouteDescriptor::new([Method::Post], "/users");
        let req = RequestBuilder::new(&base).build(&route, &Vars::new(), None).unwrap();
        assert_eq!(req.url.as_str(), "http://localhost:3000/users");
    }

    #[test]
    fn missing_variable_is_path_expansion_failure() {
        let base = base();
        let route = RouteDescriptor::new([Method::Get], "/moods/{name}");
        let err = RequestBuilder::new(&base).build(&route, &Vars::new(), None).unwrap_err();
        assert!(matches!(
            err,
            ClientError::PathExpansionFailed(RouteError::MissingVariable(ref name)) if name == "name"
        ));
    }

    #[test]
    fn control_chars_in_token_rejected() {
        let base = base();
        let route = RouteDescriptor::new([Method::Get], "/moods");
        let err = RequestBuilder::new(&base)
            .bearer("bad\ntoken")
            .build(&route, &Vars::new(), None)
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidAuthorization(_)));
    }

    #[test]
    fn into_http_keeps_everything() {
        let base = base();
        let route = RouteDescriptor::new([Method::Put], "/moods/{name}");
        let req = RequestBuilder::new(&base)
            .bearer("t")
            .build(&route, &Vars::new().with("name", "calm"), Some(&Form::new().with("eyes", "--")))
            .unwrap()
            .into_http()
            .unwrap();
        assert_eq!(req.method(), http::Method::PUT);
        assert_eq!(req.uri().path(), "/moods/calm");
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer t");
        assert_eq!(req.body().as_ref(), b"eyes=--");
    }
}
