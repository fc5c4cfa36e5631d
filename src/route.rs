//! Declarative API routes.
//!
//! A [`RouteDescriptor`] is data: the methods an endpoint accepts and its path
//! template. The server registers handlers from it and the client builds
//! requests from it, so the two sides cannot drift apart.
//!
//! Templates use the router's `{name}` placeholder syntax:
//!
//! ```rust
//! use saypi::{Method, RouteDescriptor, Vars};
//!
//! let route = RouteDescriptor::new([Method::Get, Method::Head], "/moods/{name}");
//! assert_eq!(route.resolve_method(), Ok(Method::Get));
//!
//! let path = route.expand_path(&Vars::new().with("name", "very happy")).unwrap();
//! assert_eq!(path, "/moods/very%20happy");
//! ```

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::method::Method;

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Errors from building or expanding a route.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("route does not define any HTTP methods")]
    NoMethodsDefined,

    #[error("route defines {0:?}; exactly one method other than HEAD/OPTIONS is allowed")]
    AmbiguousMethod(Vec<Method>),

    #[error("invalid path template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: &'static str },

    #[error("missing path variable `{0}`")]
    MissingVariable(String),

    #[error("path variable `{name}` = {value:?} is not a path segment")]
    InvalidSegment { name: String, value: String },

    #[error("unparseable request path {path:?}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

// ── Vars ──────────────────────────────────────────────────────────────────────

/// Values for a template's placeholders, supplied per request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Vars(BTreeMap<String, String>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── RouteDescriptor ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// The accepted methods and path template of one endpoint.
///
/// Validated on construction: at least one method, and at most one that is
/// not HEAD or OPTIONS when there are several.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteDescriptor {
    methods: Vec<Method>,
    template: String,
    segments: Vec<Segment>,
}

impl RouteDescriptor {
    /// # Panics
    ///
    /// Panics if the method set or the template is invalid. Routes are
    /// declared once at startup; a bad one is a programming error.
    pub fn new(methods: impl IntoIterator<Item = Method>, template: &str) -> Self {
        Self::try_new(methods, template)
            .unwrap_or_else(|e| panic!("invalid route `{template}`: {e}"))
    }

    pub fn try_new(
        methods: impl IntoIterator<Item = Method>,
        template: &str,
    ) -> Result<Self, RouteError> {
        let mut deduped: Vec<Method> = Vec::new();
        for m in methods {
            if !deduped.contains(&m) {
                deduped.push(m);
            }
        }
        resolve(&deduped)?;

        Ok(Self {
            methods: deduped,
            template: template.to_owned(),
            segments: parse_template(template)?,
        })
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in template order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The single method a client should send: the lone method, or the lone
    /// primary method among HEAD/OPTIONS companions.
    pub fn resolve_method(&self) -> Result<Method, RouteError> {
        resolve(&self.methods)
    }

    /// Substitutes every placeholder with its percent-encoded value.
    pub fn expand_path(&self, vars: &Vars) -> Result<String, RouteError> {
        let mut path = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => path.push_str(lit),
                Segment::Var(name) => {
                    let value = vars
                        .get(name)
                        .ok_or_else(|| RouteError::MissingVariable(name.clone()))?;
                    // Empty and dot segments would change which route the path names.
                    if matches!(value, "" | "." | "..") {
                        return Err(RouteError::InvalidSegment {
                            name: name.clone(),
                            value: value.to_owned(),
                        });
                    }
                    path.extend(utf8_percent_encode(value, PATH_SEGMENT));
                }
            }
        }

        // Any relative reference must resolve against an absolute base.
        Url::parse("http://localhost/")
            .and_then(|base| base.join(&path))
            .map_err(|source| RouteError::InvalidPath { path: path.clone(), source })?;

        Ok(path)
    }
}

fn resolve(methods: &[Method]) -> Result<Method, RouteError> {
    match methods {
        [] => Err(RouteError::NoMethodsDefined),
        [only] => Ok(*only),
        _ => {
            let mut primary = methods.iter().copied().filter(|m| m.is_primary());
            match (primary.next(), primary.next()) {
                (Some(m), None) => Ok(m),
                _ => Err(RouteError::AmbiguousMethod(methods.to_vec())),
            }
        }
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>, RouteError> {
    let invalid = |reason| RouteError::InvalidTemplate { template: template.to_owned(), reason };

    let mut segments = Vec::new();
    let mut rest = template;
    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                segments.push(Segment::Literal(rest.to_owned()));
                break;
            }
            Some(i) if rest[i..].starts_with('}') => return Err(invalid("unmatched `}`")),
            Some(i) => {
                if i > 0 {
                    segments.push(Segment::Literal(rest[..i].to_owned()));
                }
                let after = &rest[i + 1..];
                let end = after.find('}').ok_or_else(|| invalid("unclosed `{`"))?;
                let name = &after[..end];
                if name.is_empty() {
                    return Err(invalid("empty placeholder"));
                }
                if name.contains('{') {
                    return Err(invalid("nested `{`"));
                }
                segments.push(Segment::Var(name.to_owned()));
                rest = &after[end + 1..];
            }
        }
    }
    Ok(segments)
}

// ── ApiRoute ─────────────────────────────────────────────────────────────────

/// The API's route table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApiRoute {
    CreateUser,
    GetUser,
}

impl ApiRoute {
    pub const ALL: [Self; 2] = [Self::CreateUser, Self::GetUser];

    pub fn descriptor(self) -> RouteDescriptor {
        match self {
            Self::CreateUser => RouteDescriptor::new([Method::Post], "/users"),
            Self::GetUser    => RouteDescriptor::new([Method::Get, Method::Head], "/users/{id}"),
        }
    }
}
