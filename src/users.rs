//! User endpoints: mint an identity, check one exists.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::handler::Handler;
use crate::middleware::{AuthGate, UserLookup};
use crate::request::Request;
use crate::response::{Json, Response};
use crate::route::Vars;

/// A user as the API exposes it: nothing but the bearer token that names it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: String,
}

impl From<&User> for Vars {
    fn from(user: &User) -> Self {
        Vars::new().with("id", user.id.clone())
    }
}

/// `POST /users` → `200 {"id": "<token>"}`.
pub fn create(gate: AuthGate) -> impl Handler {
    move |_req: Request| {
        let id = gate.codec().issue().into_string();
        async move { Json(User { id }) }
    }
}

/// `GET /users/{id}` → `204` if the id is a token we issued, `404` otherwise.
/// Neither response has a body.
pub fn exists(gate: AuthGate) -> impl Handler {
    move |req: Request| {
        let found = match req.param("id") {
            Some(id) => gate.user_exists(id),
            None => UserLookup::NotFound,
        };
        async move {
            match found {
                UserLookup::Exists(_) => Response::status(StatusCode::NO_CONTENT),
                UserLookup::NotFound  => Response::status(StatusCode::NOT_FOUND),
            }
        }
    }
}
