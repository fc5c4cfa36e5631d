//! Interpreting API responses.
//!
//! | Status | Outcome |
//! |---|---|
//! | 2xx | success; body decoded as JSON if a value is wanted |
//! | an error status the API uses (see [`ErrorKind::from_status`]) | body decoded as [`DomainError`] |
//! | anything else | [`ClientError::UnexpectedStatus`] |
//!
//! No retries happen here.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::client::error::ClientError;
use crate::domain_error::{DomainError, ErrorKind};

/// Decodes a successful response body into `T`.
pub fn translate<T: DeserializeOwned>(response: &http::Response<Bytes>) -> Result<T, ClientError> {
    let body = check(response)?;
    serde_json::from_slice(body).map_err(ClientError::ResponseParseFailed)
}

/// Checks the status only; a success body, if any, is ignored.
pub fn translate_empty(response: &http::Response<Bytes>) -> Result<(), ClientError> {
    check(response).map(drop)
}

fn check(response: &http::Response<Bytes>) -> Result<&Bytes, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.body());
    }
    if ErrorKind::from_status(status).is_some() {
        let err: DomainError =
            serde_json::from_slice(response.body()).map_err(ClientError::ErrorBodyParseFailed)?;
        return Err(ClientError::Domain(err));
    }
    Err(ClientError::UnexpectedStatus(status.as_u16()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    fn response(status: u16, body: &'static str) -> http::Response<Bytes> {
        http::Response::builder()
            .status(status)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Animals {
        animals: Vec<String>,
    }

    #[test]
    fn success_decodes_payload() {
        let animals: Animals = translate(&response(200, r#"{"animals":["cow","tux"]}"#)).unwrap();
        assert_eq!(animals.animals, ["cow", "tux"]);
    }

    #[test]
    fn no_content_without_destination_is_ok() {
        assert!(translate_empty(&response(204, "")).is_ok());
    }

    #[test]
    fn success_with_bad_body_is_parse_failure() {
        let err = translate::<Animals>(&response(200, "<html>")).unwrap_err();
        assert!(matches!(err, ClientError::ResponseParseFailed(_)));
    }

    #[test]
    fn not_found_body_becomes_domain_error() {
        let err = translate_empty(&response(404, r#"{"kind":"not_found","message":"no mood"}"#))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert_eq!(err.domain().unwrap().message, "no mood");
    }

    #[test]
    fn body_kind_wins_over_status() {
        let err = translate_empty(&response(400, r#"{"kind":"conflict","message":"taken"}"#))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    }

    #[test]
    fn undecodable_error_body() {
        let err = translate_empty(&response(500, "boom")).unwrap_err();
        assert!(matches!(err, ClientError::ErrorBodyParseFailed(_)));
    }

    #[test]
    fn unhandled_codes_are_unexpected() {
        for (status, body) in [(418, r#"{"kind":"not_found","message":"x"}"#), (302, ""), (101, ""), (503, "")] {
            let err = translate_empty(&response(status, body)).unwrap_err();
            assert!(matches!(err, ClientError::UnexpectedStatus(s) if s == status), "{status}");
        }
    }

    #[test]
    fn unmapped_status_ignores_valid_error_body() {
        let err = translate_empty(&response(503, r#"{"kind":"internal","message":"down"}"#))
            .unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus(503)));
        assert_eq!(err.kind(), None);
    }
}
