//! The seam between the client and the network.
//!
//! A [Transport] sends a single [Request] and returns the [RawResponse] as is. It doesn't interpret the response
//! status; the client classifies non-success statuses into [TransportError]s with [TransportError::from_response].

use std::{collections::BTreeMap, fmt, time::Duration};

use log::{error, warn};
use serde_json::Value;
use thiserror::Error;

use crate::model::error::{ApiErrorMessage, ApiErrorResponse};

/// Sends requests to the API.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}

impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A request against the API, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub options: RequestOptions,
}

/// Options passed through to the transport as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Timeout for the entire request. `None` uses the transport's default.
    pub timeout: Option<Duration>,
    /// Whether or not to react to being rate limited by waiting the wanted time in the response. Defaults to `true`.
    pub react_to_rate_limit: bool,
    /// Additional headers sent with the request.
    pub headers: Vec<(String, String)>,
}

/// A response as received from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("Failed to connect to the API: {0}")]
    Connection(String),

    #[error("Authentication failed: {reason}")]
    Authentication { reason: ApiErrorMessage, body: String },
    #[error("Forbidden: {body}")]
    Forbidden { body: String },
    #[error("Not found: {reason}")]
    NotFound { reason: ApiErrorMessage, body: String },
    #[error("Bad request: {body}")]
    BadRequest { body: String },
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },
    #[error("Unprocessable entity: {body}")]
    UnprocessableEntity { body: String },
    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[cfg(feature = "sync")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Method {
    /// Returns whether requests with this method carry a body.
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

impl Request {
    pub fn new<S>(method: Method, path: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn get<S>(path: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Get, path)
    }

    pub fn post<S>(path: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Post, path)
    }

    pub fn put<S>(path: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Put, path)
    }

    pub fn delete<S>(path: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(Method::Delete, path)
    }

    /// Set a query parameter, replacing any earlier value for the same key.
    pub fn with_query<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        let key = key.into();
        let value = value.to_string();

        match self.query.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = value,
            None => self.query.push((key, value)),
        }

        self
    }

    /// Remove a query parameter, if it's set.
    pub fn without_query(mut self, key: &str) -> Self {
        self.query.retain(|(existing, _)| existing != key);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            react_to_rate_limit: true,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn react_to_rate_limit(mut self, react_to_rate_limit: bool) -> Self {
        self.react_to_rate_limit = react_to_rate_limit;
        self
    }

    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RawResponse {
    pub fn new<S>(status: u16, body: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header's value. The name is matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns whether the response has no content to coerce.
    pub fn is_empty(&self) -> bool {
        self.status == 204 || self.body.trim().is_empty()
    }

    /// Returns the `Retry-After` header as seconds, if it's present and valid.
    pub fn retry_after(&self) -> Option<u64> {
        self.header("retry-after").and_then(|value| value.trim().parse().ok())
    }
}

impl TransportError {
    /// Pass a successful response through, or classify an unsuccessful one into an error.
    pub fn from_response(response: RawResponse) -> Result<RawResponse, TransportError> {
        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let retry_after = response.retry_after();
        let body = response.body;

        Err(match status {
            400 => {
                error!("Got 400 Bad Request response");
                warn!("Error response: {body}");
                TransportError::BadRequest { body }
            }

            401 => {
                warn!("Got 401 Unauthorized response");

                let reason = error_message(&body);
                match &reason {
                    ApiErrorMessage::TokenExpired => warn!("Access token expired"),
                    ApiErrorMessage::PermissionsMissing => error!("Missing required scope for the endpoint"),
                    other => error!("Unhandled authentication error: {other}"),
                }

                TransportError::Authentication { reason, body }
            }

            403 => {
                error!("Got 403 Forbidden response");
                TransportError::Forbidden { body }
            }

            404 => {
                let reason = error_message(&body);
                if reason == ApiErrorMessage::NoActiveDevice {
                    warn!("No active device to control");
                }

                TransportError::NotFound { reason, body }
            }

            422 => TransportError::UnprocessableEntity { body },

            429 => {
                warn!("Got 429 rate-limit response with Retry-After: {retry_after:?}");
                TransportError::RateLimited { retry_after }
            }

            500..=599 => {
                error!("Got {status} server error response");
                TransportError::Server { status, body }
            }

            status => {
                error!("Got unexpected {status} response");
                TransportError::UnexpectedStatus { status, body }
            }
        })
    }

    /// Returns the HTTP status the error was classified from, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Authentication { .. } => Some(401),
            TransportError::Forbidden { .. } => Some(403),
            TransportError::NotFound { .. } => Some(404),
            TransportError::BadRequest { .. } => Some(400),
            TransportError::RateLimited { .. } => Some(429),
            TransportError::UnprocessableEntity { .. } => Some(422),
            TransportError::Server { status, .. } | TransportError::UnexpectedStatus { status, .. } => Some(*status),

            #[cfg(feature = "sync")]
            TransportError::Http(err) => err.status().map(|status| status.as_u16()),

            TransportError::Connection(_) => None,
        }
    }
}

/// Returns the message in an API error body, or the whole body if it isn't one.
fn error_message(body: &str) -> ApiErrorMessage {
    ApiErrorResponse::parse(body)
        .map(|response| response.error.message)
        .unwrap_or_else(|| ApiErrorMessage::Other(body.to_owned()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_query_replaces() {
        let request = Request::get("search")
            .with_query("q", "daft punk")
            .with_query("offset", 0)
            .with_query("offset", 20);

        assert_eq!(request.query_value("offset"), Some("20"));
        assert_eq!(request.query.len(), 2);
    }

    #[test]
    fn success_passes_through() {
        let response = RawResponse::new(204, "");
        assert_eq!(TransportError::from_response(response.clone()).unwrap(), response);
    }

    #[test]
    fn classify_expired_token() {
        let response = RawResponse::new(401, r#"{"error": {"status": 401, "message": "The access token expired"}}"#);
        let err = TransportError::from_response(response).unwrap_err();

        assert!(matches!(
            err,
            TransportError::Authentication {
                reason: ApiErrorMessage::TokenExpired,
                ..
            }
        ));
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn classify_no_active_device() {
        let response = RawResponse::new(
            404,
            r#"{"error": {"status": 404, "message": "Player command failed: No active device found"}}"#,
        );

        assert!(matches!(
            TransportError::from_response(response).unwrap_err(),
            TransportError::NotFound {
                reason: ApiErrorMessage::NoActiveDevice,
                ..
            }
        ));

        let err = TransportError::from_response(RawResponse::new(404, "missing")).unwrap_err();
        assert!(matches!(
            err,
            TransportError::NotFound { reason: ApiErrorMessage::Other(body), .. } if body == "missing"
        ));
    }

    #[test]
    fn classify_rate_limit() {
        let response = RawResponse::new(429, "").with_header("Retry-After", "4");
        let err = TransportError::from_response(response).unwrap_err();

        assert!(matches!(err, TransportError::RateLimited { retry_after: Some(4) }));
    }

    #[test]
    fn classify_keeps_body() {
        let err = TransportError::from_response(RawResponse::new(503, "try later")).unwrap_err();

        match err {
            TransportError::Server { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "try later");
            }

            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_responses() {
        assert!(RawResponse::new(204, "").is_empty());
        assert!(RawResponse::new(200, "  ").is_empty());
        assert!(!RawResponse::new(200, "{}").is_empty());
    }
}
