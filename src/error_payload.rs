//! Normalization of Swarm error bodies.
//!
//! Swarm reports validation failures as loosely shaped JSON, e.g.
//!
//! ```json
//! {
//!     "error": "Bad Request",
//!     "details": { "branches": "Unknown user id(s): x" },
//!     "isValid": false
//! }
//! ```
//!
//! [`ErrorPayload`] captures that shape as a closed sum type and
//! [`ErrorPayload::flatten`] folds it into a single deterministic message.

use crate::client::Response;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::fmt;

/// Message used when an error body is not JSON at all.
pub const UNKNOWN_ERROR_FORMAT: &str = "failed to parse unknown error format";

/// A dynamically shaped error body.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    Text(String),
    List(Vec<ErrorPayload>),
    /// Entries in the order they were read; flattening sorts them.
    Map(Vec<(String, ErrorPayload)>),
    /// A leaf that cannot be rendered as a message (`bool`, `number`, `null`).
    Unexpected(&'static str),
}

impl ErrorPayload {
    /// Parse a raw body, returning `None` if it is not valid JSON.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Value>(body).ok().map(Self::from)
    }

    pub fn flatten(&self) -> String {
        match self {
            ErrorPayload::Text(s) => s.clone(),
            ErrorPayload::List(items) => {
                let parts: Vec<String> = items.iter().map(ErrorPayload::flatten).collect();
                format!("[{}]", parts.join(", "))
            }
            ErrorPayload::Map(entries) => {
                let mut parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{{{}: {}}}", k, v.flatten()))
                    .collect();
                parts.sort();
                parts.join(", ")
            }
            ErrorPayload::Unexpected(kind) => {
                format!("failed to parse unexpected error type: {}", kind)
            }
        }
    }
}

impl From<Value> for ErrorPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ErrorPayload::Text(s),
            Value::Array(items) => {
                ErrorPayload::List(items.into_iter().map(ErrorPayload::from).collect())
            }
            Value::Object(map) => ErrorPayload::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ErrorPayload::from(v)))
                    .collect(),
            ),
            Value::Bool(_) => ErrorPayload::Unexpected("bool"),
            Value::Number(_) => ErrorPayload::Unexpected("number"),
            Value::Null => ErrorPayload::Unexpected("null"),
        }
    }
}

/// Normalize a raw error body into a single message.
pub fn normalize_message(body: &[u8]) -> String {
    match ErrorPayload::parse(body) {
        Some(payload) => payload.flatten(),
        None => UNKNOWN_ERROR_FORMAT.to_string(),
    }
}

/// An API error: the server answered, but not with a success status.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Raw error body as returned by the server.
    pub body: Bytes,
    pub response: Response,
    /// Flattened message, see [`ErrorPayload::flatten`].
    pub message: String,
}

impl ErrorResponse {
    pub fn new(response: Response, body: Bytes) -> Self {
        let message = normalize_message(&body);
        Self {
            body,
            response,
            message,
        }
    }

    /// The body parsed as an [`ErrorPayload`], if it was JSON.
    pub fn payload(&self) -> Option<ErrorPayload> {
        ErrorPayload::parse(&self.body)
    }
}

/// Shows the URL the request was sent to, not the one it was redirected to.
impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = &self.response.url;
        let raw_path = url.path().replace('+', " ");
        let path = percent_decode_str(&raw_path).decode_utf8_lossy();
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => String::new(),
        };
        write!(
            f,
            "{} {}://{}{}: {} {}",
            self.response.method,
            url.scheme(),
            host,
            path,
            self.response.status.as_u16(),
            self.message
        )
    }
}

impl std::error::Error for ErrorResponse {}
