//! Request values, per-call options and option encoding.

use super::context::CallContext;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Relative prefix that moves a request path from the v9 API root to v10.
pub const API_V10_PATH: &str = "../v10/";

/// Characters escaped in a single path segment. Matches the usual
/// path-segment rules: unreserved characters and `$&+:=@` stay literal.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Escape a project or workflow identifier for use as a path segment.
///
/// Swarm treats literal dots in identifiers as ambiguous, so `.` is
/// escaped to `%2E` as well.
pub fn path_escape(s: &str) -> String {
    utf8_percent_encode(s, PATH_SEGMENT)
        .to_string()
        .replace('.', "%2E")
}

/// A transformation applied to a [`Request`] before it is sent.
pub type RequestOption = Arc<dyn Fn(Request) -> Result<Request> + Send + Sync>;

/// A fully built API request.
///
/// The value is replayable: the pipeline sends a fresh copy on every
/// attempt.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Bytes>,
    pub(crate) context: CallContext,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            context: CallContext::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_call_context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }

    /// Apply options in order, stopping at the first failure.
    pub fn apply(self, options: &[RequestOption]) -> Result<Self> {
        options.iter().try_fold(self, |req, opt| opt(req))
    }

    pub(crate) fn to_reqwest(&self) -> reqwest::Request {
        let mut req = reqwest::Request::new(self.method.clone(), self.url.clone());
        *req.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *req.body_mut() = Some(reqwest::Body::from(body.clone()));
        }
        req
    }
}

/// Run the request under `context` (cancellation and deadline).
pub fn with_context(context: CallContext) -> RequestOption {
    Arc::new(move |req: Request| Ok(req.with_call_context(context.clone())))
}

/// Abort the request when `token` is cancelled.
pub fn with_cancellation(token: CancellationToken) -> RequestOption {
    Arc::new(move |req: Request| {
        let mut ctx = CallContext::with_cancellation(token.clone());
        if let Some(deadline) = req.context.deadline() {
            ctx = ctx.with_deadline(deadline);
        }
        Ok(req.with_call_context(ctx))
    })
}

/// Give the whole call, retries included, at most `timeout`.
pub fn with_timeout(timeout: Duration) -> RequestOption {
    Arc::new(move |req: Request| {
        let ctx = req.context.clone().with_timeout(timeout);
        Ok(req.with_call_context(ctx))
    })
}

pub fn with_header(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let name = name.into();
    let value = value.into();
    Arc::new(move |req: Request| {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            Error::validation_with_context(
                format!("invalid header name: {}", e),
                ErrorContext::new()
                    .with_field_path(name.clone())
                    .with_source("request_option"),
            )
        })?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| {
            Error::validation_with_context(
                format!("invalid header value: {}", e),
                ErrorContext::new()
                    .with_field_path(name.clone())
                    .with_source("request_option"),
            )
        })?;
        Ok(req.header(header_name, header_value))
    })
}

pub fn with_headers(headers: HeaderMap) -> RequestOption {
    Arc::new(move |mut req: Request| {
        for (name, value) in headers.iter() {
            req.headers.insert(name.clone(), value.clone());
        }
        Ok(req)
    })
}

/// Reject malformed percent escapes in a request path.
pub(crate) fn validate_escapes(path: &str) -> Result<()> {
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(Error::validation_with_context(
                    format!("invalid URL escape {:?}", String::from_utf8_lossy(&bytes[i..end])),
                    ErrorContext::new()
                        .with_field_path("path")
                        .with_details(path.to_string())
                        .with_source("request_builder"),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Reject escaped segments that decode to `.` or `..`.
///
/// URL parsing resolves `%2E` and `%2E%2E` like their literal forms, so an
/// identifier made only of dots would silently address the parent
/// resource. Literal relative segments such as [`API_V10_PATH`] are left
/// alone.
pub(crate) fn reject_escaped_dot_segments(path: &str) -> Result<()> {
    for segment in path.split('/') {
        if !segment.contains('%') {
            continue;
        }
        let decoded = percent_encoding::percent_decode_str(segment).decode_utf8_lossy();
        if decoded == "." || decoded == ".." {
            return Err(Error::validation_with_context(
                format!("path segment {:?} resolves to a relative reference", segment),
                ErrorContext::new()
                    .with_field_path("path")
                    .with_details(path.to_string())
                    .with_source("request_builder"),
            ));
        }
    }
    Ok(())
}

/// Encode an options value as `application/x-www-form-urlencoded`.
///
/// Nested values use bracket keys (`branches[0][name]`,
/// `defaults[reviewers][alice][required]`); `null` fields are omitted and
/// keys are emitted in sorted order.
pub fn encode_options<T: Serialize + ?Sized>(opt: &T) -> Result<String> {
    let value = serde_json::to_value(opt)?;
    let mut out = url::form_urlencoded::Serializer::new(String::new());
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, v) in sorted(&map) {
                append_value(&mut out, key, v);
            }
        }
        other => {
            return Err(Error::validation_with_context(
                "options must serialize to a map",
                ErrorContext::new()
                    .with_details(format!("got {}", type_name(&other)))
                    .with_source("options_encoder"),
            ))
        }
    }
    Ok(out.finish())
}

fn append_value(out: &mut url::form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.append_pair(key, if *b { "true" } else { "false" });
        }
        Value::Number(n) => {
            out.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            out.append_pair(key, s);
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                append_value(out, &format!("{}[{}]", key, i), item);
            }
        }
        Value::Object(map) => {
            for (k, v) in sorted(map) {
                append_value(out, &format!("{}[{}]", key, k), v);
            }
        }
    }
}

/// Object entries ordered by key, independent of how the map stores them.
fn sorted(map: &serde_json::Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
