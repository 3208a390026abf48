use super::auth::{AuthManager, AuthType};
use super::builder::SwarmClientBuilder;
use super::request::{
    encode_options, reject_escaped_dot_segments, validate_escapes, Request, RequestOption,
};
use super::Response;
use crate::resilience::rate_limiter::RateLimit;
use crate::resilience::retry::RetryPolicy;
use crate::services::{ProjectsService, WorkflowsService};
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://myswarm.url/";
pub const API_VERSION_PATH: &str = "api/v9/";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Called before every transport attempt with the request and the 0-based
/// attempt number.
pub type RequestHook = Arc<dyn Fn(&Request, u32) + Send + Sync>;
/// Called after every transport attempt that produced a response.
pub type ResponseHook = Arc<dyn Fn(&Response) + Send + Sync>;

/// Client for one Swarm server.
///
/// All methods take `&self`; wrap the client in an `Arc` to share it
/// between tasks.
pub struct SwarmClient {
    pub(crate) transport: HttpTransport,
    pub(crate) base_url: Url,
    pub(crate) auth: AuthManager,
    pub(crate) retry: RetryPolicy,
    /// Set once, either by the builder or by the first request's probe.
    pub(crate) limiter: OnceCell<Arc<dyn RateLimit>>,
    pub(crate) on_request: Option<RequestHook>,
    pub(crate) on_response: Option<ResponseHook>,
}

impl SwarmClient {
    pub fn builder() -> SwarmClientBuilder {
        SwarmClientBuilder::new()
    }

    /// A basic-auth client with default configuration.
    pub fn basic_auth(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        SwarmClientBuilder::new()
            .base_url(base_url)
            .basic_auth(username, password)
    }

    /// The API root every request path is resolved against, always ending
    /// in [`API_VERSION_PATH`].
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth.auth_type()
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Whether the rate limiter has been configured yet.
    pub fn limiter_configured(&self) -> bool {
        self.limiter.initialized()
    }

    pub fn projects(&self) -> ProjectsService<'_> {
        ProjectsService::new(self)
    }

    pub fn workflows(&self) -> WorkflowsService<'_> {
        WorkflowsService::new(self)
    }

    /// Build a request for `path`, relative to the base URL.
    ///
    /// `path` may already be percent-escaped; escaped segments that decode
    /// to `.` or `..` are rejected. For POST, PUT and PATCH the
    /// options become a form body; for other methods they become the query
    /// string. Request options run before the default headers are set, so
    /// they cannot override `Accept` or `Content-Type`.
    pub fn new_request<O>(
        &self,
        method: Method,
        path: &str,
        opt: Option<&O>,
        options: &[RequestOption],
    ) -> Result<Request>
    where
        O: Serialize + ?Sized,
    {
        validate_escapes(path)?;
        reject_escaped_dot_segments(path)?;
        let mut url = Url::parse(&format!("{}{}", self.base_url.as_str(), path))?;

        let has_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);
        let mut body = None;
        if let Some(opt) = opt {
            let encoded = encode_options(opt)?;
            if has_body {
                body = Some(encoded);
            } else if !encoded.is_empty() {
                url.set_query(Some(&encoded));
            }
        }

        let mut req = Request::new(method, url);
        if let Some(body) = body {
            req = req.with_body(body);
        }
        let mut req = req.apply(options)?;

        req.headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            req.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }
        Ok(req)
    }
}

/// Normalize a user supplied base URL so that it ends with a slash and the
/// API version segment, exactly once.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut s = raw.trim().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    let mut url = Url::parse(&s)?;
    if url.cannot_be_a_base() {
        return Err(Error::configuration_with_context(
            "base URL cannot carry a path",
            ErrorContext::new()
                .with_field_path("base_url")
                .with_details(raw.to_string())
                .with_source("client_builder"),
        ));
    }
    if !url.path().ends_with(API_VERSION_PATH) {
        let path = format!("{}{}", url.path(), API_VERSION_PATH);
        url.set_path(&path);
    }
    Ok(url)
}

impl std::fmt::Debug for SwarmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("retry", &self.retry)
            .field("limiter_configured", &self.limiter.initialized())
            .finish_non_exhaustive()
    }
}
