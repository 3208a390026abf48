use super::auth::{AuthManager, AuthType};
use super::config::ClientConfig;
use super::core::{normalize_base_url, RequestHook, ResponseHook, SwarmClient, DEFAULT_BASE_URL};
use super::request::Request;
use super::Response;
use crate::resilience::backoff::Backoff;
use crate::resilience::rate_limiter::RateLimit;
use crate::resilience::retry::{CheckRetry, RetryPolicy};
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Builder for [`SwarmClient`].
///
/// Settings start from [`ClientConfig::from_env`]; explicit calls override
/// them. Finish with [`basic_auth`](Self::basic_auth) or
/// [`token`](Self::token).
pub struct SwarmClientBuilder {
    base_url: String,
    config: ClientConfig,
    http_client: Option<reqwest::Client>,
    backoff: Option<Backoff>,
    check_retry: Option<CheckRetry>,
    rate_limiter: Option<Arc<dyn RateLimit>>,
    on_request: Option<RequestHook>,
    on_response: Option<ResponseHook>,
}

impl SwarmClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            config: ClientConfig::from_env(),
            http_client: None,
            backoff: None,
            check_retry: None,
            rate_limiter: None,
            on_request: None,
            on_response: None,
        }
    }

    /// Server URL; the API version segment is appended when missing.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the whole configuration, including values read from env.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a preconfigured HTTP client. Timeout, pool and proxy settings of
    /// the configuration are then ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn with_check_retry(mut self, check: CheckRetry) -> Self {
        self.check_retry = Some(check);
        self
    }

    /// Install a custom limiter. The server is not probed for its limit.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimit>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn without_retries(mut self) -> Self {
        self.config.disable_retries = true;
        self
    }

    pub fn retry_max(mut self, max: u32) -> Self {
        self.config.retry_max = max;
        self
    }

    pub fn retry_wait(mut self, min: Duration, max: Duration) -> Self {
        self.config.retry_wait_min = min;
        self.config.retry_wait_max = max.max(min);
        self
    }

    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, u32) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(hook));
        self
    }

    /// Build a client that authenticates with HTTP basic auth. The token is
    /// generated on the first request.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<SwarmClient> {
        self.build(AuthManager::basic(username, password))
    }

    /// Build a client that sends `token` with the given scheme.
    pub fn token(self, auth_type: AuthType, token: impl Into<String>) -> Result<SwarmClient> {
        self.build(AuthManager::with_token(auth_type, token))
    }

    fn build(self, auth: AuthManager) -> Result<SwarmClient> {
        let base_url = normalize_base_url(&self.base_url)?;

        let transport = match self.http_client {
            Some(client) => HttpTransport::from_client(client),
            None => HttpTransport::new(&self.config)?,
        };

        let mut retry = RetryPolicy::from_config(&self.config);
        if let Some(backoff) = self.backoff {
            retry = retry.with_backoff(backoff);
        }
        if let Some(check) = self.check_retry {
            retry = retry.with_check(check);
        }

        let limiter = match self.rate_limiter {
            Some(l) => OnceCell::new_with(Some(l)),
            None => OnceCell::new(),
        };

        Ok(SwarmClient {
            transport,
            base_url,
            auth,
            retry,
            limiter,
            on_request: self.on_request,
            on_response: self.on_response,
        })
    }
}

impl Default for SwarmClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
