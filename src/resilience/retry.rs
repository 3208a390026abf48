//! Retry policy for transport attempts.

use super::backoff::{retry_http_backoff, Backoff};
use crate::client::config::ClientConfig;
use crate::client::{CallContext, Response};
use std::sync::Arc;
use std::time::Duration;

/// Decides whether an attempt should be repeated.
///
/// `last` is `None` when the attempt failed before any response arrived.
pub type CheckRetry = Arc<dyn Fn(&CallContext, Option<&Response>) -> bool + Send + Sync>;

/// Retries rate-limited (429) and server (>= 500) responses unless
/// `disabled`. Transport failures and finished contexts are never retried.
pub fn retry_http_check(ctx: &CallContext, last: Option<&Response>, disabled: bool) -> bool {
    if ctx.err().is_some() {
        return false;
    }
    match last {
        Some(resp) => {
            let status = resp.status.as_u16();
            !disabled && (status == 429 || status >= 500)
        }
        None => false,
    }
}

#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
    pub disabled: bool,
    backoff: Backoff,
    check: Option<CheckRetry>,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.retry_max,
            wait_min: config.retry_wait_min,
            wait_max: config.retry_wait_max,
            disabled: config.disable_retries,
            backoff: Arc::new(retry_http_backoff),
            check: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the retry predicate; `disabled` no longer applies.
    pub fn with_check(mut self, check: CheckRetry) -> Self {
        self.check = Some(check);
        self
    }

    pub fn should_retry(&self, ctx: &CallContext, last: Option<&Response>) -> bool {
        match &self.check {
            Some(check) => check(ctx, last),
            None => retry_http_check(ctx, last, self.disabled),
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32, last: Option<&Response>) -> Duration {
        (self.backoff)(self.wait_min, self.wait_max, attempt, last)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("wait_min", &self.wait_min)
            .field("wait_max", &self.wait_max)
            .field("disabled", &self.disabled)
            .field("custom_check", &self.check.is_some())
            .finish()
    }
}
