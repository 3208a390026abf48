use crate::client::CallContext;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Requests-per-minute limit advertised by the server.
pub const HEADER_RATE_LIMIT: &str = "ratelimit-limit";
/// Unix timestamp at which the current rate-limit window resets.
pub const HEADER_RATE_RESET: &str = "ratelimit-reset";

/// Share of the advertised per-second budget used as the sustained rate.
pub const SUSTAINED_SHARE: f64 = 0.66;
/// Share of the advertised per-second budget callers may burst through.
pub const BURST_SHARE: f64 = 0.33;

/// Anything that can gate outgoing requests.
///
/// `wait` blocks until the caller may proceed, or fails with the
/// context's cancellation error.
#[async_trait]
pub trait RateLimit: Send + Sync {
    async fn wait(&self, ctx: &CallContext) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterConfig {
    /// Tokens per second. Infinite (or non-positive) means unlimited.
    pub rps: f64,
    /// Maximum burst size (tokens).
    pub burst: f64,
}

impl RateLimiterConfig {
    pub fn unlimited() -> Self {
        Self {
            rps: f64::INFINITY,
            burst: 0.0,
        }
    }

    /// Derive limiter settings from a requests-per-minute budget.
    ///
    /// The per-second budget is split into a sustained rate
    /// ([`SUSTAINED_SHARE`]) and a burst ([`BURST_SHARE`], rounded down,
    /// at least one token so a finite limiter can always admit a request).
    pub fn from_requests_per_minute(rpm: f64) -> Self {
        if !rpm.is_finite() || rpm <= 0.0 {
            return Self::unlimited();
        }
        let per_second = rpm / 60.0;
        Self {
            rps: per_second * SUSTAINED_SHARE,
            burst: (per_second * BURST_SHARE).floor().max(1.0),
        }
    }

    /// Read [`HEADER_RATE_LIMIT`] from a response; unlimited when absent or invalid.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(HEADER_RATE_LIMIT)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(Self::from_requests_per_minute)
            .unwrap_or_else(Self::unlimited)
    }

    pub fn is_unlimited(&self) -> bool {
        !self.rps.is_finite() || self.rps <= 0.0
    }
}

#[derive(Debug)]
struct State {
    /// Negative while waiters hold reservations against future refills.
    tokens: f64,
    last: Instant,
}

/// Token-bucket rate limiter.
///
/// Waiters reserve a token under the lock, in lock order, and then sleep
/// until the reservation matures. A waiter cancelled mid-sleep hands its
/// reservation back.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        let burst = cfg.burst;
        let state = Mutex::new(State {
            tokens: burst,
            last: Instant::now(),
        });
        Self { cfg, state }
    }

    pub fn unlimited() -> Self {
        Self::new(RateLimiterConfig::unlimited())
    }

    fn refill_locked(cfg: &RateLimiterConfig, st: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(st.last).as_secs_f64();
        if elapsed > 0.0 {
            st.tokens = (st.tokens + elapsed * cfg.rps).min(cfg.burst);
            st.last = now;
        }
    }

    async fn reserve(&self) -> Duration {
        let cfg = &self.cfg;
        let mut st = self.state.lock().await;
        Self::refill_locked(cfg, &mut st);
        st.tokens -= 1.0;
        if st.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-st.tokens / cfg.rps)
        }
    }

    async fn release(&self) {
        let cfg = &self.cfg;
        let mut st = self.state.lock().await;
        Self::refill_locked(cfg, &mut st);
        st.tokens = (st.tokens + 1.0).min(cfg.burst);
    }
}

#[async_trait]
impl RateLimit for RateLimiter {
    async fn wait(&self, ctx: &CallContext) -> Result<()> {
        if self.cfg.is_unlimited() {
            return match ctx.err() {
                Some(err) => Err(err),
                None => Ok(()),
            };
        }

        let delay = ctx.run(self.reserve()).await?;
        if delay.is_zero() {
            return Ok(());
        }
        if let Err(err) = ctx.sleep(delay).await {
            self.release().await;
            return Err(err);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").field("cfg", &self.cfg).finish()
    }
}
