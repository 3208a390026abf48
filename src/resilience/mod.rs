//! Resilience primitives: backoff, retry policy and rate limiting.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`backoff`] | Delay between retry attempts, aware of `RateLimit-Reset` |
//! | [`retry`] | Which responses are retried, and how often |
//! | [`rate_limiter`] | Token bucket configured from `RateLimit-Limit` |
//!
//! ## Rate Limiter
//!
//! ```rust
//! use swarm_client::resilience::rate_limiter::{RateLimit, RateLimiter, RateLimiterConfig};
//! use swarm_client::CallContext;
//!
//! # async fn demo() -> swarm_client::Result<()> {
//! // 120 requests per minute => ~1.32 req/s sustained, burst of 1
//! let limiter = RateLimiter::new(RateLimiterConfig::from_requests_per_minute(120.0));
//!
//! limiter.wait(&CallContext::new()).await?;
//! // Proceed with request...
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod rate_limiter;
pub mod retry;
