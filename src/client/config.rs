//! Client configuration with environment overrides.

use std::env;
use std::time::Duration;

/// Transport and retry knobs.
///
/// [`ClientConfig::from_env`] reads the `SWARM_*` variables below, falling
/// back to production-friendly defaults:
///
/// | Variable | Default |
/// |----------|---------|
/// | `SWARM_HTTP_TIMEOUT_SECS` | 30 |
/// | `SWARM_HTTP_POOL_MAX_IDLE_PER_HOST` | 32 |
/// | `SWARM_HTTP_POOL_IDLE_TIMEOUT_SECS` | 90 |
/// | `SWARM_PROXY_URL` | unset |
/// | `SWARM_RETRY_MAX` | 5 |
/// | `SWARM_RETRY_WAIT_MIN_MS` | 100 |
/// | `SWARM_RETRY_WAIT_MAX_MS` | 400 |
/// | `SWARM_DISABLE_RETRIES` | false |
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
    pub retry_max: u32,
    pub retry_wait_min: Duration,
    pub retry_wait_max: Duration,
    pub disable_retries: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
            retry_max: 5,
            retry_wait_min: Duration::from_millis(100),
            retry_wait_max: Duration::from_millis(400),
            disable_retries: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (used by `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_u64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let timeout = parse_u64("SWARM_HTTP_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let pool_max_idle_per_host = parse_u64("SWARM_HTTP_POOL_MAX_IDLE_PER_HOST")
            .map(|n| n as usize)
            .unwrap_or(defaults.pool_max_idle_per_host);
        let pool_idle_timeout = parse_u64("SWARM_HTTP_POOL_IDLE_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.pool_idle_timeout);
        let proxy_url = lookup("SWARM_PROXY_URL").filter(|s| !s.trim().is_empty());
        let retry_max = parse_u64("SWARM_RETRY_MAX")
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(defaults.retry_max);
        let retry_wait_min = parse_u64("SWARM_RETRY_WAIT_MIN_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_wait_min);
        let retry_wait_max = parse_u64("SWARM_RETRY_WAIT_MAX_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_wait_max)
            .max(retry_wait_min);
        let disable_retries = lookup("SWARM_DISABLE_RETRIES")
            .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.disable_retries);

        Self {
            timeout,
            pool_max_idle_per_host,
            pool_idle_timeout,
            proxy_url,
            retry_max,
            retry_wait_min,
            retry_wait_max,
            disable_retries,
        }
    }
}
