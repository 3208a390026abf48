//! Inter-attempt delays for the retry loop.

use super::rate_limiter::HEADER_RATE_RESET;
use crate::client::Response;
use rand::Rng;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lower bound used for server errors, regardless of the configured wait.
pub const SERVICE_BACKOFF_MIN: Duration = Duration::from_millis(700);
/// Upper bound used for server errors, regardless of the configured wait.
pub const SERVICE_BACKOFF_MAX: Duration = Duration::from_millis(900);

/// Computes the wait before retry number `attempt` (0-based) given the
/// configured bounds and the last response seen, if any.
pub type Backoff = Arc<dyn Fn(Duration, Duration, u32, Option<&Response>) -> Duration + Send + Sync>;

/// Default backoff: rate-limited responses wait for the advertised reset,
/// everything else gets a short linear jitter inside
/// [`SERVICE_BACKOFF_MIN`]..[`SERVICE_BACKOFF_MAX`].
pub fn retry_http_backoff(
    min: Duration,
    max: Duration,
    attempt: u32,
    last: Option<&Response>,
) -> Duration {
    if let Some(resp) = last {
        if resp.status == StatusCode::TOO_MANY_REQUESTS {
            return rate_limit_backoff(min, max, attempt, last);
        }
    }
    linear_jitter_backoff(SERVICE_BACKOFF_MIN, SERVICE_BACKOFF_MAX, attempt)
}

/// Backoff for 429 responses.
///
/// `min`..`max` bound the jitter added on top of the floor. The floor is
/// `min`, raised to the time left until [`HEADER_RATE_RESET`] when that is
/// longer.
pub fn rate_limit_backoff(
    min: Duration,
    max: Duration,
    _attempt: u32,
    last: Option<&Response>,
) -> Duration {
    let jitter = jitter(min, max);

    let mut floor = min;
    if let Some(wait) = last.and_then(|r| until_reset(&r.headers)) {
        if wait > floor {
            floor = wait;
        }
    }

    floor + jitter
}

/// `(min + U[0, max-min)) * (attempt + 1)`, or `min * (attempt + 1)` when
/// the bounds are empty.
pub fn linear_jitter_backoff(min: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = attempt.saturating_add(1);
    if max <= min {
        return min.saturating_mul(factor);
    }
    (min + jitter(min, max)).saturating_mul(factor)
}

fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return Duration::ZERO;
    }
    let span = (max - min).as_secs_f64();
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..span))
}

/// Time left until the Unix timestamp in the reset header, if it's in the future.
pub(crate) fn until_reset(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let reset = headers
        .get(HEADER_RATE_RESET)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|r| *r > 0)?;
    let reset_at = UNIX_EPOCH + Duration::from_secs(reset as u64);
    reset_at.duration_since(SystemTime::now()).ok()
}
