//! Process-wide request throttling.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// One bucket shared by every client, starting full.
#[derive(Debug)]
pub struct TokenBucket {
    refill_per_sec: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl TokenBucket {
    pub fn new(refill_per_sec: f32, capacity: f32) -> Self {
        let capacity = f64::from(capacity);
        Self {
            refill_per_sec: f64::from(refill_per_sec),
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Spend one token, or report how long until one is available.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = now.saturating_duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(());
        }
        let missing = 1.0 - bucket.tokens;
        if self.refill_per_sec > 0.0 {
            Err(Duration::from_secs_f64(missing / self.refill_per_sec))
        } else {
            Err(Duration::MAX)
        }
    }
}

/// Whole seconds for a `Retry-After` header, never zero.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs().saturating_add(u64::from(wait.subsec_nanos() > 0));
    secs.max(1)
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.config.resilience.rate_limit_enabled
        && let Err(wait) = state.rate_limiter.try_acquire()
    {
        let retry_after = retry_after_secs(wait);
        tracing::debug!(path = %req.uri().path(), retry_after, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
        )
            .into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_refill() {
        let bucket = TokenBucket::new(2.0, 3.0);
        let start = Instant::now();

        assert!(bucket.try_acquire_at(start).is_ok());
        assert!(bucket.try_acquire_at(start).is_ok());
        assert!(bucket.try_acquire_at(start).is_ok());
        assert_eq!(
            bucket.try_acquire_at(start),
            Err(Duration::from_millis(500))
        );

        // 0.6s at 2/s refills 1.2 tokens
        let later = start + Duration::from_millis(600);
        assert!(bucket.try_acquire_at(later).is_ok());
        assert!(bucket.try_acquire_at(later).is_err());
    }

    #[test]
    fn test_refill_is_capped() {
        let bucket = TokenBucket::new(100.0, 2.0);
        let later = Instant::now() + Duration::from_secs(60);

        assert!(bucket.try_acquire_at(later).is_ok());
        assert!(bucket.try_acquire_at(later).is_ok());
        assert!(bucket.try_acquire_at(later).is_err());
    }

    #[test]
    fn test_zero_rate_never_refills() {
        let bucket = TokenBucket::new(0.0, 1.0);
        assert!(bucket.try_acquire().is_ok());
        assert_eq!(bucket.try_acquire(), Err(Duration::MAX));
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(500)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(2001)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::MAX), u64::MAX);
    }
}
