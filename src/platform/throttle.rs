//! Token-bucket throttle shared by every outbound platform call
//!
//! The bucket refills at a steady rate up to a burst capacity. `acquire`
//! waits until a whole token is available; callers are not queued or
//! prioritized.

use crate::error::{Error, Result};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::trace;

/// Default steady rate with credentials (GitHub allows 5000 req/hour; stay near 1800)
pub const AUTHENTICATED_RATE: f64 = 0.5;

/// Default steady rate without credentials
pub const ANONYMOUS_RATE: f64 = 0.01;

/// Default burst capacity
pub const DEFAULT_BURST: u32 = 10;

/// Longest single sleep; the bucket is re-checked after each one
const MAX_WAIT: Duration = Duration::from_secs(3600);

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter refilling `rate` tokens per second, holding at most `burst`
    ///
    /// The bucket starts full.
    pub fn new(rate: f64, burst: u32) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(Error::Config(format!(
                "rate limit must be a positive number, got {rate}"
            )));
        }
        if burst == 0 {
            return Err(Error::Config("rate limit burst must be at least 1".to_string()));
        }
        let burst = f64::from(burst);
        Ok(Self {
            rate,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        })
    }

    /// Wait for permission to issue one outbound call
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens = elapsed.mul_add(self.rate, bucket.tokens).min(self.burst);
                bucket.last_refill = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                Duration::try_from_secs_f64((1.0 - bucket.tokens) / self.rate)
                    .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT))
            };
            trace!(wait_ms = wait.as_millis(), "throttled");
            tokio::time::sleep(wait).await;
        }
    }

    #[cfg(test)]
    async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = elapsed.mul_add(self.rate, bucket.tokens).min(self.burst);
        bucket.last_refill = now;
        bucket.tokens
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.rate)
            .field("burst", &self.burst)
            .finish_non_exhaustive()
    }
}
