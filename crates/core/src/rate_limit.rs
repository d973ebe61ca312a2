//! Client-side rate limiting for backend calls
//!
//! A token bucket per key (the client keys by endpoint, e.g. `rest`,
//! `storage`, `auth`) so a burst of per-row image fetches cannot starve
//! sign-in or uploads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests replenished per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Extra requests allowed on top of `max_requests` in a burst
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(300)
    }
}

impl RateLimitConfig {
    /// Per-second rate limit
    #[must_use]
    pub fn per_second(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(1),
            burst: max / 2,
        }
    }

    /// Per-minute rate limit
    #[must_use]
    pub fn per_minute(max: u32) -> Self {
        Self {
            max_requests: max,
            window: Duration::from_secs(60),
            burst: max / 4,
        }
    }

    fn capacity(&self) -> f64 {
        f64::from(self.max_requests + self.burst)
    }

    fn refill_per_sec(&self) -> f64 {
        f64::from(self.max_requests) / self.window.as_secs_f64().max(f64::EPSILON)
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refreshed: Instant,
}

impl Bucket {
    fn full(config: &RateLimitConfig) -> Self {
        Self {
            tokens: config.capacity(),
            refreshed: Instant::now(),
        }
    }

    fn refill(&mut self, config: &RateLimitConfig) {
        let now = Instant::now();
        let earned = now.duration_since(self.refreshed).as_secs_f64() * config.refill_per_sec();
        self.tokens = (self.tokens + earned).min(config.capacity());
        self.refreshed = now;
    }
}

/// Keyed token-bucket rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn with_bucket<R>(&self, key: &str, f: impl FnOnce(&mut Bucket, &RateLimitConfig) -> R) -> R {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::full(&self.config));
        bucket.refill(&self.config);
        f(bucket, &self.config)
    }

    /// Take one token for `key` if available
    #[must_use]
    pub fn try_acquire(&self, key: &str) -> bool {
        self.with_bucket(key, |bucket, _| {
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                true
            } else {
                false
            }
        })
    }

    /// Whole tokens currently available for `key`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn available(&self, key: &str) -> u32 {
        self.with_bucket(key, |bucket, _| bucket.tokens.floor() as u32)
    }

    /// How long until one token is available for `key`
    #[must_use]
    pub fn time_until_available(&self, key: &str) -> Duration {
        self.with_bucket(key, |bucket, config| {
            if bucket.tokens >= 1.0 {
                Duration::ZERO
            } else {
                Duration::try_from_secs_f64((1.0 - bucket.tokens) / config.refill_per_sec())
                    .unwrap_or(Duration::MAX)
            }
        })
    }

    /// Forget the bucket for `key`, restoring full capacity
    pub fn reset(&self, key: &str) {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
