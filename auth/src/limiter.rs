//! Per-client rate limiting of verification attempts.
//!
//! # Algorithm
//!
//! Fixed window counter in the shared key-value store:
//! 1. `INCR rate_limit:scan:{client}` (window TTL applied when the key is created)
//! 2. Reject when the new count exceeds the limit
//!
//! A fixed window lets a client make up to twice the limit across a bucket
//! boundary. That drift is accepted.
//!
//! # Security
//!
//! The limiter fails closed: if the store cannot be reached the attempt is
//! rejected as rate limited.

use crate::constants::keys;
use crate::error::{AccessError, Result};
use canteen_core::KeyValueStore;
use std::sync::Arc;
use std::time::Duration;

/// Fixed-window rate limiter keyed by client identity.
#[derive(Clone)]
pub struct RateLimiter {
    kv: Arc<dyn KeyValueStore>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `max_attempts` per `window`.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, max_attempts: u32, window: Duration) -> Self {
        Self {
            kv,
            max_attempts,
            window,
        }
    }

    fn key(client_key: &str) -> String {
        format!("{}{client_key}", keys::RATE_LIMIT_SCAN)
    }

    fn limited(&self) -> AccessError {
        AccessError::RateLimited {
            retry_after: self.window,
        }
    }

    /// Whether another attempt is currently allowed, without counting one.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RateLimited` if the bucket is full or the store
    /// is unavailable.
    pub async fn check(&self, client_key: &str) -> Result<()> {
        let count = match self.kv.get(&Self::key(client_key)).await {
            Ok(Some(bytes)) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(u32::MAX),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(client_ip = %client_key, error = %e, "Rate limit store unavailable, rejecting");
                return Err(self.limited());
            }
        };

        if count >= self.max_attempts {
            return Err(self.limited());
        }
        Ok(())
    }

    /// Count one attempt.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RateLimited` if the store is unavailable.
    pub async fn record(&self, client_key: &str) -> Result<i64> {
        self.kv
            .incr(&Self::key(client_key), self.window)
            .await
            .map_err(|e| {
                tracing::warn!(client_ip = %client_key, error = %e, "Rate limit store unavailable, rejecting");
                self.limited()
            })
    }

    /// Count one attempt and reject it if it exceeds the limit.
    ///
    /// Uses a single atomic increment, so concurrent attempts from the same
    /// client cannot both slip under the limit.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RateLimited` if the limit is exceeded or the
    /// store is unavailable.
    pub async fn check_and_record(&self, client_key: &str) -> Result<()> {
        let count = self.record(client_key).await?;
        if count > i64::from(self.max_attempts) {
            tracing::info!(client_ip = %client_key, attempts = count, "Verification rate limited");
            metrics::counter!("access.rate_limited").increment(1);
            return Err(self.limited());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use canteen_testing::{InMemoryKeyValueStore, test_clock};

    fn limiter() -> (RateLimiter, InMemoryKeyValueStore, canteen_testing::FixedClock) {
        let clock = test_clock();
        let kv = InMemoryKeyValueStore::new(Arc::new(clock.clone()));
        let limiter = RateLimiter::new(Arc::new(kv.clone()), 10, Duration::from_secs(60));
        (limiter, kv, clock)
    }

    #[tokio::test]
    async fn test_eleventh_attempt_rejected() {
        let (limiter, _, _) = limiter();

        for _ in 0..10 {
            limiter.check_and_record("203.0.113.7").await.unwrap();
        }
        assert!(matches!(
            limiter.check_and_record("203.0.113.7").await,
            Err(AccessError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_window_resets() {
        let (limiter, _, clock) = limiter();

        for _ in 0..11 {
            let _ = limiter.check_and_record("203.0.113.7").await;
        }
        clock.advance(chrono::Duration::hours(1));
        limiter.check_and_record("203.0.113.7").await.unwrap();
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let (limiter, _, _) = limiter();

        for _ in 0..10 {
            limiter.check_and_record("203.0.113.7").await.unwrap();
        }
        limiter.check_and_record("198.51.100.2").await.unwrap();
    }

    #[tokio::test]
    async fn test_check_does_not_count() {
        let (limiter, _, _) = limiter();

        for _ in 0..20 {
            limiter.check("203.0.113.7").await.unwrap();
        }
        for _ in 0..9 {
            limiter.record("203.0.113.7").await.unwrap();
        }
        limiter.check("203.0.113.7").await.unwrap();
        limiter.record("203.0.113.7").await.unwrap();
        assert!(limiter.check("203.0.113.7").await.is_err());
    }

    #[tokio::test]
    async fn test_fails_closed() {
        let (limiter, kv, _) = limiter();
        kv.set_unavailable(true);

        assert!(matches!(
            limiter.check_and_record("203.0.113.7").await,
            Err(AccessError::RateLimited { .. })
        ));
        assert!(limiter.check("203.0.113.7").await.is_err());
    }
}
