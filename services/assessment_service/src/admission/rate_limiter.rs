//! Per-key token bucket.
//!
//! Each key holds a token count and the start of its current window. A key that is new, or whose
//! window has run out, starts a fresh window with `rate - 1` tokens left and is admitted. Otherwise
//! a remaining token is spent, or the request is rejected until the window ends.
//!
//! Abandoned keys are removed by [`RateLimiter::sweep`], which drops every key whose window started
//! more than two window lengths ago. [`RateLimiter::spawn_sweeper`] runs it periodically.
//!
//! The table lives in process memory, so limits only hold for a single running instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::task::JoinHandle;
use tonic::Code;

use service_core::OperationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per key in one window.
    pub rate: u32,

    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 60,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Too many requests, retry in {retry_after:?}.")]
    RateLimited { retry_after: Duration },
}

impl OperationError for AdmissionError {
    fn code(&self) -> Code {
        match self {
            AdmissionError::RateLimited { .. } => Code::ResourceExhausted,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    window_start: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub fn allow(&self, key: &str) -> Result<(), AdmissionError> {
        self.allow_at(key, Instant::now())
    }

    /// [`allow`](Self::allow) against an explicit clock reading.
    pub fn allow_at(&self, key: &str, now: Instant) -> Result<(), AdmissionError> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        match buckets.get_mut(key) {
            Some(bucket) if now.saturating_duration_since(bucket.window_start) < self.config.window => {
                if bucket.tokens == 0 {
                    let retry_after = self
                        .config
                        .window
                        .saturating_sub(now.saturating_duration_since(bucket.window_start));
                    tracing::warn!(key, ?retry_after, rate = self.config.rate, "rate limit exceeded");
                    return Err(AdmissionError::RateLimited { retry_after });
                }
                bucket.tokens -= 1;
            }
            _ => {
                buckets.insert(
                    key.to_owned(),
                    Bucket {
                        tokens: self.config.rate.saturating_sub(1),
                        window_start: now,
                    },
                );
            }
        }

        Ok(())
    }

    /// Number of keys currently held in the table.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Removes keys whose window started more than two windows ago. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let max_age = self.config.window.saturating_mul(2);
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.window_start) <= max_age);
        let removed = before - buckets.len();

        tracing::debug!(removed, remaining = buckets.len(), "rate limiter sweep");
        removed
    }

    /// Sweeps every `interval` on the current tokio runtime until the handle is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rate: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            rate,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn sixth_call_in_window_is_rejected() {
        let limiter = limiter(5, 1);
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.allow_at("10.0.0.1", start).is_ok(), "call {} should pass", i + 1);
        }

        let err = limiter.allow_at("10.0.0.1", start + Duration::from_millis(500)).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::RateLimited {
                retry_after: Duration::from_millis(500)
            }
        );
        assert_eq!(err.code(), Code::ResourceExhausted);
    }

    #[test]
    fn new_window_admits_again() {
        let limiter = limiter(5, 1);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.allow_at("10.0.0.1", start).unwrap();
        }
        assert!(limiter.allow_at("10.0.0.1", start).is_err());
        assert!(limiter.allow_at("10.0.0.1", start + Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.allow_at("alice", now).is_ok());
        assert!(limiter.allow_at("alice", now).is_err());
        assert!(limiter.allow_at("bob", now).is_ok());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn sweep_drops_only_stale_keys() {
        let limiter = limiter(5, 10);
        let start = Instant::now();

        limiter.allow_at("stale", start).unwrap();
        limiter.allow_at("fresh", start + Duration::from_secs(15)).unwrap();

        assert_eq!(limiter.sweep_at(start + Duration::from_secs(20)), 0);
        assert_eq!(limiter.sweep_at(start + Duration::from_secs(21)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn swept_key_starts_a_fresh_window() {
        let limiter = limiter(1, 1);
        let start = Instant::now();

        limiter.allow_at("k", start).unwrap();
        limiter.sweep_at(start + Duration::from_secs(3));

        assert_eq!(limiter.tracked_keys(), 0);
        assert!(limiter.allow_at("k", start + Duration::from_secs(3)).is_ok());
    }

    #[tokio::test]
    async fn sweeper_runs_on_its_interval() {
        let limiter = Arc::new(limiter(5, 1));
        let long_ago = Instant::now().checked_sub(Duration::from_secs(10)).unwrap();
        limiter.allow_at("k", long_ago).unwrap();

        let handle = Arc::clone(&limiter).spawn_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(limiter.tracked_keys(), 0);
        handle.abort();
    }
}
