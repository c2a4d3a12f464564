//! Bounded-concurrency rate limiting for RPC calls.
//!
//! The remote API documents a ceiling of 240 requests per minute. This
//! limiter is a counting semaphore plus a fixed inter-call delay, not a
//! token bucket: bursts right after startup can momentarily exceed a strict
//! per-minute cap. That approximation is intentional and documented.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Limiter policy: how many calls may be in flight, and how long to pause
/// before each admitted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum concurrent in-flight calls.
    pub max_concurrent: usize,
    /// Delay applied after a slot is acquired, before the call is issued.
    pub delay: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            delay: Duration::from_millis(250),
        }
    }
}

/// Counting-semaphore limiter. A slot is held for the duration of a call
/// and released when the returned permit drops.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    delay: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            delay: config.delay,
        }
    }

    /// Wait for a free slot, apply the inter-call delay, and return the
    /// permit. Dropping the permit releases the slot.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore closed");

        if self.delay > Duration::ZERO {
            debug!("rate limiter slot acquired, delaying {:?}", self.delay);
            tokio::time::sleep(self.delay).await;
        }

        permit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_concurrent: 3,
            delay: Duration::ZERO,
        });

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_concurrent: 0,
            delay: Duration::ZERO,
        });
        // Would deadlock without the clamp.
        let _permit = limiter.acquire().await;
    }
}
