//! Token-bucket rate limiter for outbound API calls.

use async_lock::Mutex;
use futures_timer::Delay;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Admission policy: `capacity` calls per `window`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum burst size. Must be at least 1.
    pub capacity: u32,
    /// Window over which `capacity` tokens refill.
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            capacity: 30,
            window: Duration::from_secs(60),
        }
    }
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket admission control.
///
/// `acquire()` consumes one token, delaying the caller when the bucket is
/// empty. It never fails — the limiter only ever slows callers down.
pub struct RateLimiter {
    capacity: f64,
    window: Duration,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Build a limiter from a policy. Zero capacity is rejected upstream by
    /// `ClientPolicy::validate`; a direct construction with zero capacity
    /// would wait forever.
    pub fn new(policy: RateLimitPolicy) -> Self {
        debug_assert!(policy.capacity >= 1, "rate limit capacity must be >= 1");
        debug_assert!(!policy.window.is_zero(), "rate limit window must be non-zero");
        Self {
            capacity: f64::from(policy.capacity),
            window: policy.window,
            state: Mutex::new(BucketState {
                tokens: f64::from(policy.capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Acquire one token, suspending until the bucket can supply it.
    ///
    /// The refill computation runs under the internal lock so concurrent
    /// callers never race on it; the suspension itself happens outside the
    /// lock. No ordering guarantee among waiters beyond the scheduler's.
    pub async fn acquire(&self) {
        let wait = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let elapsed = now.saturating_duration_since(state.last_refill);
            state.tokens =
                (state.tokens + elapsed.as_secs_f64() * self.refill_rate()).min(self.capacity);
            state.last_refill = now;

            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                None
            } else {
                let wait =
                    Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate());
                // The token accruing during the wait belongs to this caller.
                state.tokens = 0.0;
                state.last_refill = now + wait;
                Some(wait)
            }
        };

        if let Some(wait) = wait {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, delaying");
            Delay::new(wait).await;
        }
    }

    /// Tokens currently available, including refill since the last acquire.
    pub async fn available(&self) -> f64 {
        let state = self.state.lock().await;
        let elapsed = Instant::now().saturating_duration_since(state.last_refill);
        (state.tokens + elapsed.as_secs_f64() * self.refill_rate()).min(self.capacity)
    }

    fn refill_rate(&self) -> f64 {
        self.capacity / self.window.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitPolicy {
            capacity,
            window: Duration::from_millis(window_ms),
        })
    }

    #[tokio::test]
    async fn burst_up_to_capacity_is_undelayed() {
        let limiter = limiter(3, 300);
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn acquire_past_capacity_waits_one_refill_interval() {
        let limiter = limiter(3, 300);
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        // Bucket is empty; the fourth caller waits ~window/capacity = 100ms.
        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(80), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(250), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn tokens_refill_but_never_exceed_capacity() {
        let limiter = limiter(2, 100);
        limiter.acquire().await;
        limiter.acquire().await;
        // Sleep several windows; the bucket must cap at 2, not accumulate 6+.
        Delay::new(Duration::from_millis(320)).await;
        let available = limiter.available().await;
        assert!(available <= 2.0 + f64::EPSILON, "available {}", available);
        assert!(available >= 1.9, "available {}", available);
    }

    #[tokio::test]
    async fn concurrent_acquires_do_not_lose_tokens() {
        use std::sync::Arc;

        let limiter = Arc::new(limiter(4, 400));
        let start = Instant::now();
        let futs: Vec<_> = (0..4).map(|_| {
            let limiter = limiter.clone();
            async move { limiter.acquire().await }
        }).collect();
        futures_util::future::join_all(futs).await;
        assert!(start.elapsed() < Duration::from_millis(50));
        assert!(limiter.available().await < 1.0);
    }
}
