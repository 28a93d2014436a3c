//! Aggregate client policy and named presets.
//!
//! A `ClientPolicy` is constructed once (from a preset or by hand), validated,
//! and passed into every component the facade builds — there is no
//! module-level mutable configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::batch::BatchPolicy;
use crate::cache::CachePolicy;
use crate::error::SdkError;
use crate::limiter::RateLimitPolicy;
use crate::retry::RetryPolicy;

/// Known preset names, in lookup order.
pub const PRESET_NAMES: [&str; 3] = ["conservative", "balanced", "high-throughput"];

/// Numeric policies for every component behind the facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPolicy {
    pub rate_limit: RateLimitPolicy,
    pub retry: RetryPolicy,
    pub batch: BatchPolicy,
    pub cache: CachePolicy,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        Self::balanced()
    }
}

impl ClientPolicy {
    /// Low request pressure, patient retries, long cache. Suited to shared
    /// or rate-sensitive accounts.
    pub fn conservative() -> Self {
        Self {
            rate_limit: RateLimitPolicy {
                capacity: 10,
                window: Duration::from_secs(60),
            },
            retry: RetryPolicy {
                max_retries: 5,
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
                backoff_factor: 2.0,
                jitter: true,
            },
            batch: BatchPolicy {
                batch_size: 5,
                max_concurrent: 2,
                batch_delay: Duration::from_secs(2),
            },
            cache: CachePolicy {
                ttl: Duration::from_secs(600),
            },
        }
    }

    /// The default operating mode.
    pub fn balanced() -> Self {
        Self {
            rate_limit: RateLimitPolicy {
                capacity: 30,
                window: Duration::from_secs(60),
            },
            retry: RetryPolicy::default(),
            batch: BatchPolicy::default(),
            cache: CachePolicy::default(),
        }
    }

    /// Aggressive throughput for dedicated servers: bigger bursts, larger
    /// batches, short-lived cache.
    pub fn high_throughput() -> Self {
        Self {
            rate_limit: RateLimitPolicy {
                capacity: 120,
                window: Duration::from_secs(60),
            },
            retry: RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_secs(5),
                backoff_factor: 2.0,
                jitter: true,
            },
            batch: BatchPolicy {
                batch_size: 25,
                max_concurrent: 8,
                batch_delay: Duration::from_millis(250),
            },
            cache: CachePolicy {
                ttl: Duration::from_secs(60),
            },
        }
    }

    /// Look up a preset by name. An unrecognized name is a configuration
    /// error, never a silent default.
    pub fn preset(name: &str) -> Result<Self, SdkError> {
        match name {
            "conservative" => Ok(Self::conservative()),
            "balanced" => Ok(Self::balanced()),
            "high-throughput" => Ok(Self::high_throughput()),
            other => Err(SdkError::Config(format!(
                "unknown preset {:?} (expected one of {:?})",
                other, PRESET_NAMES
            ))),
        }
    }

    /// Reject configurations the components cannot honor. In particular a
    /// zero-capacity bucket is refused here rather than clamped, since its
    /// wait formula would never terminate.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.rate_limit.capacity == 0 {
            return Err(SdkError::Config(
                "rate limit capacity must be at least 1".into(),
            ));
        }
        if self.rate_limit.window.is_zero() {
            return Err(SdkError::Config("rate limit window must be non-zero".into()));
        }
        if self.batch.batch_size == 0 {
            return Err(SdkError::Config("batch size must be at least 1".into()));
        }
        if self.batch.max_concurrent == 0 {
            return Err(SdkError::Config(
                "batch concurrency must be at least 1".into(),
            ));
        }
        if self.retry.backoff_factor < 1.0 {
            return Err(SdkError::Config(
                "retry backoff factor must be at least 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_preset_resolves_and_validates() {
        for name in PRESET_NAMES {
            let policy = ClientPolicy::preset(name).unwrap();
            policy.validate().unwrap();
        }
    }

    #[test]
    fn unknown_preset_is_a_config_error() {
        let err = ClientPolicy::preset("turbo").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
        assert!(err.to_string().contains("turbo"));
    }

    #[test]
    fn zero_capacity_bucket_is_rejected() {
        let mut policy = ClientPolicy::balanced();
        policy.rate_limit.capacity = 0;
        assert!(matches!(policy.validate(), Err(SdkError::Config(_))));
    }

    #[test]
    fn zero_batch_concurrency_is_rejected() {
        let mut policy = ClientPolicy::balanced();
        policy.batch.max_concurrent = 0;
        assert!(policy.validate().is_err());
    }
}
