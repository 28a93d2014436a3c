//! High-level facade — `TradeForgeClient`.
//!
//! Composes the rate limiter, retry handler, TTL cache, batch processor,
//! and auth manager from a named preset (or an explicit policy) behind one
//! object that the resource wrappers call through.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::auth::{AuthManager, AuthTransport, Credentials};
use crate::batch::BatchProcessor;
use crate::cache::TtlCache;
use crate::config::ClientPolicy;
use crate::error::SdkError;
use crate::limiter::RateLimiter;
use crate::retry::RetryHandler;

struct ClientInner<T: AuthTransport> {
    policy: ClientPolicy,
    limiter: RateLimiter,
    retry: RetryHandler,
    cache: TtlCache<serde_json::Value>,
    batch: BatchProcessor,
    auth: AuthManager<T>,
}

/// The primary entry point for the TradeForge SDK.
///
/// Every outbound call flows through the same pipeline: acquire a rate
/// token, optionally serve from cache, otherwise run the retry-wrapped
/// caller-supplied operation. Bulk work routes through the batch processor
/// instead of a single call. The facade is transport-agnostic — operations
/// are arbitrary async functions supplied by the resource wrappers.
pub struct TradeForgeClient<T: AuthTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: AuthTransport> TradeForgeClient<T> {
    pub fn builder() -> TradeForgeClientBuilder {
        TradeForgeClientBuilder::default()
    }

    /// Run one outbound operation: one rate token, then the retry-wrapped
    /// call.
    pub async fn execute<R, E, F, Fut>(&self, op: F) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        self.inner.limiter.acquire().await;
        self.inner.retry.execute(op).await
    }

    /// Like `execute`, for idempotent reads: a fresh cache entry
    /// short-circuits without consuming a rate token; a miss performs the
    /// call and stores the result.
    pub async fn execute_cached<E, F, Fut>(
        &self,
        key: &str,
        op: F,
    ) -> Result<serde_json::Value, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, E>>,
        E: fmt::Display,
    {
        if let Some(hit) = self.inner.cache.get(key).await {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }
        let value = self.execute(op).await?;
        self.inner.cache.set(key, value.clone()).await;
        Ok(value)
    }

    /// Fan a list of work items out through the batch processor. Each
    /// item's call acquires its own rate token and is independently
    /// retried; `result[i]` holds item i's value or error.
    pub async fn execute_batch<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        processor: F,
    ) -> Vec<Result<R, E>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        let limiter = &self.inner.limiter;
        let processor = &processor;
        let rate_limited = move |item: I| async move {
            limiter.acquire().await;
            processor(item).await
        };
        self.inner
            .batch
            .process_with_retry(items, rate_limited, &self.inner.policy.retry)
            .await
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn auth(&self) -> &AuthManager<T> {
        &self.inner.auth
    }

    pub fn cache(&self) -> &TtlCache<serde_json::Value> {
        &self.inner.cache
    }

    pub fn policy(&self) -> &ClientPolicy {
        &self.inner.policy
    }

    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
    }
}

impl<T: AuthTransport> Clone for TradeForgeClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

/// Builds a `TradeForgeClient` from exactly one of a named preset or an
/// explicit policy. Setting both is a configuration error; setting neither
/// uses the balanced preset.
pub struct TradeForgeClientBuilder {
    base_url: String,
    preset: Option<String>,
    policy: Option<ClientPolicy>,
    credentials: Option<Credentials>,
}

impl Default for TradeForgeClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            preset: None,
            policy: None,
            credentials: None,
        }
    }
}

impl TradeForgeClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Select a named preset ("conservative", "balanced", "high-throughput").
    pub fn preset(mut self, name: &str) -> Self {
        self.preset = Some(name.to_string());
        self
    }

    /// Supply an explicit policy instead of a preset.
    pub fn policy(mut self, policy: ClientPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Pre-store credentials so `ensure_authenticated()` works on demand.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[cfg(feature = "http")]
    pub fn build(
        self,
    ) -> Result<TradeForgeClient<crate::http::HttpAuthTransport>, SdkError> {
        let transport = crate::http::HttpAuthTransport::new(&self.base_url);
        self.build_with_transport(transport)
    }

    /// Build against a caller-supplied transport (test harnesses, tunnels).
    pub fn build_with_transport<T: AuthTransport>(
        self,
        transport: T,
    ) -> Result<TradeForgeClient<T>, SdkError> {
        let policy = resolve_policy(self.preset, self.policy)?;

        let mut auth = AuthManager::new(transport);
        if let Some(credentials) = self.credentials {
            auth = auth.with_credentials(credentials);
        }

        Ok(TradeForgeClient {
            inner: Arc::new(ClientInner {
                limiter: RateLimiter::new(policy.rate_limit.clone()),
                retry: RetryHandler::new(policy.retry.clone()),
                cache: TtlCache::new(policy.cache.ttl),
                batch: BatchProcessor::new(policy.batch.clone()),
                auth,
                policy,
            }),
        })
    }
}

fn resolve_policy(
    preset: Option<String>,
    policy: Option<ClientPolicy>,
) -> Result<ClientPolicy, SdkError> {
    match (preset, policy) {
        (Some(_), Some(_)) => Err(SdkError::Config(
            "set either a preset or an explicit policy, not both".into(),
        )),
        (Some(name), None) => ClientPolicy::preset(&name),
        (None, Some(policy)) => {
            policy.validate()?;
            Ok(policy)
        }
        (None, None) => Ok(ClientPolicy::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_and_policy_together_are_rejected() {
        let err = resolve_policy(
            Some("balanced".into()),
            Some(ClientPolicy::conservative()),
        )
        .unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn unknown_preset_propagates_as_config_error() {
        let err = resolve_policy(Some("warp-speed".into()), None).unwrap_err();
        assert!(err.to_string().contains("warp-speed"));
    }

    #[test]
    fn explicit_policy_is_validated() {
        let mut policy = ClientPolicy::balanced();
        policy.rate_limit.capacity = 0;
        assert!(resolve_policy(None, Some(policy)).is_err());
    }

    #[test]
    fn no_selection_defaults_to_balanced() {
        let policy = resolve_policy(None, None).unwrap();
        assert_eq!(policy.rate_limit.capacity, 30);
    }
}
