//! TTL cache for idempotent reads.

use async_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Age past which an entry is treated as absent.
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Expiring key/value store.
///
/// An entry is observably present only while `age < ttl`. Misses are silent,
/// never an error; stale entries are lazily evicted on `get` and proactively
/// by `cleanup_expired`. All operations serialize on an internal lock.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a value if present and fresh. A stale entry is evicted and
    /// reported as absent.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite, resetting the entry's age.
    pub async fn set(&self, key: &str, value: V) {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Sweep every entry whose age has reached the ttl. Returns the number
    /// of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_timer::Delay;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = TtlCache::new(Duration::from_millis(200));
        cache.set("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn expired_entry_is_absent_and_lazily_evicted() {
        let cache = TtlCache::new(Duration::from_millis(30));
        cache.set("k", 1u32).await;
        Delay::new(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k").await, None);
        // The stale entry was removed by the miss, not merely hidden.
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn overwrite_resets_age() {
        let cache = TtlCache::new(Duration::from_millis(80));
        cache.set("k", 1u32).await;
        Delay::new(Duration::from_millis(50)).await;
        cache.set("k", 2u32).await;
        Delay::new(Duration::from_millis(50)).await;
        // 100ms after the first insert but only 50ms after the overwrite.
        assert_eq!(cache.get("k").await, Some(2));
    }

    #[tokio::test]
    async fn cleanup_expired_sweeps_only_stale_entries() {
        let cache = TtlCache::new(Duration::from_millis(50));
        cache.set("old", 1u32).await;
        Delay::new(Duration::from_millis(70)).await;
        cache.set("fresh", 2u32).await;
        let removed = cache.cleanup_expired().await;
        assert_eq!(removed, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("fresh").await, Some(2));
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1u32).await;
        cache.set("b", 2u32).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
