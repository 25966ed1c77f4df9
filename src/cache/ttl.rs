//! In-memory fresh/stale store.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use super::CacheStore;
use crate::key::CacheKey;
use crate::telemetry;
use crate::types::PayloadKind;

/// A stored value with its freshness window.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: Instant,
    pub fresh_until: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            stored_at: now,
            fresh_until: now + ttl,
        }
    }

    /// Whether the entry is still inside its TTL at `now`.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.fresh_until
    }
}

/// Process-local [`CacheStore`] for one payload kind.
///
/// Backed by moka with a capacity bound but *no* moka TTL: expiry here only
/// demotes an entry from fresh to stale, it never removes it. Eviction is
/// plain LRU, so a new key is always admitted and the least recently read
/// entry makes room. Time comes from `tokio::time::Instant`, so a paused
/// test runtime controls it.
pub struct TtlCache<T> {
    kind: PayloadKind,
    entries: moka::sync::Cache<CacheKey, CacheEntry<T>>,
}

impl<T> TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty store holding at most `max_entries` keys.
    pub fn new(kind: PayloadKind, max_entries: u64) -> Self {
        Self {
            kind,
            entries: moka::sync::Cache::builder()
                .max_capacity(max_entries)
                .eviction_policy(moka::policy::EvictionPolicy::lru())
                .build(),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Full entry for `key`, fresh or not.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        self.entries.get(key)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, fresh and stale.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

#[async_trait]
impl<T> CacheStore<T> for TtlCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Option<T> {
        let kind = self.kind.as_str();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh_at(Instant::now()) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => kind).increment(1);
                debug!(kind, %key, "cache hit");
                Some(entry.value)
            }
            _ => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "kind" => kind).increment(1);
                None
            }
        }
    }

    async fn get_stale(&self, key: &CacheKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        let kind = self.kind.as_str();
        metrics::counter!(telemetry::CACHE_STALE_HITS_TOTAL, "kind" => kind).increment(1);
        debug!(
            kind,
            %key,
            age_ms = entry.stored_at.elapsed().as_millis() as u64,
            "stale cache read"
        );
        Some(entry.value)
    }

    async fn set(&self, key: &CacheKey, value: T, ttl: Duration) {
        self.entries.insert(key.clone(), CacheEntry::new(value, ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_key_plain;

    fn key(text: &str) -> CacheKey {
        derive_key_plain(PayloadKind::Dashboard, text)
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_until_ttl_then_miss() {
        let cache = TtlCache::new(PayloadKind::Dashboard, 100);
        let k = key("AAPL:100.00");
        cache.set(&k, 1u32, Duration::from_secs(10)).await;

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert_eq!(cache.get(&k).await, Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(&k).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_survives_expiry() {
        let cache = TtlCache::new(PayloadKind::Dashboard, 100);
        let k = key("AAPL:100.00");
        cache.set(&k, "v1".to_string(), Duration::from_secs(1)).await;

        tokio::time::advance(Duration::from_secs(3_600)).await;
        assert_eq!(cache.get(&k).await, None);
        assert_eq!(cache.get_stale(&k).await.as_deref(), Some("v1"));
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_replaces_value_and_window() {
        let cache = TtlCache::new(PayloadKind::Dashboard, 100);
        let k = key("AAPL:100.00");
        cache.set(&k, 1u32, Duration::from_secs(1)).await;
        tokio::time::advance(Duration::from_secs(2)).await;

        cache.set(&k, 2u32, Duration::from_secs(1)).await;
        assert_eq!(cache.get(&k).await, Some(2));
        assert_eq!(cache.get_stale(&k).await, Some(2));

        let entry = cache.entry(&k).unwrap();
        assert_eq!(entry.fresh_until - entry.stored_at, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn zero_ttl_is_never_fresh() {
        let cache = TtlCache::new(PayloadKind::Dashboard, 100);
        let k = key("x");
        cache.set(&k, 1u32, Duration::ZERO).await;
        assert_eq!(cache.get(&k).await, None);
        assert_eq!(cache.get_stale(&k).await, Some(1));
    }

    #[tokio::test]
    async fn full_store_admits_new_key() {
        let cache = TtlCache::new(PayloadKind::Dashboard, 2);
        let (k1, k2, k3) = (key("k1"), key("k2"), key("k3"));
        cache.set(&k1, 1u32, Duration::from_secs(60)).await;
        cache.set(&k2, 2u32, Duration::from_secs(60)).await;
        // Popular entries must not lock out newcomers.
        for _ in 0..5 {
            assert_eq!(cache.get(&k1).await, Some(1));
            assert_eq!(cache.get(&k2).await, Some(2));
        }

        cache.set(&k3, 3u32, Duration::from_secs(60)).await;
        assert_eq!(cache.get(&k3).await, Some(3));
        assert!(cache.len() <= 2);
        assert_eq!(cache.get_stale(&k3).await, Some(3));
    }

    #[tokio::test]
    async fn clear_drops_stale_entries_too() {
        let cache = TtlCache::new(PayloadKind::Dashboard, 100);
        let k = key("x");
        cache.set(&k, 1u32, Duration::from_secs(60)).await;
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.get_stale(&k).await.is_none());
        assert!(cache.get(&k).await.is_none());
    }
}
