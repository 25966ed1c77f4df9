//! Fallback orchestration.
//!
//! A [`FallbackResolver`] runs one request through the tiers, in order:
//!
//! ```text
//!   store.get(key) ── hit ──────────────────────────────► Fresh
//!        │ miss
//!        ▼
//!   integration enabled? ── no ──► synthesize mock ─────► Mock
//!        │ yes
//!        ▼
//!   fetch_live() ── ok ──► store.set(key, value, ttl) ──► Live
//!        │ err (incl. timeout)
//!        ▼
//!   store.get_stale(key) ── hit ────────────────────────► Stale
//!        │ miss
//!        ▼
//!   synthesize mock ────────────────────────────────────► Mock
//! ```
//!
//! Upstream errors stop here. They are logged, counted and turned into a
//! [`FetchOutcome`]; the caller never sees them. A stale read does not extend
//! the entry's freshness window.
//!
//! Whether a synthesized mock is written back to the store is the
//! endpoint's [`MockPolicy`]. The same policy applies whether the mock came
//! from the disabled switch or from exhausting the other tiers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::Result;
use crate::cache::CacheStore;
use crate::key::CacheKey;
use crate::telemetry;
use crate::types::{FetchOutcome, PayloadKind, Provenance};

/// What to do with a synthesized mock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockPolicy {
    /// Store it, so requests within the TTL are served `Fresh` without
    /// synthesizing again.
    #[default]
    Cache,
    /// Serve it without storing; the next request retries the upstream.
    Skip,
}

/// Per-kind fallback coordinator.
///
/// Knows nothing about HTTP, authentication or the shape of `T`.
pub struct FallbackResolver<T> {
    kind: PayloadKind,
    store: Arc<dyn CacheStore<T>>,
    ttl: Duration,
    enabled: bool,
    mock_policy: MockPolicy,
}

impl<T> FallbackResolver<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a resolver over `store` with upstream calls enabled and
    /// mock results cached.
    pub fn new(kind: PayloadKind, store: Arc<dyn CacheStore<T>>, ttl: Duration) -> Self {
        Self {
            kind,
            store,
            ttl,
            enabled: true,
            mock_policy: MockPolicy::default(),
        }
    }

    /// Set whether the upstream integration is enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the mock caching policy.
    pub fn mock_policy(mut self, policy: MockPolicy) -> Self {
        self.mock_policy = policy;
        self
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve `key` through every tier, ending in `synthesize_mock`.
    ///
    /// Total: always yields a value and its provenance.
    pub async fn resolve<F, Fut, M>(
        &self,
        key: &CacheKey,
        fetch_live: F,
        synthesize_mock: M,
    ) -> (T, Provenance)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        M: FnOnce() -> T,
    {
        let resolved = match self.lookup(key, fetch_live).await {
            Some(hit) => hit,
            None => (self.synthesize(key, synthesize_mock).await, Provenance::Mock),
        };
        self.record(resolved.1.as_str());
        resolved
    }

    /// Resolve `key` for a payload with no synthetic substitute.
    ///
    /// Same tiers as [`resolve`](Self::resolve), but the last tier is
    /// [`FetchOutcome::Unavailable`] instead of a mock.
    pub async fn resolve_optional<F, Fut>(&self, key: &CacheKey, fetch_live: F) -> FetchOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let outcome = self
            .lookup(key, fetch_live)
            .await
            .map_or(FetchOutcome::Unavailable, FetchOutcome::from);
        self.record(outcome.label());
        outcome
    }

    fn record(&self, provenance: &'static str) {
        metrics::counter!(telemetry::RESOLUTIONS_TOTAL,
            "kind" => self.kind.as_str(),
            "provenance" => provenance,
        )
        .increment(1);
    }

    /// Fresh, live and stale tiers. `None` means the caller's last resort
    /// applies: the integration is off or the upstream failed with nothing
    /// cached.
    async fn lookup<F, Fut>(&self, key: &CacheKey, fetch_live: F) -> Option<(T, Provenance)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.store.get(key).await {
            return Some((value, Provenance::Fresh));
        }

        if !self.enabled {
            debug!(kind = %self.kind, %key, "intelligence integration disabled");
            return None;
        }

        match fetch_live().await {
            Ok(value) => {
                self.store.set(key, value.clone(), self.ttl).await;
                Some((value, Provenance::Live))
            }
            Err(e) => {
                warn!(kind = %self.kind, %key, error = %e, "upstream fetch failed, falling back");
                let value = self.store.get_stale(key).await?;
                Some((value, Provenance::Stale))
            }
        }
    }

    async fn synthesize<M>(&self, key: &CacheKey, synthesize_mock: M) -> T
    where
        M: FnOnce() -> T,
    {
        let value = synthesize_mock();
        if self.mock_policy == MockPolicy::Cache {
            self.store.set(key, value.clone(), self.ttl).await;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HuginError;
    use crate::cache::TtlCache;
    use crate::key::derive_key_plain;

    fn resolver(store: &Arc<TtlCache<u32>>) -> FallbackResolver<u32> {
        FallbackResolver::new(
            PayloadKind::ArticleDetail,
            store.clone() as Arc<dyn CacheStore<u32>>,
            Duration::from_secs(30),
        )
    }

    fn failing() -> impl Future<Output = Result<u32>> {
        async { Err(HuginError::Http("connection refused".into())) }
    }

    async fn never_called() -> Result<u32> {
        panic!("upstream must not be called")
    }

    #[tokio::test]
    async fn optional_unavailable_without_stale() {
        let store = Arc::new(TtlCache::new(PayloadKind::ArticleDetail, 10));
        let key = derive_key_plain(PayloadKind::ArticleDetail, "a1");

        let outcome = resolver(&store).resolve_optional(&key, failing).await;
        assert!(outcome.is_unavailable());
        assert!(store.entry(&key).is_none());
    }

    #[tokio::test]
    async fn optional_disabled_skips_upstream() {
        let store = Arc::new(TtlCache::new(PayloadKind::ArticleDetail, 10));
        let key = derive_key_plain(PayloadKind::ArticleDetail, "a1");

        let outcome = resolver(&store)
            .enabled(false)
            .resolve_optional(&key, never_called)
            .await;
        assert_eq!(outcome, FetchOutcome::Unavailable);
    }

    #[tokio::test]
    async fn skip_policy_leaves_store_untouched() {
        let store = Arc::new(TtlCache::new(PayloadKind::ArticleDetail, 10));
        let key = derive_key_plain(PayloadKind::ArticleDetail, "a1");
        let resolver = resolver(&store).mock_policy(MockPolicy::Skip);

        let (value, provenance) = resolver.resolve(&key, failing, || 7).await;
        assert_eq!((value, provenance), (7, Provenance::Mock));
        assert!(store.entry(&key).is_none());

        let (_, provenance) = resolver.resolve(&key, failing, || 7).await;
        assert_eq!(provenance, Provenance::Mock);
    }

    #[tokio::test]
    async fn cached_mock_reads_back_as_fresh() {
        let store = Arc::new(TtlCache::new(PayloadKind::ArticleDetail, 10));
        let key = derive_key_plain(PayloadKind::ArticleDetail, "a1");
        let resolver = resolver(&store).enabled(false);

        let (_, provenance) = resolver.resolve(&key, never_called, || 7).await;
        assert_eq!(provenance, Provenance::Mock);

        // The stored mock is indistinguishable from a live value to either entry point.
        assert_eq!(
            resolver.resolve(&key, never_called, || 8).await,
            (7, Provenance::Fresh)
        );
        assert_eq!(
            resolver.resolve_optional(&key, never_called).await,
            FetchOutcome::Fresh(7)
        );
    }
}
