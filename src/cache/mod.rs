//! Caching subsystem.
//!
//! One [`TtlCache`] per [`PayloadKind`], each with its own time-to-live.
//! Every entry has two read modes:
//!
//! - [`CacheStore::get`] — *fresh* read, only while `now < fresh_until`
//! - [`CacheStore::get_stale`] — any entry that exists, however old
//!
//! Freshness is decided lazily at read time. Nothing sweeps expired entries:
//! an entry stays readable as stale until a newer successful fetch
//! overwrites it (or the capacity bound evicts it).
//!
//! # Shared backends
//!
//! The orchestrator only talks to the [`CacheStore`] trait. A deployment
//! running several proxy instances can put a shared key-value store behind
//! the same three operations; keys from [`derive_key`](crate::key::derive_key)
//! are stable across processes, so nothing else changes.

mod ttl;

pub use ttl::{CacheEntry, TtlCache};

use std::time::Duration;

use async_trait::async_trait;

use crate::key::CacheKey;
use crate::types::PayloadKind;

/// Fresh/stale key-value store contract.
#[async_trait]
pub trait CacheStore<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Value for `key` if present and still within its TTL.
    async fn get(&self, key: &CacheKey) -> Option<T>;

    /// Value for `key` if present at all, regardless of freshness.
    async fn get_stale(&self, key: &CacheKey) -> Option<T>;

    /// Insert or overwrite the entry for `key`, fresh for `ttl` from now.
    async fn set(&self, key: &CacheKey, value: T, ttl: Duration);
}

/// Configuration for the per-kind cache stores.
///
/// ```rust
/// # use hugin::CacheConfig;
/// # use hugin::types::PayloadKind;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(5_000)
///     .ttl(PayloadKind::Dashboard, Duration::from_secs(30));
/// assert_eq!(config.ttl_for(PayloadKind::Dashboard), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum entries held per kind. Default: 10,000.
    pub max_entries: u64,
    /// Dashboard TTL. Default: 60s.
    pub dashboard_ttl: Duration,
    /// Signal aggregation TTL. Default: 120s.
    pub signals_ttl: Duration,
    /// Article detail TTL. Default: 300s.
    pub article_ttl: Duration,
    /// Article listing TTL. Default: 60s.
    pub articles_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            dashboard_ttl: Duration::from_secs(60),
            signals_ttl: Duration::from_secs(120),
            article_ttl: Duration::from_secs(300),
            articles_ttl: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-kind capacity bound.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the TTL for one payload kind.
    pub fn ttl(mut self, kind: PayloadKind, ttl: Duration) -> Self {
        match kind {
            PayloadKind::Dashboard => self.dashboard_ttl = ttl,
            PayloadKind::Signals => self.signals_ttl = ttl,
            PayloadKind::ArticleDetail => self.article_ttl = ttl,
            PayloadKind::ArticleList => self.articles_ttl = ttl,
        }
        self
    }

    /// TTL configured for a payload kind.
    pub fn ttl_for(&self, kind: PayloadKind) -> Duration {
        match kind {
            PayloadKind::Dashboard => self.dashboard_ttl,
            PayloadKind::Signals => self.signals_ttl,
            PayloadKind::ArticleDetail => self.article_ttl,
            PayloadKind::ArticleList => self.articles_ttl,
        }
    }
}
