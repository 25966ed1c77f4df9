//! Builder for configuring proxy instances

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::IntelligenceProxy;
use super::proxy::Resolvers;
use crate::cache::{CacheConfig, CacheStore, TtlCache};
use crate::fallback::{FallbackResolver, MockPolicy};
use crate::holdings::HoldingsProvider;
use crate::mock::{BuiltinMocks, MockSynthesizer};
use crate::types::{Payload, PayloadKind};
use crate::upstream::{
    HttpIntelligenceClient, IntelligenceClient, RetryConfig, RetryingIntelligenceClient,
    UpstreamConfig,
};
use crate::{HuginError, Result};

/// Main entry point for creating proxy instances.
pub struct Hugin;

impl Hugin {
    /// Create a new builder for configuring the proxy.
    pub fn builder() -> HuginBuilder {
        HuginBuilder::new()
    }
}

/// Builder for configuring proxy instances.
pub struct HuginBuilder {
    upstream: Option<UpstreamConfig>,
    client: Option<Arc<dyn IntelligenceClient>>,
    holdings: Option<Arc<dyn HoldingsProvider>>,
    mocks: Arc<dyn MockSynthesizer>,
    cache: CacheConfig,
    stores: HashMap<PayloadKind, Arc<dyn CacheStore<Payload>>>,
    retry: RetryConfig,
    enabled: bool,
    mock_policies: HashMap<PayloadKind, MockPolicy>,
}

impl HuginBuilder {
    pub fn new() -> Self {
        Self {
            upstream: None,
            client: None,
            holdings: None,
            mocks: Arc::new(BuiltinMocks),
            cache: CacheConfig::default(),
            stores: HashMap::new(),
            retry: RetryConfig::default(),
            enabled: true,
            mock_policies: HashMap::new(),
        }
    }

    /// Call the Intelligence API over HTTP.
    pub fn upstream(mut self, config: UpstreamConfig) -> Self {
        self.upstream = Some(config);
        self
    }

    /// Use a custom upstream client instead of the HTTP one.
    ///
    /// Takes precedence over [`upstream`](Self::upstream). The client is
    /// still wrapped in the retry decorator unless retries are disabled.
    pub fn client(mut self, client: Arc<dyn IntelligenceClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the holdings provider (required).
    pub fn holdings(mut self, holdings: Arc<dyn HoldingsProvider>) -> Self {
        self.holdings = Some(holdings);
        self
    }

    /// Replace the built-in mock payloads.
    pub fn mocks(mut self, mocks: Arc<dyn MockSynthesizer>) -> Self {
        self.mocks = mocks;
        self
    }

    /// Set TTLs and capacity of the built-in stores.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Use an external store for one payload kind.
    ///
    /// The TTL still comes from the [`CacheConfig`].
    pub fn cache_store(mut self, kind: PayloadKind, store: Arc<dyn CacheStore<Payload>>) -> Self {
        self.stores.insert(kind, store);
        self
    }

    /// Set retry behaviour for upstream calls.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Enable or disable the upstream integration (default: enabled).
    ///
    /// When disabled, cache misses are served from the mock synthesizer and
    /// the upstream is never called.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Override whether synthesized mocks of `kind` are cached.
    ///
    /// Defaults: cached for dashboard and signals, not cached for the
    /// article list. Article detail has no mock, so its policy is unused.
    pub fn mock_policy(mut self, kind: PayloadKind, policy: MockPolicy) -> Self {
        self.mock_policies.insert(kind, policy);
        self
    }

    fn default_mock_policy(kind: PayloadKind) -> MockPolicy {
        match kind {
            PayloadKind::ArticleList => MockPolicy::Skip,
            _ => MockPolicy::Cache,
        }
    }

    fn build_client(&self) -> Result<Option<Arc<dyn IntelligenceClient>>> {
        let client: Arc<dyn IntelligenceClient> = match (&self.client, &self.upstream) {
            (Some(client), _) => client.clone(),
            (None, Some(config)) => Arc::new(HttpIntelligenceClient::new(config.clone())?),
            (None, None) if self.enabled => {
                return Err(HuginError::Configuration(
                    "intelligence integration is enabled but no upstream is configured".into(),
                ));
            }
            (None, None) => return Ok(None),
        };

        if self.retry.max_attempts > 1 {
            Ok(Some(Arc::new(RetryingIntelligenceClient::new(
                client,
                self.retry.clone(),
            ))))
        } else {
            Ok(Some(client))
        }
    }

    fn resolver(&self, kind: PayloadKind) -> FallbackResolver<Payload> {
        let store = self.stores.get(&kind).cloned().unwrap_or_else(|| {
            Arc::new(TtlCache::new(kind, self.cache.max_entries)) as Arc<dyn CacheStore<Payload>>
        });
        let policy = self
            .mock_policies
            .get(&kind)
            .copied()
            .unwrap_or_else(|| Self::default_mock_policy(kind));
        FallbackResolver::new(kind, store, self.ttl(kind))
            .enabled(self.enabled)
            .mock_policy(policy)
    }

    fn ttl(&self, kind: PayloadKind) -> Duration {
        self.cache.ttl_for(kind)
    }

    /// Build the proxy.
    pub fn build(self) -> Result<IntelligenceProxy> {
        let holdings = self
            .holdings
            .clone()
            .ok_or_else(|| HuginError::Configuration("no holdings provider configured".into()))?;
        let client = self.build_client()?;

        let resolvers = Resolvers {
            dashboard: self.resolver(PayloadKind::Dashboard),
            signals: self.resolver(PayloadKind::Signals),
            article: self.resolver(PayloadKind::ArticleDetail),
            articles: self.resolver(PayloadKind::ArticleList),
        };

        info!(
            enabled = self.enabled,
            upstream = client.as_ref().map(|c| c.name()).unwrap_or("none"),
            max_entries = self.cache.max_entries,
            "intelligence proxy configured"
        );

        Ok(IntelligenceProxy::new(
            client,
            holdings,
            self.mocks,
            resolvers,
        ))
    }
}

impl Default for HuginBuilder {
    fn default() -> Self {
        Self::new()
    }
}
