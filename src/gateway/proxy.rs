//! IntelligenceProxy - one method per proxied endpoint

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::fallback::FallbackResolver;
use crate::holdings::HoldingsProvider;
use crate::key::{derive_key, derive_key_plain};
use crate::mock::MockSynthesizer;
use crate::types::{
    ArticleFilter, FetchOutcome, Payload, PayloadKind, PortfolioId, Principal, ProxyResponse,
    WeightedHolding, validate_article_id,
};
use crate::upstream::IntelligenceClient;
use crate::weights::{canonical_text, normalize};
use crate::{HuginError, Result};

/// Lookback used when a signals request names none.
pub const DEFAULT_SIGNAL_DAYS: u32 = 7;
/// Longest lookback accepted for signal aggregation.
pub const MAX_SIGNAL_DAYS: u32 = 90;

pub(crate) struct Resolvers {
    pub(crate) dashboard: FallbackResolver<Payload>,
    pub(crate) signals: FallbackResolver<Payload>,
    pub(crate) article: FallbackResolver<Payload>,
    pub(crate) articles: FallbackResolver<Payload>,
}

/// Backend-for-frontend over the Intelligence API.
///
/// Every method normalizes the caller's portfolio, derives a cache key and
/// runs the fallback chain. Upstream failures are absorbed into the
/// response's provenance; only holdings errors are returned as `Err`.
///
/// Built with [`Hugin::builder()`](crate::Hugin::builder). Cheap to share
/// behind an `Arc`: all state is internally synchronised.
pub struct IntelligenceProxy {
    client: Option<Arc<dyn IntelligenceClient>>,
    holdings: Arc<dyn HoldingsProvider>,
    mocks: Arc<dyn MockSynthesizer>,
    resolvers: Resolvers,
}

impl IntelligenceProxy {
    pub(crate) fn new(
        client: Option<Arc<dyn IntelligenceClient>>,
        holdings: Arc<dyn HoldingsProvider>,
        mocks: Arc<dyn MockSynthesizer>,
        resolvers: Resolvers,
    ) -> Self {
        Self {
            client,
            holdings,
            mocks,
            resolvers,
        }
    }

    /// Whether the upstream integration is enabled.
    pub fn is_enabled(&self) -> bool {
        self.resolvers.dashboard.is_enabled()
    }

    /// Portfolio dashboard.
    #[instrument(skip(self), fields(principal = %principal))]
    pub async fn dashboard(
        &self,
        principal: &Principal,
        portfolio: Option<&PortfolioId>,
    ) -> Result<ProxyResponse<Payload>> {
        let Some(weights) = self.portfolio_weights(principal, portfolio).await? else {
            return Ok(ProxyResponse::no_portfolio());
        };
        let key = derive_key_plain(PayloadKind::Dashboard, &canonical_text(&weights));

        let resolved = self
            .resolvers
            .dashboard
            .resolve(
                &key,
                || async { self.upstream()?.fetch_dashboard(&weights).await },
                || self.mocks.mock_dashboard(),
            )
            .await;
        Ok(ProxyResponse::from_outcome(FetchOutcome::from(resolved), key))
    }

    /// Signal aggregation over `days` of lookback.
    ///
    /// `None` means [`DEFAULT_SIGNAL_DAYS`]; values are clamped to
    /// `1..=MAX_SIGNAL_DAYS`.
    #[instrument(skip(self), fields(principal = %principal))]
    pub async fn signals(
        &self,
        principal: &Principal,
        portfolio: Option<&PortfolioId>,
        days: Option<u32>,
    ) -> Result<ProxyResponse<Payload>> {
        let days = days.unwrap_or(DEFAULT_SIGNAL_DAYS).clamp(1, MAX_SIGNAL_DAYS);
        let Some(weights) = self.portfolio_weights(principal, portfolio).await? else {
            return Ok(ProxyResponse::no_portfolio());
        };
        let params = BTreeMap::from([("days".to_string(), days.to_string())]);
        let key = derive_key(PayloadKind::Signals, &canonical_text(&weights), &params);

        let resolved = self
            .resolvers
            .signals
            .resolve(
                &key,
                || async {
                    self.upstream()?
                        .fetch_signal_aggregation(&weights, days)
                        .await
                },
                || self.mocks.mock_signals(days),
            )
            .await;
        Ok(ProxyResponse::from_outcome(FetchOutcome::from(resolved), key))
    }

    /// A single article, annotated for the caller's portfolio.
    ///
    /// Works without a portfolio (the annotation is then empty). There is
    /// no synthetic article: when every tier misses, `data` is `None`.
    #[instrument(skip(self), fields(principal = %principal))]
    pub async fn article(
        &self,
        principal: &Principal,
        article_id: &str,
        portfolio: Option<&PortfolioId>,
    ) -> Result<ProxyResponse<Payload>> {
        let article_id = validate_article_id(article_id)?;
        let weights = self
            .portfolio_weights(principal, portfolio)
            .await?
            .unwrap_or_default();
        let header = canonical_text(&weights);
        let params = BTreeMap::from([("id".to_string(), article_id.to_string())]);
        let key = derive_key(PayloadKind::ArticleDetail, &header, &params);

        let outcome = self
            .resolvers
            .article
            .resolve_optional(&key, || async {
                self.upstream()?
                    .fetch_article_full(article_id, &header)
                    .await
            })
            .await;
        Ok(ProxyResponse::from_outcome(outcome, key))
    }

    /// Filtered article listing. Independent of any portfolio.
    #[instrument(skip(self))]
    pub async fn articles(&self, filter: ArticleFilter) -> Result<ProxyResponse<Payload>> {
        let filter = filter.normalized();
        let key = derive_key(PayloadKind::ArticleList, "", &filter.params());

        let resolved = self
            .resolvers
            .articles
            .resolve(
                &key,
                || async { self.upstream()?.fetch_articles(&filter).await },
                || self.mocks.mock_articles(&filter),
            )
            .await;
        Ok(ProxyResponse::from_outcome(FetchOutcome::from(resolved), key))
    }

    /// Weight vector of the selected (or default) portfolio.
    ///
    /// `Ok(None)` when nothing is selected and the principal has no default.
    async fn portfolio_weights(
        &self,
        principal: &Principal,
        portfolio: Option<&PortfolioId>,
    ) -> Result<Option<Vec<WeightedHolding>>> {
        let portfolio = match portfolio {
            Some(id) => id.clone(),
            None => match self.holdings.default_portfolio(principal).await? {
                Some(id) => id,
                None => {
                    debug!(%principal, "no portfolio selected");
                    return Ok(None);
                }
            },
        };
        let holdings = self.holdings.holdings(principal, &portfolio).await?;
        Ok(Some(normalize(&holdings)))
    }

    fn upstream(&self) -> Result<&Arc<dyn IntelligenceClient>> {
        self.client
            .as_ref()
            .ok_or_else(|| HuginError::Configuration("no upstream configured".into()))
    }
}
