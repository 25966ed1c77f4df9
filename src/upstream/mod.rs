//! Upstream Intelligence API access.
//!
//! [`IntelligenceClient`] is the seam between the proxy and the analytics
//! service: one method per payload kind, each of which may fail. The proxy
//! never lets those failures escape; see [`crate::fallback`].
//!
//! - [`HttpIntelligenceClient`] — reqwest client with a bounded timeout
//! - [`RetryingIntelligenceClient`] — decorator retrying transient errors

pub mod http;
pub mod retry;

pub use http::{HttpIntelligenceClient, UpstreamConfig};
pub use retry::{RetryConfig, RetryingIntelligenceClient};

use async_trait::async_trait;

use crate::Result;
use crate::types::{ArticleFilter, Payload, WeightedHolding};

/// Client for the external Intelligence API.
#[async_trait]
pub trait IntelligenceClient: Send + Sync {
    /// Client name for logging/metrics.
    fn name(&self) -> &str;

    /// Portfolio-wide dashboard for a weight vector.
    async fn fetch_dashboard(&self, weights: &[WeightedHolding]) -> Result<Payload>;

    /// Signal aggregation over the last `days` days.
    async fn fetch_signal_aggregation(
        &self,
        weights: &[WeightedHolding],
        days: u32,
    ) -> Result<Payload>;

    /// Full article, annotated against the portfolio described by
    /// `portfolio_header` (canonical weight text).
    async fn fetch_article_full(&self, article_id: &str, portfolio_header: &str) -> Result<Payload>;

    /// Article listing.
    async fn fetch_articles(&self, filter: &ArticleFilter) -> Result<Payload>;
}
