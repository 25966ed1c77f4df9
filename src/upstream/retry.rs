//! Retry configuration and the retrying client decorator.
//!
//! Retries happen *before* the fallback chain sees a failure: the resolver
//! only falls back to stale or mock data once every attempt has failed.
//! Keep the attempt count low, since the caller is waiting on the result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::IntelligenceClient;
use crate::telemetry;
use crate::types::{ArticleFilter, Payload, WeightedHolding};
use crate::{HuginError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff capped at `max_delay`:
///
/// ```rust
/// # use hugin::upstream::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(3)
///     .initial_delay(Duration::from_millis(100));
/// assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 2.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 200ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries. Default: 2s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Backoff for a given attempt number (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Backoff honouring an upstream `retry_after` hint, still capped at
    /// `max_delay` so a hostile hint cannot stall the request.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|d| d.min(self.max_delay))
            .unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Execute an async operation with retry logic.
///
/// Transient errors (per [`HuginError::is_transient()`]) are retried up to
/// `config.max_attempts`; permanent errors are returned immediately.
pub(crate) async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..config.max_attempts.max(1) {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < config.max_attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "operation" => operation.to_owned(),
                    )
                    .increment(1);
                    let delay = config.effective_delay(attempt, e.retry_after());
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| HuginError::Http("no attempts made".into())))
}

/// Decorator that wraps an [`IntelligenceClient`] with retry logic.
pub struct RetryingIntelligenceClient {
    inner: Arc<dyn IntelligenceClient>,
    config: RetryConfig,
}

impl RetryingIntelligenceClient {
    /// Wrap a client with retry logic.
    pub fn new(inner: Arc<dyn IntelligenceClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl IntelligenceClient for RetryingIntelligenceClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_dashboard(&self, weights: &[WeightedHolding]) -> Result<Payload> {
        with_retry(&self.config, "fetch_dashboard", || {
            self.inner.fetch_dashboard(weights)
        })
        .await
    }

    async fn fetch_signal_aggregation(
        &self,
        weights: &[WeightedHolding],
        days: u32,
    ) -> Result<Payload> {
        with_retry(&self.config, "fetch_signal_aggregation", || {
            self.inner.fetch_signal_aggregation(weights, days)
        })
        .await
    }

    async fn fetch_article_full(&self, article_id: &str, portfolio_header: &str) -> Result<Payload> {
        with_retry(&self.config, "fetch_article_full", || {
            self.inner.fetch_article_full(article_id, portfolio_header)
        })
        .await
    }

    async fn fetch_articles(&self, filter: &ArticleFilter) -> Result<Payload> {
        with_retry(&self.config, "fetch_articles", || {
            self.inner.fetch_articles(filter)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let config = RetryConfig::new()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(40), Duration::from_millis(350));
    }

    #[test]
    fn retry_after_hint_is_capped() {
        let config = RetryConfig::new().max_delay(Duration::from_secs(2));
        assert_eq!(
            config.effective_delay(0, Some(Duration::from_secs(600))),
            Duration::from_secs(2)
        );
        assert_eq!(
            config.effective_delay(0, Some(Duration::from_millis(50))),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn disabled_is_single_attempt() {
        assert_eq!(RetryConfig::disabled().max_attempts, 1);
    }
}
