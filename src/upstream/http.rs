//! HTTP client for the Intelligence API.
//!
//! Endpoints used:
//!
//! | operation                  | request                                       |
//! |----------------------------|-----------------------------------------------|
//! | `fetch_dashboard`          | `POST /v1/dashboard` `{weights}`              |
//! | `fetch_signal_aggregation` | `POST /v1/signals/aggregate` `{weights,days}` |
//! | `fetch_article_full`       | `GET /v1/articles/{id}` + portfolio header    |
//! | `fetch_articles`           | `GET /v1/articles?ticker&category&page&limit` |

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use super::IntelligenceClient;
use crate::telemetry;
use crate::types::{ArticleFilter, Payload, WeightedHolding, validate_article_id};
use crate::{HuginError, Result};

/// Header carrying the canonical weight text on article requests.
pub const PORTFOLIO_HEADER: &str = "X-Portfolio-Weights";

/// Default upstream base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:8400";

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_BODY: usize = 256;

/// Connection settings for [`HttpIntelligenceClient`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL, without trailing slash. Default: `http://localhost:8400`.
    pub base_url: String,
    /// Bearer token, if the upstream requires one.
    pub api_key: Option<String>,
    /// Per-request timeout. Default: 10s.
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`IntelligenceClient`].
///
/// Every request carries the configured timeout; a timeout surfaces as
/// [`HuginError::Timeout`] and is handled like any other failure.
#[derive(Clone)]
pub struct HttpIntelligenceClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpIntelligenceClient {
    /// Build a client from connection settings.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HuginError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(http, config))
    }

    /// Build a client around an existing reqwest client.
    ///
    /// The configured timeout is still applied per request.
    pub fn with_http_client(http: Client, config: UpstreamConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            timeout: config.timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse `base_url` joined with `path` into a URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base_url, path)).map_err(|e| {
            HuginError::Configuration(format!("invalid upstream URL {}: {e}", self.base_url))
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.timeout(self.timeout);
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Send a request and decode a JSON payload, recording metrics.
    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<Payload> {
        let start = Instant::now();
        let result = self.send_inner(builder).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::UPSTREAM_REQUEST_DURATION_SECONDS,
            "operation" => operation,
        )
        .record(start.elapsed().as_secs_f64());
        debug!(
            operation,
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "upstream request finished"
        );
        result
    }

    async fn send_inner(&self, builder: RequestBuilder) -> Result<Payload> {
        let response = self.request(builder).send().await.map_err(|e| {
            if e.is_timeout() {
                HuginError::Timeout(self.timeout)
            } else {
                HuginError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        response.json::<Payload>().await.map_err(|e| {
            if e.is_timeout() {
                HuginError::Timeout(self.timeout)
            } else {
                HuginError::from(e)
            }
        })
    }
}

/// Map a non-2xx response to an error.
async fn status_error(status: StatusCode, response: reqwest::Response) -> HuginError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return HuginError::RateLimited { retry_after };
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY).collect()
    };
    HuginError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IntelligenceClient for HttpIntelligenceClient {
    fn name(&self) -> &str {
        "intelligence-http"
    }

    async fn fetch_dashboard(&self, weights: &[WeightedHolding]) -> Result<Payload> {
        let url = format!("{}/v1/dashboard", self.base_url);
        self.send(
            "fetch_dashboard",
            self.http.post(&url).json(&DashboardRequest { weights }),
        )
        .await
    }

    async fn fetch_signal_aggregation(
        &self,
        weights: &[WeightedHolding],
        days: u32,
    ) -> Result<Payload> {
        let url = format!("{}/v1/signals/aggregate", self.base_url);
        self.send(
            "fetch_signal_aggregation",
            self.http.post(&url).json(&SignalsRequest { weights, days }),
        )
        .await
    }

    async fn fetch_article_full(&self, article_id: &str, portfolio_header: &str) -> Result<Payload> {
        let article_id = validate_article_id(article_id)?;
        let mut url = self.endpoint("v1/articles")?;
        url.path_segments_mut()
            .map_err(|()| {
                HuginError::Configuration(format!("base URL cannot carry a path: {}", self.base_url))
            })?
            .push(article_id);
        self.send(
            "fetch_article_full",
            self.http
                .get(url)
                .header(PORTFOLIO_HEADER, portfolio_header),
        )
        .await
    }

    async fn fetch_articles(&self, filter: &ArticleFilter) -> Result<Payload> {
        let url = format!("{}/v1/articles", self.base_url);
        let query: Vec<(String, String)> = filter.params().into_iter().collect();
        self.send("fetch_articles", self.http.get(&url).query(&query))
            .await
    }
}

#[derive(Serialize)]
struct DashboardRequest<'a> {
    weights: &'a [WeightedHolding],
}

#[derive(Serialize)]
struct SignalsRequest<'a> {
    weights: &'a [WeightedHolding],
    days: u32,
}
