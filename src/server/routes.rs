//! HTTP routes.
//!
//! The handlers stay thin: extract the principal and query, call the proxy,
//! and translate the response's provenance into headers. Authentication is
//! assumed to have happened upstream; the trusted `X-User-Id` header carries
//! the caller's identity.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::HuginError;
use crate::gateway::IntelligenceProxy;
use crate::types::{ArticleFilter, Payload, PortfolioId, Principal, Provenance, ProxyResponse};

/// Trusted identity header set by the authenticating front end.
pub const USER_HEADER: &str = "x-user-id";
/// Which tier served the payload: `fresh`, `live`, `stale` or `mock`.
pub const SOURCE_HEADER: &str = "x-intelligence-source";
/// Present (`true`) when an expired cache entry was served.
pub const STALE_HEADER: &str = "x-data-stale";
/// Present (`mock`) when synthetic data replaced live data.
pub const FALLBACK_HEADER: &str = "x-data-fallback";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    proxy: Arc<IntelligenceProxy>,
}

/// Build the application router.
pub fn router(proxy: Arc<IntelligenceProxy>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/intelligence/dashboard", get(dashboard))
        .route("/api/intelligence/signals", get(signals))
        .route("/api/intelligence/articles", get(articles))
        .route("/api/intelligence/articles/:id", get(article))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { proxy })
}

/// Caller identity taken from [`USER_HEADER`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthenticatedUser(Principal::new(id)))
            .ok_or(ApiError(HuginError::Unauthenticated))
    }
}

/// [`HuginError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub HuginError);

impl From<HuginError> for ApiError {
    fn from(err: HuginError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HuginError::Unauthenticated => StatusCode::UNAUTHORIZED,
            HuginError::PortfolioNotFound(_) => StatusCode::NOT_FOUND,
            HuginError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult = std::result::Result<Response, ApiError>;

#[derive(Debug, Default, Deserialize)]
struct PortfolioQuery {
    portfolio_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SignalsQuery {
    portfolio_id: Option<String>,
    days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticlesQuery {
    ticker: Option<String>,
    category: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl From<ArticlesQuery> for ArticleFilter {
    fn from(q: ArticlesQuery) -> Self {
        let defaults = ArticleFilter::default();
        ArticleFilter {
            ticker: q.ticker,
            category: q.category,
            page: q.page.unwrap_or(defaults.page),
            limit: q.limit.unwrap_or(defaults.limit),
        }
    }
}

fn selected_portfolio(id: Option<String>) -> Option<PortfolioId> {
    id.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PortfolioId)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "intelligence_enabled": state.proxy.is_enabled(),
    }))
}

async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<PortfolioQuery>,
) -> ApiResult {
    let portfolio = selected_portfolio(query.portfolio_id);
    let response = state.proxy.dashboard(&principal, portfolio.as_ref()).await?;
    Ok(render(response))
}

async fn signals(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<SignalsQuery>,
) -> ApiResult {
    let portfolio = selected_portfolio(query.portfolio_id);
    let response = state
        .proxy
        .signals(&principal, portfolio.as_ref(), query.days)
        .await?;
    Ok(render(response))
}

async fn articles(
    State(state): State<AppState>,
    AuthenticatedUser(_principal): AuthenticatedUser,
    Query(query): Query<ArticlesQuery>,
) -> ApiResult {
    let response = state.proxy.articles(query.into()).await?;
    Ok(render(response))
}

async fn article(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<PortfolioQuery>,
) -> ApiResult {
    let portfolio = selected_portfolio(query.portfolio_id);
    let response = state
        .proxy
        .article(&principal, &id, portfolio.as_ref())
        .await?;
    if response.is_unavailable() {
        let body = json!({ "error": format!("article {id} is unavailable") });
        return Ok((StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response());
    }
    Ok(render(response))
}

/// Serialize a proxy response, adding provenance headers.
fn render(response: ProxyResponse<Payload>) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(provenance) = response.provenance() {
        headers.insert(SOURCE_HEADER, HeaderValue::from_static(provenance.as_str()));
        match provenance {
            Provenance::Stale => {
                headers.insert(STALE_HEADER, HeaderValue::from_static("true"));
            }
            Provenance::Mock => {
                headers.insert(FALLBACK_HEADER, HeaderValue::from_static("mock"));
            }
            Provenance::Fresh | Provenance::Live => {}
        }
    }
    (StatusCode::OK, headers, Json(response)).into_response()
}
