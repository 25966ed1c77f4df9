//! Synthetic payloads served when live and cached data are both missing.
//!
//! Mocks are last-resort placeholders. They are shaped like the upstream
//! payloads so clients can render them, but carry a `"mock": true` marker
//! and make no claims about any real portfolio.

use serde_json::json;

use crate::types::{ArticleFilter, Payload};

/// Supplies synthetic payloads. Every method is total.
pub trait MockSynthesizer: Send + Sync {
    fn mock_dashboard(&self) -> Payload;

    /// Signal aggregation covering `days` of lookback.
    fn mock_signals(&self, days: u32) -> Payload;

    /// An article listing page; the built-in one is always empty.
    fn mock_articles(&self, filter: &ArticleFilter) -> Payload;
}

/// Built-in mock payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMocks;

impl MockSynthesizer for BuiltinMocks {
    fn mock_dashboard(&self) -> Payload {
        json!({
            "mock": true,
            "summary": {
                "sentiment": "neutral",
                "score": 0.0,
                "article_count": 0,
            },
            "top_movers": [],
            "themes": [
                { "name": "earnings", "weight": 0.4 },
                { "name": "macro", "weight": 0.35 },
                { "name": "sector rotation", "weight": 0.25 },
            ],
            "alerts": [],
        })
    }

    fn mock_signals(&self, days: u32) -> Payload {
        json!({
            "mock": true,
            "days": days,
            "signals": [],
            "aggregate": {
                "bullish": 0,
                "bearish": 0,
                "neutral": 0,
            },
        })
    }

    fn mock_articles(&self, filter: &ArticleFilter) -> Payload {
        json!({
            "mock": true,
            "articles": [],
            "page": filter.page,
            "limit": filter.limit,
            "total": 0,
        })
    }
}
