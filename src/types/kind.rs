//! Payload kinds served by the proxy

use serde::{Deserialize, Serialize};

/// The kinds of upstream payload the proxy caches independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Portfolio-wide intelligence dashboard.
    Dashboard,
    /// Signal aggregation over a lookback window.
    Signals,
    /// A single article, annotated for the caller's portfolio.
    ArticleDetail,
    /// A filtered, paginated article listing.
    ArticleList,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 4] = [
        PayloadKind::Dashboard,
        PayloadKind::Signals,
        PayloadKind::ArticleDetail,
        PayloadKind::ArticleList,
    ];

    /// Stable tag used as key prefix, metric label and config key.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Dashboard => "dashboard",
            PayloadKind::Signals => "signals",
            PayloadKind::ArticleDetail => "article",
            PayloadKind::ArticleList => "articles",
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
