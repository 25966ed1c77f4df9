//! Fetch outcomes and provenance

use serde::{Deserialize, Serialize};

/// Where a served value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Cache entry within its TTL; no upstream call was made.
    Fresh,
    /// Fetched from the upstream during this request.
    Live,
    /// Expired cache entry served after an upstream failure.
    Stale,
    /// Synthetic placeholder data.
    Mock,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Fresh => "fresh",
            Provenance::Live => "live",
            Provenance::Stale => "stale",
            Provenance::Mock => "mock",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the fallback chain for one request.
///
/// Upstream errors never appear here: a failed fetch is already resolved
/// into `Stale`, `Mock` or `Unavailable`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fresh(T),
    Live(T),
    Stale(T),
    Mock(T),
    /// Every tier came up empty and no synthetic substitute exists.
    Unavailable,
}

impl<T> FetchOutcome<T> {
    /// Provenance of the carried value, or `None` for `Unavailable`.
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            FetchOutcome::Fresh(_) => Some(Provenance::Fresh),
            FetchOutcome::Live(_) => Some(Provenance::Live),
            FetchOutcome::Stale(_) => Some(Provenance::Stale),
            FetchOutcome::Mock(_) => Some(Provenance::Mock),
            FetchOutcome::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchOutcome::Unavailable)
    }

    /// Split into value and provenance.
    pub fn into_parts(self) -> Option<(T, Provenance)> {
        match self {
            FetchOutcome::Fresh(v) => Some((v, Provenance::Fresh)),
            FetchOutcome::Live(v) => Some((v, Provenance::Live)),
            FetchOutcome::Stale(v) => Some((v, Provenance::Stale)),
            FetchOutcome::Mock(v) => Some((v, Provenance::Mock)),
            FetchOutcome::Unavailable => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchOutcome::Fresh(v)
            | FetchOutcome::Live(v)
            | FetchOutcome::Stale(v)
            | FetchOutcome::Mock(v) => Some(v),
            FetchOutcome::Unavailable => None,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        self.provenance().map_or("unavailable", |p| p.as_str())
    }
}

impl<T> From<(T, Provenance)> for FetchOutcome<T> {
    fn from((value, provenance): (T, Provenance)) -> Self {
        match provenance {
            Provenance::Fresh => FetchOutcome::Fresh(value),
            Provenance::Live => FetchOutcome::Live(value),
            Provenance::Stale => FetchOutcome::Stale(value),
            Provenance::Mock => FetchOutcome::Mock(value),
        }
    }
}
