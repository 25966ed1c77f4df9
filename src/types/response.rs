//! Response envelope returned to the HTTP boundary

use serde::{Deserialize, Serialize};

use super::outcome::{FetchOutcome, Provenance};

/// Metadata describing how a response was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    /// The value is an expired cache entry.
    #[serde(default)]
    pub stale: bool,
    /// Synthetic data was served because live data could not be obtained.
    ///
    /// Only set on the request that synthesized the mock. A mock stored under
    /// [`MockPolicy::Cache`](crate::MockPolicy::Cache) is later read back as
    /// `Fresh` (or `Stale`) with this flag clear; the payload's own
    /// `"mock": true` marker is the durable signal.
    #[serde(default)]
    pub fallback: bool,
    /// No portfolio was selected; `data` is null and no cache was consulted.
    #[serde(default)]
    pub no_portfolio: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
}

/// Payload plus provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyResponse<T> {
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

impl<T> ProxyResponse<T> {
    /// The short-circuit response for a caller with no portfolio.
    pub fn no_portfolio() -> Self {
        Self {
            data: None,
            meta: ResponseMeta {
                no_portfolio: true,
                ..ResponseMeta::default()
            },
        }
    }

    /// Build a response from a resolved fetch outcome.
    pub fn from_outcome(outcome: FetchOutcome<T>, cache_key: impl Into<String>) -> Self {
        let provenance = outcome.provenance();
        Self {
            data: outcome.into_parts().map(|(value, _)| value),
            meta: ResponseMeta {
                provenance,
                stale: provenance == Some(Provenance::Stale),
                fallback: provenance == Some(Provenance::Mock),
                no_portfolio: false,
                cache_key: Some(cache_key.into()),
            },
        }
    }

    pub fn provenance(&self) -> Option<Provenance> {
        self.meta.provenance
    }

    pub fn is_unavailable(&self) -> bool {
        self.data.is_none() && !self.meta.no_portfolio
    }
}
