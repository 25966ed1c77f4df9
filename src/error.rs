//! Hugin error types

use std::time::Duration;

/// Hugin error types
#[derive(Debug, thiserror::Error)]
pub enum HuginError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Collaborator errors
    #[error("holdings lookup failed: {0}")]
    Holdings(String),

    #[error("portfolio not found: {0}")]
    PortfolioNotFound(String),

    #[error("unauthenticated")]
    Unauthenticated,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HuginError {
    /// Whether a retry of the same upstream call could plausibly succeed.
    ///
    /// Transport failures, timeouts, rate limits and 5xx responses are
    /// transient. Everything else (4xx, bad input, configuration) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginError::Http(_) | HuginError::Timeout(_) | HuginError::RateLimited { .. } => true,
            HuginError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Upstream-provided hint for how long to wait before retrying.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HuginError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HuginError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HuginError::InvalidInput(format!("malformed upstream body: {err}"))
        } else {
            HuginError::Http(err.to_string())
        }
    }
}

/// Result type alias for Hugin operations
pub type Result<T> = std::result::Result<T, HuginError>;
