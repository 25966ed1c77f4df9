//! Public types for the Hugin API.

mod article;
mod holding;
mod kind;
mod outcome;
mod response;

pub use article::{
    ArticleFilter, DEFAULT_ARTICLE_LIMIT, MAX_ARTICLE_ID_LEN, MAX_ARTICLE_LIMIT, validate_article_id,
};
pub use holding::{Holding, PortfolioId, Principal, WeightedHolding};
pub use kind::PayloadKind;
pub use outcome::{FetchOutcome, Provenance};
pub use response::{ProxyResponse, ResponseMeta};

/// Upstream payloads are passed through to the client untouched.
pub type Payload = serde_json::Value;
