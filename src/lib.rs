//! Hugin - cache-first proxy for a portfolio intelligence API
//!
//! Hugin sits between client requests and an external analytics service and
//! keeps answering when that service is slow, down, or switched off. Each
//! request is keyed by the caller's portfolio composition and resolved
//! through four tiers: fresh cache, live upstream, stale cache, and finally
//! synthetic placeholder data. Every response says which tier served it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hugin::{Holding, Hugin, InMemoryHoldings, Principal, UpstreamConfig};
//!
//! #[tokio::main]
//! async fn main() -> hugin::Result<()> {
//!     let holdings = InMemoryHoldings::new().with_portfolio(
//!         "user-1",
//!         "main",
//!         vec![Holding::new("AAPL", 10.0, 150.0), Holding::new("MSFT", 5.0, 300.0)],
//!     );
//!
//!     let proxy = Hugin::builder()
//!         .upstream(UpstreamConfig::new("http://localhost:8400"))
//!         .holdings(Arc::new(holdings))
//!         .build()?;
//!
//!     let response = proxy.dashboard(&Principal::new("user-1"), None).await?;
//!     println!("{:?}: {:?}", response.provenance(), response.data);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod holdings;
pub mod key;
pub mod mock;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod upstream;
pub mod weights;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheStore, TtlCache};
pub use error::{HuginError, Result};
pub use fallback::{FallbackResolver, MockPolicy};
pub use gateway::{Hugin, HuginBuilder, IntelligenceProxy};
pub use holdings::{HoldingsProvider, InMemoryHoldings};
pub use key::{CacheKey, derive_key, derive_key_plain};
pub use mock::{BuiltinMocks, MockSynthesizer};
pub use upstream::{
    HttpIntelligenceClient, IntelligenceClient, RetryConfig, RetryingIntelligenceClient,
    UpstreamConfig,
};
pub use weights::{canonical_text, normalize};

pub use types::{
    ArticleFilter, FetchOutcome, Holding, Payload, PayloadKind, PortfolioId, Principal,
    Provenance, ProxyResponse, ResponseMeta, WeightedHolding, validate_article_id,
};
