//! Portfolio holding types

use serde::{Deserialize, Serialize};

/// A raw holding row as supplied by the holdings provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
    /// Latest market price, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    /// Average cost basis, used when the current price is unknown.
    pub average_price: f64,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, quantity: f64, average_price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            current_price: None,
            average_price,
        }
    }

    pub fn current_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }
}

/// One entry of a normalized weight vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedHolding {
    pub ticker: String,
    /// Share of total portfolio value, in percent, rounded to 2 decimals.
    pub weight_pct: f64,
}

/// Identifier of a portfolio owned by a principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(pub String);

impl PortfolioId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
