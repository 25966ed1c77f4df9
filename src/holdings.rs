//! Holdings collaborator.
//!
//! The proxy does not own persistence; it asks a [`HoldingsProvider`] for a
//! principal's default portfolio and for the raw rows of a portfolio.
//! Errors from the provider are hard errors and reach the caller.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::types::{Holding, PortfolioId, Principal};
use crate::{HuginError, Result};

/// Source of portfolio holdings.
#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    /// The portfolio to use when the request names none.
    async fn default_portfolio(&self, principal: &Principal) -> Result<Option<PortfolioId>>;

    /// Raw holding rows of `portfolio`, which must belong to `principal`.
    async fn holdings(&self, principal: &Principal, portfolio: &PortfolioId)
    -> Result<Vec<Holding>>;
}

#[derive(Default)]
struct Account {
    default: Option<PortfolioId>,
    portfolios: HashMap<PortfolioId, Vec<Holding>>,
}

/// Process-local [`HoldingsProvider`].
///
/// The first portfolio inserted for a principal becomes its default.
#[derive(Default)]
pub struct InMemoryHoldings {
    accounts: RwLock<HashMap<Principal, Account>>,
}

impl InMemoryHoldings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a portfolio's holdings.
    pub fn insert(&self, principal: Principal, portfolio: PortfolioId, holdings: Vec<Holding>) {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        let account = accounts.entry(principal).or_default();
        account.default.get_or_insert_with(|| portfolio.clone());
        account.portfolios.insert(portfolio, holdings);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_portfolio(
        self,
        principal: impl Into<String>,
        portfolio: impl Into<String>,
        holdings: Vec<Holding>,
    ) -> Self {
        self.insert(
            Principal::new(principal),
            PortfolioId::new(portfolio),
            holdings,
        );
        self
    }

    /// Make `portfolio` the principal's default. It must already exist.
    pub fn set_default(&self, principal: &Principal, portfolio: PortfolioId) -> Result<()> {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        let account = accounts
            .get_mut(principal)
            .filter(|a| a.portfolios.contains_key(&portfolio))
            .ok_or_else(|| HuginError::PortfolioNotFound(portfolio.to_string()))?;
        account.default = Some(portfolio);
        Ok(())
    }
}

#[async_trait]
impl HoldingsProvider for InMemoryHoldings {
    async fn default_portfolio(&self, principal: &Principal) -> Result<Option<PortfolioId>> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        Ok(accounts.get(principal).and_then(|a| a.default.clone()))
    }

    async fn holdings(
        &self,
        principal: &Principal,
        portfolio: &PortfolioId,
    ) -> Result<Vec<Holding>> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts
            .get(principal)
            .and_then(|a| a.portfolios.get(portfolio))
            .cloned()
            .ok_or_else(|| HuginError::PortfolioNotFound(portfolio.to_string()))
    }
}
