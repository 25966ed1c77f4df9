//! Portfolio weight normalization.
//!
//! Turns raw holding rows into the canonical weight vector that identifies a
//! portfolio for caching purposes. Two portfolios with the same composition
//! produce the same vector no matter how their rows were stored:
//!
//! - tickers are trimmed and upper-cased, and rows sharing a ticker are merged
//! - each position is valued at its current price, or at average cost when
//!   the current price is unknown
//! - weights are percentages of total value rounded to [`WEIGHT_DECIMALS`]
//! - output is sorted by ticker

use std::collections::BTreeMap;

use crate::types::{Holding, WeightedHolding};

/// Decimal places kept in each weight percentage.
pub const WEIGHT_DECIMALS: i32 = 2;

/// Build the canonical weight vector for a set of holdings.
///
/// Returns an empty vector when nothing in the portfolio has a positive value.
pub fn normalize(holdings: &[Holding]) -> Vec<WeightedHolding> {
    // BTreeMap gives ticker-sorted iteration for free.
    let mut values: BTreeMap<String, f64> = BTreeMap::new();
    for holding in holdings {
        let ticker = holding.ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            continue;
        }
        let value = holding.quantity * effective_price(holding);
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        *values.entry(ticker).or_insert(0.0) += value;
    }

    let total: f64 = values.values().sum();
    if !total.is_finite() || total <= 0.0 {
        return Vec::new();
    }

    values
        .into_iter()
        .map(|(ticker, value)| WeightedHolding {
            ticker,
            weight_pct: round_weight(100.0 * value / total),
        })
        .collect()
}

/// Render a weight vector as `TICKER:WW.WW` pairs joined by commas.
///
/// This is the key-deriver input and the portfolio header sent upstream.
/// The empty vector renders as the empty string.
pub fn canonical_text(weights: &[WeightedHolding]) -> String {
    weights
        .iter()
        .map(|w| format!("{}:{:.2}", w.ticker, w.weight_pct))
        .collect::<Vec<_>>()
        .join(",")
}

fn effective_price(holding: &Holding) -> f64 {
    match holding.current_price {
        Some(price) if price.is_finite() && price > 0.0 => price,
        _ => holding.average_price,
    }
}

fn round_weight(pct: f64) -> f64 {
    let factor = 10f64.powi(WEIGHT_DECIMALS);
    (pct * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight(weights: &[WeightedHolding], ticker: &str) -> f64 {
        weights
            .iter()
            .find(|w| w.ticker == ticker)
            .map(|w| w.weight_pct)
            .unwrap_or_else(|| panic!("no weight for {ticker}"))
    }

    #[test]
    fn equal_value_positions_split_evenly() {
        let holdings = vec![
            Holding::new("MSFT", 5.0, 300.0),
            Holding::new("AAPL", 10.0, 150.0),
        ];
        let weights = normalize(&holdings);
        assert_eq!(
            weights,
            vec![
                WeightedHolding {
                    ticker: "AAPL".into(),
                    weight_pct: 50.0
                },
                WeightedHolding {
                    ticker: "MSFT".into(),
                    weight_pct: 50.0
                },
            ]
        );
    }

    #[test]
    fn empty_portfolio_yields_empty_vector() {
        assert!(normalize(&[]).is_empty());
        assert_eq!(canonical_text(&normalize(&[])), "");
    }

    #[test]
    fn current_price_preferred_over_average_cost() {
        let holdings = vec![
            Holding::new("AAPL", 1.0, 100.0).current_price(300.0),
            Holding::new("MSFT", 1.0, 100.0),
        ];
        let weights = normalize(&holdings);
        assert_eq!(weight(&weights, "AAPL"), 75.0);
        assert_eq!(weight(&weights, "MSFT"), 25.0);
    }

    #[test]
    fn non_positive_current_price_falls_back_to_average() {
        let holdings = vec![
            Holding::new("AAPL", 1.0, 100.0).current_price(0.0),
            Holding::new("MSFT", 1.0, 100.0).current_price(f64::NAN),
        ];
        let weights = normalize(&holdings);
        assert_eq!(weight(&weights, "AAPL"), 50.0);
        assert_eq!(weight(&weights, "MSFT"), 50.0);
    }

    #[test]
    fn zero_total_value_yields_empty_vector() {
        let holdings = vec![Holding::new("AAPL", 0.0, 150.0), Holding::new("MSFT", 3.0, 0.0)];
        assert!(normalize(&holdings).is_empty());
    }

    #[test]
    fn lots_of_same_ticker_are_merged() {
        let holdings = vec![
            Holding::new("aapl", 5.0, 150.0),
            Holding::new("MSFT", 5.0, 300.0),
            Holding::new(" AAPL ", 5.0, 150.0),
        ];
        let weights = normalize(&holdings);
        assert_eq!(weights.len(), 2);
        assert_eq!(weight(&weights, "AAPL"), 50.0);
    }

    #[test]
    fn weights_rounded_to_two_decimals() {
        let holdings = vec![
            Holding::new("A", 1.0, 1.0),
            Holding::new("B", 1.0, 1.0),
            Holding::new("C", 1.0, 1.0),
        ];
        let weights = normalize(&holdings);
        assert!(weights.iter().all(|w| w.weight_pct == 33.33));
        assert_eq!(canonical_text(&weights), "A:33.33,B:33.33,C:33.33");
    }

    #[test]
    fn weights_sum_to_one_hundred_within_tolerance() {
        let holdings = vec![
            Holding::new("NVDA", 7.0, 123.45),
            Holding::new("TSLA", 3.0, 250.10),
            Holding::new("AMZN", 11.0, 181.99),
            Holding::new("GOOG", 2.0, 171.02),
        ];
        let total: f64 = normalize(&holdings).iter().map(|w| w.weight_pct).sum();
        assert!((total - 100.0).abs() <= 0.02, "total was {total}");
    }

    #[test]
    fn canonical_text_format() {
        let holdings = vec![
            Holding::new("AAPL", 10.0, 150.0),
            Holding::new("MSFT", 5.0, 300.0),
        ];
        assert_eq!(canonical_text(&normalize(&holdings)), "AAPL:50.00,MSFT:50.00");
    }
}
