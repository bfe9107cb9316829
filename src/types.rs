// Common types shared across the runner

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

/// An order as submitted by the algorithm. Consumed once by the matching
/// engine (or forwarded to a live client); never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub amount: f64,
    pub price: Option<f64>, // None for market orders
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: Side, amount: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            amount,
            price: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: Side, amount: f64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            amount,
            price: Some(price),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
}

/// Outcome of `create_order`: the accepted order plus its fill, when the
/// order executed within the current step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub amount: f64,
    pub price: Option<f64>,
    pub status: OrderStatus,
    pub fill: Option<Fill>,
}

/// The resolved outcome of an order against a price reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub amount: f64,
    pub fee: f64,
    pub fee_asset: String,
    pub timestamp: DateTime<Utc>,
}

/// Terminal classification of why a run stopped. Set exactly once, by the
/// main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The timeframe was exhausted.
    Finished,
    /// An operator interrupt was observed.
    Interrupted,
    /// The algorithm raised an error from a lifecycle hook.
    Fault,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Finished => write!(f, "finished"),
            ExitReason::Interrupted => write!(f, "interrupted"),
            ExitReason::Fault => write!(f, "fault"),
        }
    }
}

/// Read-only balance snapshot, asset symbol to amount. BTreeMap keeps the
/// ordering deterministic for comparison and serialization.
pub type BalanceSnapshot = BTreeMap<String, f64>;

/// Split a market symbol like "ETH/BTC" into (base, quote).
pub fn split_symbol(symbol: &str) -> Result<(&str, &str), OrderError> {
    match symbol.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok((base, quote)),
        _ => Err(OrderError::InvalidOrder {
            param: "symbol",
            reason: format!("expected BASE/QUOTE, got '{}'", symbol),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_symbol() {
        assert_eq!(split_symbol("ETH/BTC").unwrap(), ("ETH", "BTC"));
        assert_eq!(split_symbol("BTC/USD").unwrap(), ("BTC", "USD"));
    }

    #[test]
    fn test_split_symbol_rejects_malformed() {
        assert!(split_symbol("ETHBTC").is_err());
        assert!(split_symbol("/USD").is_err());
        assert!(split_symbol("ETH/").is_err());
    }

    #[test]
    fn test_exit_reason_display() {
        assert_eq!(ExitReason::Finished.to_string(), "finished");
        assert_eq!(ExitReason::Interrupted.to_string(), "interrupted");
        assert_eq!(ExitReason::Fault.to_string(), "fault");
    }
}
