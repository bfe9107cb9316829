// Per-exchange balance store
//
// Mutated only by fill application and initial funding; algorithm code never
// touches it directly. Balances can never go negative: apply_fill verifies
// every debit before mutating anything.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{OrderError, OrderResult, RunError, RunResult};
use crate::types::{split_symbol, BalanceSnapshot, Fill, Side};

/// Tolerance for floating point residue when checking debits.
const BALANCE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a balance. Initial setup only; a negative amount is a
    /// configuration error.
    pub fn fund(&mut self, asset: impl Into<String>, amount: f64) -> RunResult<()> {
        if amount < 0.0 || !amount.is_finite() {
            return Err(RunError::config(format!(
                "initial balance must be a non-negative number, got {}",
                amount
            )));
        }
        *self.balances.entry(asset.into()).or_insert(0.0) += amount;
        Ok(())
    }

    /// Apply a fill atomically: debit the sold asset and the fee asset,
    /// credit the bought asset. If any debit would push a balance negative
    /// the ledger is left untouched and the fill is rejected.
    pub fn apply_fill(&mut self, fill: &Fill) -> OrderResult<()> {
        let (base, quote) = split_symbol(&fill.symbol)?;
        let notional = fill.price * fill.amount;

        let mut deltas: BTreeMap<&str, f64> = BTreeMap::new();
        match fill.side {
            Side::Buy => {
                *deltas.entry(base).or_insert(0.0) += fill.amount;
                *deltas.entry(quote).or_insert(0.0) -= notional;
            }
            Side::Sell => {
                *deltas.entry(base).or_insert(0.0) -= fill.amount;
                *deltas.entry(quote).or_insert(0.0) += notional;
            }
        }
        *deltas.entry(fill.fee_asset.as_str()).or_insert(0.0) -= fill.fee;

        // Verify every touched asset before mutating any of them.
        for (asset, delta) in &deltas {
            let available = self.balances.get(*asset).copied().unwrap_or(0.0);
            if available + delta < -BALANCE_EPSILON {
                return Err(OrderError::InsufficientBalance {
                    asset: asset.to_string(),
                    required: -delta,
                    available,
                });
            }
        }

        for (asset, delta) in deltas {
            let entry = self.balances.entry(asset.to_string()).or_insert(0.0);
            *entry = (*entry + delta).max(0.0);
        }
        debug!(symbol = %fill.symbol, side = ?fill.side, price = fill.price,
               amount = fill.amount, fee = fill.fee, "applied fill");
        Ok(())
    }

    /// Read-only snapshot; dust-free (zero balances are pruned).
    pub fn balances(&self) -> BalanceSnapshot {
        self.balances
            .iter()
            .filter(|(_, amount)| **amount > BALANCE_EPSILON)
            .map(|(asset, amount)| (asset.clone(), *amount))
            .collect()
    }
}
