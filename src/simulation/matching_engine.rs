// Order matching against historical reference prices
//
// Resolves an order request using the candle at the current simulated
// timestamp. Orders either fully fill or are rejected; partial fills and
// slippage are not modeled, so the candle close is the market fill price.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::{OrderError, OrderResult};
use crate::market_data::Candle;
use crate::types::{split_symbol, Fill, OrderRequest, OrderType, Side};

/// Kraken taker fee, the default when an exchange does not configure one.
pub const DEFAULT_FEE_RATE: f64 = 0.0026;

/// Outcome of submitting an order within the current step.
#[derive(Debug, Clone)]
pub enum Submission {
    /// The order executed immediately.
    Filled(Fill),
    /// A limit order that did not cross; it rests until it crosses or the
    /// run ends, at which point it is discarded.
    Pending(Uuid),
}

#[derive(Debug, Clone)]
struct PendingOrder {
    id: Uuid,
    request: OrderRequest,
}

#[derive(Debug)]
pub struct MatchingEngine {
    fee_rate: f64,
    pending: Vec<PendingOrder>,
}

impl MatchingEngine {
    pub fn new(fee_rate: f64) -> Self {
        Self {
            fee_rate,
            pending: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Resolve an order request against the candle at `now`.
    pub fn submit(
        &mut self,
        request: &OrderRequest,
        candle: Option<Candle>,
        now: DateTime<Utc>,
    ) -> OrderResult<Submission> {
        self.validate(request)?;
        let candle = candle.ok_or_else(|| OrderError::NoMarketData {
            symbol: request.symbol.clone(),
            timestamp: now,
        })?;

        match request.order_type {
            OrderType::Market => Ok(Submission::Filled(self.fill_for(
                request,
                candle.close,
                now,
            )?)),
            OrderType::Limit => {
                let limit = request.price.expect("validated above");
                if crosses(&candle, request.side, limit) {
                    Ok(Submission::Filled(self.fill_for(request, limit, now)?))
                } else {
                    let id = Uuid::new_v4();
                    debug!(%id, symbol = %request.symbol, limit, "limit order resting");
                    self.pending.push(PendingOrder {
                        id,
                        request: request.clone(),
                    });
                    Ok(Submission::Pending(id))
                }
            }
        }
    }

    /// Re-check resting limit orders against the candles a symbol saw since
    /// the last settlement (`lookup` returns them in timestamp order). An
    /// order fills at its limit price on the first crossing candle. Crossed
    /// orders are removed and returned; the caller applies them to the
    /// ledger.
    pub fn settle_pending<F>(&mut self, lookup: F) -> Vec<(Uuid, Fill)>
    where
        F: Fn(&str) -> Vec<Candle>,
    {
        let mut fills = Vec::new();
        let mut still_pending = Vec::new();
        for order in std::mem::take(&mut self.pending) {
            let limit = order.request.price.expect("pending orders are limit orders");
            let crossing = lookup(&order.request.symbol)
                .into_iter()
                .find(|candle| crosses(candle, order.request.side, limit));
            if let Some(candle) = crossing {
                let fill = self.with_fee(Fill {
                    symbol: order.request.symbol.clone(),
                    side: order.request.side,
                    price: limit,
                    amount: order.request.amount,
                    fee: 0.0,
                    fee_asset: String::new(),
                    timestamp: candle.timestamp,
                });
                fills.push((order.id, fill));
            } else {
                still_pending.push(order);
            }
        }
        self.pending = still_pending;
        fills
    }

    fn validate(&self, request: &OrderRequest) -> OrderResult<()> {
        split_symbol(&request.symbol)?;
        if !(request.amount > 0.0) || !request.amount.is_finite() {
            return Err(OrderError::InvalidOrder {
                param: "amount",
                reason: format!("must be a positive number, got {}", request.amount),
            });
        }
        match request.order_type {
            OrderType::Market => {}
            OrderType::Limit => match request.price {
                Some(price) if price > 0.0 && price.is_finite() => {}
                Some(price) => {
                    return Err(OrderError::InvalidOrder {
                        param: "price",
                        reason: format!("must be positive, got {}", price),
                    })
                }
                None => {
                    return Err(OrderError::InvalidOrder {
                        param: "price",
                        reason: "limit orders require a price".to_string(),
                    })
                }
            },
        }
        Ok(())
    }

    fn fill_for(
        &self,
        request: &OrderRequest,
        price: f64,
        now: DateTime<Utc>,
    ) -> OrderResult<Fill> {
        Ok(self.with_fee(Fill {
            symbol: request.symbol.clone(),
            side: request.side,
            price,
            amount: request.amount,
            fee: 0.0,
            fee_asset: String::new(),
            timestamp: now,
        }))
    }

    // ccxt fee convention: buys pay in the base asset, sells in the quote
    fn with_fee(&self, mut fill: Fill) -> Fill {
        let (base, quote) = split_symbol(&fill.symbol).expect("validated on submission");
        match fill.side {
            Side::Buy => {
                fill.fee = fill.amount * self.fee_rate;
                fill.fee_asset = base.to_string();
            }
            Side::Sell => {
                fill.fee = fill.price * fill.amount * self.fee_rate;
                fill.fee_asset = quote.to_string();
            }
        }
        fill
    }
}

fn crosses(candle: &Candle, side: Side, limit: f64) -> bool {
    match side {
        Side::Buy => candle.low <= limit,
        Side::Sell => candle.high >= limit,
    }
}
