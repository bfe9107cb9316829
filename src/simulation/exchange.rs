// Simulated exchange: ledger + matching engine behind the live capability set
//
// Shares the run's simulated clock and price source. Before serving any call
// it settles resting limit orders against the candles elapsed since its last
// settlement, so lazy callers see the same fills an eager poller would.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::context::SimClock;
use crate::error::OrderResult;
use crate::market_data::{Candle, PriceSource};
use crate::simulation::ledger::Ledger;
use crate::simulation::matching_engine::{MatchingEngine, Submission};
use crate::types::{BalanceSnapshot, Order, OrderRequest, OrderStatus};

pub struct SimulatedExchange {
    name: String,
    clock: SimClock,
    data: Rc<dyn PriceSource>,
    ledger: Ledger,
    engine: MatchingEngine,
    last_settled: Option<DateTime<Utc>>,
}

impl SimulatedExchange {
    pub fn new(
        name: impl Into<String>,
        clock: SimClock,
        data: Rc<dyn PriceSource>,
        fee_rate: f64,
    ) -> Self {
        Self {
            name: name.into(),
            clock,
            data,
            ledger: Ledger::new(),
            engine: MatchingEngine::new(fee_rate),
            last_settled: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn create_order(&mut self, request: &OrderRequest) -> OrderResult<Order> {
        self.settle();
        let now = self.now();
        let candle = self.data.candle(&request.symbol, now);
        let submission = self.engine.submit(request, candle, now)?;

        let (id, status, fill) = match submission {
            Submission::Filled(fill) => {
                self.ledger.apply_fill(&fill)?;
                info!(exchange = %self.name, symbol = %request.symbol, side = ?request.side,
                      price = fill.price, amount = fill.amount, "order filled");
                (Uuid::new_v4(), OrderStatus::Filled, Some(fill))
            }
            Submission::Pending(id) => (id, OrderStatus::Open, None),
        };
        Ok(Order {
            id,
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            amount: request.amount,
            price: request.price,
            status,
            fill,
        })
    }

    pub fn fetch_balance(&mut self) -> BalanceSnapshot {
        self.settle();
        self.ledger.balances()
    }

    /// Historical candles up to the current simulated timestamp. Candles
    /// beyond the clock are never returned: a backtest must not see the
    /// future.
    pub fn fetch_ohlcv(&mut self, symbol: &str, since: Option<DateTime<Utc>>) -> Vec<Candle> {
        self.settle();
        self.data.series(symbol, since, self.now())
    }

    pub fn pending_orders(&self) -> usize {
        self.engine.pending_count()
    }

    fn now(&self) -> DateTime<Utc> {
        *self.clock.borrow()
    }

    // Check resting limit orders against every candle between the last
    // settlement (exclusive) and the clock (inclusive).
    fn settle(&mut self) {
        let now = self.now();
        if self.last_settled == Some(now) || self.engine.pending_count() == 0 {
            self.last_settled = Some(now);
            return;
        }
        let since = self.last_settled;
        let data = Rc::clone(&self.data);
        let crossed = self.engine.settle_pending(|symbol| {
            data.series(symbol, since, now)
                .into_iter()
                .filter(|c| since.map_or(true, |s| c.timestamp > s))
                .collect()
        });
        for (id, fill) in crossed {
            match self.ledger.apply_fill(&fill) {
                Ok(()) => info!(exchange = %self.name, %id, symbol = %fill.symbol,
                                price = fill.price, amount = fill.amount, "limit order filled"),
                Err(err) => warn!(exchange = %self.name, %id, %err,
                                  "dropping crossed limit order, balance no longer clears"),
            }
        }
        self.last_settled = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::new_sim_clock;
    use crate::market_data::InMemorySource;
    use crate::types::Side;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn exchange_with(candles: Vec<Candle>, fee_rate: f64) -> (SimulatedExchange, SimClock) {
        let clock = new_sim_clock(ts(0));
        let data = Rc::new(InMemorySource::new().with_series("ETH/BTC", candles));
        let exchange = SimulatedExchange::new("okex", clock.clone(), data, fee_rate);
        (exchange, clock)
    }

    #[test]
    fn test_market_order_updates_ledger() {
        let (mut exchange, _clock) = exchange_with(vec![Candle::flat(ts(0), 0.02)], 0.0);
        exchange.ledger_mut().fund("ETH", 3.0).unwrap();

        let order = exchange
            .create_order(&OrderRequest::market("ETH/BTC", Side::Sell, 2.0))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);

        let balances = exchange.fetch_balance();
        assert!((balances["ETH"] - 1.0).abs() < 1e-12);
        assert!((balances["BTC"] - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_rejected_order_leaves_balances_alone() {
        let (mut exchange, _clock) = exchange_with(vec![Candle::flat(ts(0), 0.02)], 0.0);
        exchange.ledger_mut().fund("ETH", 1.0).unwrap();

        let err = exchange
            .create_order(&OrderRequest::market("ETH/BTC", Side::Sell, 2.0))
            .unwrap_err();
        assert!(matches!(err, crate::error::OrderError::InsufficientBalance { .. }));
        assert_eq!(exchange.fetch_balance()["ETH"], 1.0);
    }

    #[test]
    fn test_resting_limit_settles_on_later_boundary() {
        let candles = vec![
            Candle::flat(ts(0), 0.02),
            Candle::flat(ts(60), 0.024),
            Candle::flat(ts(120), 0.026),
        ];
        let (mut exchange, clock) = exchange_with(candles, 0.0);
        exchange.ledger_mut().fund("ETH", 1.0).unwrap();

        let order = exchange
            .create_order(&OrderRequest::limit("ETH/BTC", Side::Sell, 1.0, 0.025))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(exchange.pending_orders(), 1);

        // The crossing happens at t=120 even though the exchange is next
        // touched at t=180.
        *clock.borrow_mut() = ts(180);
        let balances = exchange.fetch_balance();
        assert_eq!(exchange.pending_orders(), 0);
        assert!((balances["BTC"] - 0.025).abs() < 1e-12);
        assert!(balances.get("ETH").is_none());
    }

    #[test]
    fn test_fetch_ohlcv_never_returns_future_candles() {
        let candles = vec![
            Candle::flat(ts(0), 0.02),
            Candle::flat(ts(60), 0.021),
            Candle::flat(ts(120), 0.022),
        ];
        let (mut exchange, clock) = exchange_with(candles, 0.0);

        *clock.borrow_mut() = ts(60);
        let series = exchange.fetch_ohlcv("ETH/BTC", None);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|c| c.timestamp <= ts(60)));
    }
}
