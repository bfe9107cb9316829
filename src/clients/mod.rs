// Live exchange client capability
//
// Real network connectors are external collaborators. They plug into a run
// by implementing this trait and being handed to `execute_algorithm` through
// a connector factory; the engine never talks to the network itself.

use chrono::{DateTime, Utc};

use crate::error::OrderResult;
use crate::market_data::Candle;
use crate::types::{BalanceSnapshot, Order, OrderRequest};

/// The capability set a live connector must expose. It mirrors the simulated
/// exchange exactly, which is what lets an algorithm run unmodified in
/// either mode. Transport failures should surface as
/// `OrderError::ExchangeDown` so the algorithm can decide how to react.
pub trait LiveClient {
    fn create_order(&mut self, request: &OrderRequest) -> OrderResult<Order>;

    fn fetch_balance(&mut self) -> OrderResult<BalanceSnapshot>;

    fn fetch_ohlcv(
        &mut self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> OrderResult<Vec<Candle>>;
}
