// Algorithm runner
//
// Runs a trader-authored algorithm unmodified against historical market data
// (backtest) or a live exchange connection, with identical behavior in both
// modes except for wall-clock timing.

pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod market_data;
pub mod simulation;
pub mod timeframe;
pub mod types;

// Re-export the surface a strategy author needs
pub use core::{
    execute_algorithm, main_loop, new_sim_clock, Algorithm, AlgorithmController, Exchange,
    ExchangeSettings, ExecutionContext, InterruptFlag, LiveClientFactory, Mode, RunSettings,
    SimClock, SystemClock, WallClock,
};

pub use clients::LiveClient;
pub use config::{ConfigError, RunConfig};
pub use error::{OrderError, OrderResult, RunError, RunResult};
pub use market_data::{Candle, InMemorySource, PriceSource};
pub use simulation::{Ledger, MatchingEngine, SimulatedExchange, DEFAULT_FEE_RATE};
pub use timeframe::Timeframe;
pub use types::{
    BalanceSnapshot, ExitReason, Fill, Order, OrderRequest, OrderStatus, OrderType, Side,
};
