// Execution context: per-run connector factory and mode holder
//
// Replaces the global exchange registry of older designs. One context lives
// for exactly one run and hands the algorithm either simulated or live
// connectors, chosen once at construction.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::clients::LiveClient;
use crate::error::{OrderResult, RunError, RunResult};
use crate::market_data::{Candle, PriceSource};
use crate::simulation::{SimulatedExchange, DEFAULT_FEE_RATE};
use crate::types::{BalanceSnapshot, Order, OrderRequest};

/// The shared simulated clock. The main loop advances it to each boundary;
/// every simulated exchange reads it for price lookups and fills. A single
/// logical thread drives a run, so Rc<RefCell> suffices.
pub type SimClock = Rc<RefCell<DateTime<Utc>>>;

pub fn new_sim_clock(start: DateTime<Utc>) -> SimClock {
    Rc::new(RefCell::new(start))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Backtest,
    Live,
}

/// Per-exchange run settings: what the simulated ledger starts with and the
/// taker fee the matching engine charges.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub initial_balances: BTreeMap<String, f64>,
    pub fee_rate: f64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            initial_balances: BTreeMap::new(),
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

/// Builds live connectors by exchange name. Supplied by the caller in live
/// mode; the engine itself has no network code.
pub type LiveClientFactory = Box<dyn FnMut(&str) -> RunResult<Box<dyn LiveClient>>>;

/// A connector the algorithm trades through: the simulated variant in
/// backtests, an external client in live runs. One capability surface for
/// both, selected once when the context creates it.
pub enum Exchange {
    Simulated(SimulatedExchange),
    Live(Box<dyn LiveClient>),
}

impl Exchange {
    pub fn create_order(&mut self, request: &OrderRequest) -> OrderResult<Order> {
        match self {
            Exchange::Simulated(sim) => sim.create_order(request),
            Exchange::Live(client) => client.create_order(request),
        }
    }

    pub fn fetch_balance(&mut self) -> OrderResult<BalanceSnapshot> {
        match self {
            Exchange::Simulated(sim) => Ok(sim.fetch_balance()),
            Exchange::Live(client) => client.fetch_balance(),
        }
    }

    pub fn fetch_ohlcv(
        &mut self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> OrderResult<Vec<Candle>> {
        match self {
            Exchange::Simulated(sim) => Ok(sim.fetch_ohlcv(symbol, since)),
            Exchange::Live(client) => client.fetch_ohlcv(symbol, since),
        }
    }
}

pub struct ExecutionContext {
    mode: Mode,
    clock: SimClock,
    data: Rc<dyn PriceSource>,
    exchanges: HashMap<String, ExchangeSettings>,
    created: HashSet<String>,
    live_factory: Option<LiveClientFactory>,
}

impl ExecutionContext {
    pub fn new(
        mode: Mode,
        clock: SimClock,
        data: Rc<dyn PriceSource>,
        exchanges: HashMap<String, ExchangeSettings>,
        live_factory: Option<LiveClientFactory>,
    ) -> Self {
        Self {
            mode,
            clock,
            data,
            exchanges,
            created: HashSet::new(),
            live_factory,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Hand the algorithm a connector for `name`. Each configured exchange
    /// can be created once per run; the connector is exclusively owned by
    /// the algorithm from here on.
    pub fn create_exchange(&mut self, name: &str) -> RunResult<Exchange> {
        if !self.created.insert(name.to_string()) {
            return Err(RunError::config(format!(
                "exchange '{}' was already created for this run",
                name
            )));
        }
        let settings = self
            .exchanges
            .get(name)
            .ok_or_else(|| RunError::config(format!("exchange '{}' is not configured", name)))?
            .clone();

        match self.mode {
            Mode::Backtest => {
                let mut sim = SimulatedExchange::new(
                    name,
                    Rc::clone(&self.clock),
                    Rc::clone(&self.data),
                    settings.fee_rate,
                );
                for (asset, amount) in &settings.initial_balances {
                    sim.ledger_mut().fund(asset.clone(), *amount)?;
                }
                info!(exchange = name, fee_rate = settings.fee_rate, "created simulated exchange");
                Ok(Exchange::Simulated(sim))
            }
            Mode::Live => {
                let factory = self.live_factory.as_mut().ok_or_else(|| {
                    RunError::config("live mode requires a live connector factory")
                })?;
                info!(exchange = name, "created live exchange");
                Ok(Exchange::Live(factory(name)?))
            }
        }
    }
}
