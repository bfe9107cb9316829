// Run entry point: wires settings, context, controller, and main loop

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::core::algorithm::Algorithm;
use crate::core::context::{
    new_sim_clock, ExchangeSettings, ExecutionContext, LiveClientFactory, Mode,
};
use crate::core::controller::AlgorithmController;
use crate::core::scheduler::{main_loop, InterruptFlag, SystemClock};
use crate::error::{RunError, RunResult};
use crate::market_data::PriceSource;
use crate::timeframe::Timeframe;

/// Everything one run needs besides the algorithm itself. The excluded CLI
/// layer builds this from parsed arguments (see `config::RunConfig`).
pub struct RunSettings {
    pub exchanges: HashMap<String, ExchangeSettings>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
    pub live: bool,
}

impl RunSettings {
    fn validate(&self) -> RunResult<()> {
        for (name, settings) in &self.exchanges {
            if !(0.0..1.0).contains(&settings.fee_rate) {
                return Err(RunError::config(format!(
                    "exchange '{}': fee_rate must be in [0, 1), got {}",
                    name, settings.fee_rate
                )));
            }
            for (asset, amount) in &settings.initial_balances {
                if *amount < 0.0 || !amount.is_finite() {
                    return Err(RunError::config(format!(
                        "exchange '{}': initial balance for {} must be non-negative, got {}",
                        name, asset, amount
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Execute one algorithm run and return the terminated instance for post-run
/// inspection. Backtests replay `data`; live runs build connectors through
/// `live_factory`. Configuration problems fail before the first iteration;
/// algorithm faults come back as `RunError::Algorithm` after `exit` ran.
pub fn execute_algorithm<A: Algorithm>(
    settings: RunSettings,
    args: &A::Args,
    data: Rc<dyn PriceSource>,
    live_factory: Option<LiveClientFactory>,
    interrupt: Option<InterruptFlag>,
) -> RunResult<A> {
    settings.validate()?;
    let timeframe = Timeframe::new(settings.start, settings.end, settings.step)?;
    let mode = if settings.live {
        Mode::Live
    } else {
        Mode::Backtest
    };
    if mode == Mode::Live && live_factory.is_none() {
        return Err(RunError::config("live mode requires a live connector factory"));
    }

    info!(?mode, exchanges = settings.exchanges.len(), "executing algorithm");
    let clock = new_sim_clock(settings.start);
    let mut context = ExecutionContext::new(
        mode,
        clock.clone(),
        data,
        settings.exchanges,
        live_factory,
    );
    let controller = AlgorithmController::<A>::construct(&mut context, args)?;
    let interrupt = interrupt.unwrap_or_default();

    main_loop(&timeframe, controller, mode, &clock, &SystemClock, &interrupt)
}
