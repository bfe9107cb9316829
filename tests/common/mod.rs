// Shared fixtures for integration tests
#![allow(dead_code)]

use std::cell::Cell;

use algo_runner::{Candle, InMemorySource, OrderError, RunError, WallClock};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Flat candle series for `symbol` at every boundary of a run.
pub fn flat_series(
    start: DateTime<Utc>,
    step: Duration,
    count: usize,
    price: f64,
) -> Vec<Candle> {
    (0..count)
        .map(|i| Candle::flat(start + step * i as i32, price))
        .collect()
}

pub fn two_market_source(
    start: DateTime<Utc>,
    step: Duration,
    count: usize,
    eth_btc: f64,
    btc_usd: f64,
) -> InMemorySource {
    InMemorySource::new()
        .with_series("ETH/BTC", flat_series(start, step, count, eth_btc))
        .with_series("BTC/USD", flat_series(start, step, count, btc_usd))
}

/// Controllable wall clock: `sleep` advances instantly, so live-mode
/// scheduling is testable without real delays.
pub struct MockClock {
    now: Cell<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl WallClock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Error type for test algorithms: absorbs engine errors and supports a
/// planned failure.
#[derive(Debug, thiserror::Error)]
pub enum AlgoError {
    #[error(transparent)]
    Run(#[from] RunError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("planned failure")]
    Planned,
}
