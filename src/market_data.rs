// Historical price lookup capability
//
// The on-disk candle cache is an external collaborator; the core only needs
// a lookup keyed by (symbol, timestamp). InMemorySource is the
// implementation used in tests and by callers that preload their candles.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Flat candle: all four prices equal. Convenient for fixtures.
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }
}

/// Price-lookup capability consumed by the simulated exchange.
pub trait PriceSource {
    /// The candle covering `timestamp` for `symbol`, if any data exists.
    fn candle(&self, symbol: &str, timestamp: DateTime<Utc>) -> Option<Candle>;

    /// Candles for `symbol` with `since <= timestamp <= until`, ordered by
    /// timestamp.
    fn series(
        &self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Vec<Candle>;
}

/// In-memory candle store, one ordered series per symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, BTreeMap<DateTime<Utc>, Candle>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, candle: Candle) {
        self.series
            .entry(symbol.into())
            .or_default()
            .insert(candle.timestamp, candle);
    }

    pub fn with_series(
        mut self,
        symbol: impl Into<String>,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Self {
        let symbol = symbol.into();
        for candle in candles {
            self.insert(symbol.clone(), candle);
        }
        self
    }
}

impl PriceSource for InMemorySource {
    fn candle(&self, symbol: &str, timestamp: DateTime<Utc>) -> Option<Candle> {
        self.series
            .get(symbol)
            .and_then(|s| s.get(&timestamp))
            .copied()
    }

    fn series(
        &self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Vec<Candle> {
        let Some(series) = self.series.get(symbol) else {
            return Vec::new();
        };
        series
            .values()
            .filter(|c| since.map_or(true, |s| c.timestamp >= s) && c.timestamp <= until)
            .copied()
            .collect()
    }
}
