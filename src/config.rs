// Run configuration loading
//
// The argument-parsing front end is an external collaborator; this is the
// TOML shape it feeds and the validation that fails a bad run before any
// iteration executes. Timestamps are RFC 3339 strings.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ExchangeSettings, RunSettings};
use crate::simulation::DEFAULT_FEE_RATE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub live: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: i64,
    #[serde(default)]
    pub exchanges: HashMap<String, ExchangeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeEntry {
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    #[serde(default)]
    pub balances: BTreeMap<String, f64>,
}

fn default_fee_rate() -> f64 {
    DEFAULT_FEE_RATE
}

impl RunConfig {
    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: RunConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_seconds <= 0 {
            return Err(ConfigError::Validation(format!(
                "step_seconds must be positive, got {}",
                self.step_seconds
            )));
        }

        if self.start > self.end {
            return Err(ConfigError::Validation(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }

        for (name, entry) in &self.exchanges {
            if !(0.0..1.0).contains(&entry.fee_rate) {
                return Err(ConfigError::Validation(format!(
                    "exchange '{}': fee_rate must be in [0, 1), got {}",
                    name, entry.fee_rate
                )));
            }
            for (asset, amount) in &entry.balances {
                if *amount < 0.0 || !amount.is_finite() {
                    return Err(ConfigError::Validation(format!(
                        "exchange '{}': balance for {} must be non-negative, got {}",
                        name, asset, amount
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn into_settings(self) -> RunSettings {
        RunSettings {
            exchanges: self
                .exchanges
                .into_iter()
                .map(|(name, entry)| {
                    (
                        name,
                        ExchangeSettings {
                            initial_balances: entry.balances,
                            fee_rate: entry.fee_rate,
                        },
                    )
                })
                .collect(),
            start: self.start,
            end: self.end,
            step: Duration::seconds(self.step_seconds),
            live: self.live,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
