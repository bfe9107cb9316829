// Unified error handling for the algorithm runner
//
// Two layers with different blast radius: OrderError stays local to a single
// order and is handed back to the algorithm; RunError aborts the whole run.

use chrono::{DateTime, Utc};

/// Order-level failures. Returned to the algorithm from `create_order` and
/// friends; the run keeps going.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderError {
    #[error("invalid order parameter '{param}': {reason}")]
    InvalidOrder { param: &'static str, reason: String },

    #[error("no market data for {symbol} at {timestamp}")]
    NoMarketData {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("insufficient {asset} balance: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: f64,
        available: f64,
    },

    #[error("exchange unavailable: {0}")]
    ExchangeDown(String),
}

/// Run-level failures. Configuration problems fail before the first
/// iteration; algorithm faults abort after `exit()` cleanup.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("algorithm fault: {source}")]
    Algorithm {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RunError {
    pub fn config(msg: impl Into<String>) -> Self {
        RunError::Config(msg.into())
    }

    pub fn algorithm(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RunError::Algorithm {
            source: Box::new(source),
        }
    }
}

/// Result alias for order-level operations.
pub type OrderResult<T> = Result<T, OrderError>;

/// Result alias for run-level operations.
pub type RunResult<T> = Result<T, RunError>;
