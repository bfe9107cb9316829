// Simulated exchange subsystem: balance ledger, order matching, and the
// connector that composes them behind the live capability interface.

pub mod exchange;
pub mod ledger;
pub mod matching_engine;

pub use exchange::SimulatedExchange;
pub use ledger::Ledger;
pub use matching_engine::{MatchingEngine, Submission, DEFAULT_FEE_RATE};
