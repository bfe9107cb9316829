// Algorithm lifecycle interface
//
// User strategies implement this trait and are driven by the main loop. The
// same implementation runs against historical data and against a live
// exchange; only the context it is constructed with differs.

use crate::core::context::ExecutionContext;
pub use crate::types::ExitReason;

/// Lifecycle hooks of a user algorithm.
///
/// `construct` receives the execution context and creates whatever named
/// exchange connectors it needs. `next_iteration` runs once per timeframe
/// boundary. `exit` is called exactly once with the terminal reason; the
/// algorithm is never driven afterwards.
///
/// Returning an error from `construct` or `next_iteration` is a fault: the
/// run stops, `exit(ExitReason::Fault)` fires, and the error surfaces to the
/// run's caller. Order-level failures should be handled inside the
/// iteration instead of being returned.
pub trait Algorithm: Sized {
    /// Parsed runtime arguments, produced by the (external) CLI layer.
    type Args;
    type Error: std::error::Error + Send + Sync + 'static;

    fn construct(context: &mut ExecutionContext, args: &Self::Args) -> Result<Self, Self::Error>;

    fn next_iteration(&mut self) -> Result<(), Self::Error>;

    fn exit(&mut self, reason: ExitReason);
}
