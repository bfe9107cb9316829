// Algorithm controller: owns the user algorithm and its lifecycle state

use tracing::{error, info};

use crate::core::algorithm::Algorithm;
use crate::core::context::ExecutionContext;
use crate::error::{RunError, RunResult};
use crate::types::ExitReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControllerState {
    Running,
    Exited,
}

/// Wraps the algorithm instance, invokes its hooks, captures faults, and
/// guarantees `exit` runs exactly once.
pub struct AlgorithmController<A: Algorithm> {
    algorithm: A,
    state: ControllerState,
    exit_reason: Option<ExitReason>,
    iterations: u64,
}

impl<A: Algorithm> AlgorithmController<A> {
    /// Build the algorithm. A construction fault aborts the run before the
    /// first iteration; there is no instance to call `exit` on.
    pub fn construct(context: &mut ExecutionContext, args: &A::Args) -> RunResult<Self> {
        match A::construct(context, args) {
            Ok(algorithm) => Ok(Self {
                algorithm,
                state: ControllerState::Running,
                exit_reason: None,
                iterations: 0,
            }),
            Err(err) => {
                error!(error = %err, "algorithm construction fault");
                Err(RunError::algorithm(err))
            }
        }
    }

    /// Drive one iteration. A fault transitions to exited with
    /// `ExitReason::Fault` before the error is handed back.
    pub fn next_iteration(&mut self) -> RunResult<()> {
        if self.state == ControllerState::Exited {
            return Err(RunError::config("algorithm driven after exit"));
        }
        match self.algorithm.next_iteration() {
            Ok(()) => {
                self.iterations += 1;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, iteration = self.iterations, "algorithm fault");
                self.exit(ExitReason::Fault);
                Err(RunError::algorithm(err))
            }
        }
    }

    /// Transition to exited. Idempotent from the algorithm's point of view:
    /// its `exit` hook fires at most once.
    pub fn exit(&mut self, reason: ExitReason) {
        if self.state == ControllerState::Exited {
            return;
        }
        self.state = ControllerState::Exited;
        self.exit_reason = Some(reason);
        info!(%reason, iterations = self.iterations, "algorithm exited");
        self.algorithm.exit(reason);
    }

    pub fn is_exited(&self) -> bool {
        self.state == ControllerState::Exited
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn into_algorithm(self) -> A {
        self.algorithm
    }
}
