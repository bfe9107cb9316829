// Main loop: drives the algorithm once per timeframe boundary
//
// Backtest mode consumes boundaries as fast as possible with the simulated
// clock advanced ahead of each iteration. Live mode waits for each
// boundary's wall-clock instant; after an overrun it jumps to the latest
// past-due boundary instead of queueing the missed ones, so a stall never
// builds an unbounded backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::core::algorithm::Algorithm;
use crate::core::context::{Mode, SimClock};
use crate::core::controller::AlgorithmController;
use crate::error::RunResult;
use crate::timeframe::Timeframe;
use crate::types::ExitReason;

/// Wall-clock capability of the live scheduler. Injected so catch-up logic
/// is testable without real delays.
pub trait WallClock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// The host clock used by real runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(duration) = duration.to_std() {
            std::thread::sleep(duration);
        }
    }
}

/// Cooperative cancellation flag, observed between iterations and inside
/// live waits.
pub type InterruptFlag = Arc<AtomicBool>;

// Upper bound on a single sleep so an interrupt is noticed promptly.
const INTERRUPT_POLL_MS: i64 = 100;

/// The boundary to execute after `current`, given the wall clock: the next
/// scheduled one, or the latest past-due one when iterations overran.
/// Pure, so the catch-up behavior is checkable without waiting.
pub fn next_boundary_index(timeframe: &Timeframe, current: i64, now: DateTime<Utc>) -> i64 {
    (current + 1).max(timeframe.index_at(now))
}

/// Drive the controller over the timeframe. Returns the algorithm instance
/// on normal or interrupted termination; algorithm faults propagate as
/// errors after `exit(Fault)` cleanup.
pub fn main_loop<A, C>(
    timeframe: &Timeframe,
    mut controller: AlgorithmController<A>,
    mode: Mode,
    sim_clock: &SimClock,
    wall: &C,
    interrupt: &InterruptFlag,
) -> RunResult<A>
where
    A: Algorithm,
    C: WallClock,
{
    info!(?mode, boundaries = timeframe.len(), start = %timeframe.start(),
          end = %timeframe.end(), "starting main loop");

    let mut index: i64 = -1;
    loop {
        if interrupt.load(Ordering::Relaxed) {
            warn!("interrupt observed, stopping run");
            controller.exit(ExitReason::Interrupted);
            return Ok(controller.into_algorithm());
        }

        let next = match mode {
            Mode::Backtest => index + 1,
            Mode::Live => next_boundary_index(timeframe, index, wall.now()),
        };
        if next > index + 1 {
            debug!(skipped = next - index - 1, "catching up, skipping past boundaries");
        }

        let boundary = match usize::try_from(next).ok().and_then(|i| timeframe.at(i)) {
            Some(boundary) => boundary,
            None => {
                controller.exit(ExitReason::Finished);
                return Ok(controller.into_algorithm());
            }
        };

        if mode == Mode::Live && !wait_until(wall, boundary, interrupt) {
            warn!("interrupt observed during wait, stopping run");
            controller.exit(ExitReason::Interrupted);
            return Ok(controller.into_algorithm());
        }

        *sim_clock.borrow_mut() = boundary;
        debug!(%boundary, index = next, "iteration");
        controller.next_iteration()?;
        index = next;
    }
}

// Returns false when interrupted. Never sleeps a negative duration; a
// boundary already in the past returns immediately.
fn wait_until<C: WallClock>(wall: &C, target: DateTime<Utc>, interrupt: &InterruptFlag) -> bool {
    loop {
        if interrupt.load(Ordering::Relaxed) {
            return false;
        }
        let now = wall.now();
        if now >= target {
            return true;
        }
        let remaining = target - now;
        wall.sleep(remaining.min(Duration::milliseconds(INTERRUPT_POLL_MS)));
    }
}
