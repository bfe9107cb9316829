// Live-mode scheduling with a controllable wall clock
//
// Mirrors the real-time scenario: 8 boundaries at a 2-second step, with the
// algorithm overrunning its step twice. Missed boundaries must be skipped,
// not queued.

mod common;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::Ordering;

use algo_runner::{
    main_loop, new_sim_clock, Algorithm, AlgorithmController, ExecutionContext, ExitReason,
    InMemorySource, InterruptFlag, Mode, Timeframe, WallClock,
};
use chrono::{DateTime, Duration, Utc};
use common::{ts, AlgoError, MockClock};

/// Records when each iteration actually ran; overruns its step at
/// iterations 2 (past 3 boundaries) and 4 (past 1 boundary).
struct OverrunningAlgo {
    clock: Rc<MockClock>,
    iterations: u64,
    stamps: Vec<DateTime<Utc>>,
    exit_reason: Option<ExitReason>,
}

impl Algorithm for OverrunningAlgo {
    type Args = Rc<MockClock>;
    type Error = AlgoError;

    fn construct(_: &mut ExecutionContext, clock: &Rc<MockClock>) -> Result<Self, AlgoError> {
        Ok(OverrunningAlgo {
            clock: Rc::clone(clock),
            iterations: 0,
            stamps: Vec::new(),
            exit_reason: None,
        })
    }

    fn next_iteration(&mut self) -> Result<(), AlgoError> {
        self.stamps.push(self.clock.now());
        if self.iterations == 2 {
            self.clock.advance(Duration::milliseconds(6950));
        }
        if self.iterations == 4 {
            self.clock.advance(Duration::milliseconds(2950));
        }
        self.iterations += 1;
        Ok(())
    }

    fn exit(&mut self, reason: ExitReason) {
        self.exit_reason = Some(reason);
    }
}

fn live_context(clock_start: DateTime<Utc>) -> (ExecutionContext, algo_runner::SimClock) {
    let sim_clock = new_sim_clock(clock_start);
    let context = ExecutionContext::new(
        Mode::Live,
        sim_clock.clone(),
        Rc::new(InMemorySource::new()),
        HashMap::new(),
        None,
    );
    (context, sim_clock)
}

#[test]
fn test_overruns_skip_missed_boundaries() {
    common::init_tracing();
    let start = ts(1_000_000);
    let timeframe = Timeframe::new(start, start + Duration::seconds(14), Duration::seconds(2))
        .unwrap();
    let clock = Rc::new(MockClock::new(start));
    let (mut context, sim_clock) = live_context(start);
    let controller =
        AlgorithmController::<OverrunningAlgo>::construct(&mut context, &Rc::clone(&clock)).unwrap();
    let interrupt = InterruptFlag::default();

    let algo = main_loop(
        &timeframe,
        controller,
        Mode::Live,
        &sim_clock,
        &*clock,
        &interrupt,
    )
    .unwrap();

    assert_eq!(algo.exit_reason, Some(ExitReason::Finished));
    // Boundaries nominally scheduled: 8. Actually reached: 6.
    assert_eq!(algo.iterations, 6);

    let expected: Vec<DateTime<Utc>> = [0, 2_000, 4_000, 10_950, 12_000, 14_950]
        .iter()
        .map(|ms| start + Duration::milliseconds(*ms))
        .collect();
    assert_eq!(algo.stamps, expected);
}

#[test]
fn test_run_on_schedule_hits_every_boundary() {
    struct Punctual {
        clock: Rc<MockClock>,
        stamps: Vec<DateTime<Utc>>,
        exit_reason: Option<ExitReason>,
    }

    impl Algorithm for Punctual {
        type Args = Rc<MockClock>;
        type Error = AlgoError;

        fn construct(_: &mut ExecutionContext, clock: &Rc<MockClock>) -> Result<Self, AlgoError> {
            Ok(Punctual {
                clock: Rc::clone(clock),
                stamps: Vec::new(),
                exit_reason: None,
            })
        }

        fn next_iteration(&mut self) -> Result<(), AlgoError> {
            self.stamps.push(self.clock.now());
            Ok(())
        }

        fn exit(&mut self, reason: ExitReason) {
            self.exit_reason = Some(reason);
        }
    }

    let start = ts(5_000);
    let timeframe =
        Timeframe::new(start, start + Duration::seconds(8), Duration::seconds(2)).unwrap();
    let clock = Rc::new(MockClock::new(start));
    let (mut context, sim_clock) = live_context(start);
    let controller =
        AlgorithmController::<Punctual>::construct(&mut context, &Rc::clone(&clock)).unwrap();
    let interrupt = InterruptFlag::default();

    let algo = main_loop(
        &timeframe,
        controller,
        Mode::Live,
        &sim_clock,
        &*clock,
        &interrupt,
    )
    .unwrap();

    assert_eq!(algo.exit_reason, Some(ExitReason::Finished));
    let expected: Vec<DateTime<Utc>> =
        (0..5).map(|i| start + Duration::seconds(i * 2)).collect();
    assert_eq!(algo.stamps, expected);
}

#[test]
fn test_starting_past_the_timeframe_finishes_without_iterating() {
    let start = ts(0);
    let timeframe =
        Timeframe::new(start, start + Duration::seconds(14), Duration::seconds(2)).unwrap();
    // The wall clock is already far beyond the last boundary.
    let clock = Rc::new(MockClock::new(start + Duration::seconds(100)));
    let (mut context, sim_clock) = live_context(start);
    let controller =
        AlgorithmController::<OverrunningAlgo>::construct(&mut context, &Rc::clone(&clock)).unwrap();
    let interrupt = InterruptFlag::default();

    let algo = main_loop(
        &timeframe,
        controller,
        Mode::Live,
        &sim_clock,
        &*clock,
        &interrupt,
    )
    .unwrap();

    assert_eq!(algo.iterations, 0);
    assert_eq!(algo.exit_reason, Some(ExitReason::Finished));
}

#[test]
fn test_interrupt_stops_the_run_promptly() {
    struct SelfInterrupting {
        flag: InterruptFlag,
        iterations: u64,
        exit_reason: Option<ExitReason>,
    }

    impl Algorithm for SelfInterrupting {
        type Args = InterruptFlag;
        type Error = AlgoError;

        fn construct(_: &mut ExecutionContext, flag: &InterruptFlag) -> Result<Self, AlgoError> {
            Ok(SelfInterrupting {
                flag: InterruptFlag::clone(flag),
                iterations: 0,
                exit_reason: None,
            })
        }

        fn next_iteration(&mut self) -> Result<(), AlgoError> {
            self.iterations += 1;
            if self.iterations == 2 {
                self.flag.store(true, Ordering::Relaxed);
            }
            Ok(())
        }

        fn exit(&mut self, reason: ExitReason) {
            self.exit_reason = Some(reason);
        }
    }

    let start = ts(0);
    let timeframe =
        Timeframe::new(start, start + Duration::seconds(14), Duration::seconds(2)).unwrap();
    let clock = Rc::new(MockClock::new(start));
    let (mut context, sim_clock) = live_context(start);
    let interrupt = InterruptFlag::default();
    let controller =
        AlgorithmController::<SelfInterrupting>::construct(&mut context, &interrupt).unwrap();

    let algo = main_loop(
        &timeframe,
        controller,
        Mode::Live,
        &sim_clock,
        &*clock,
        &interrupt,
    )
    .unwrap();

    assert_eq!(algo.iterations, 2);
    assert_eq!(algo.exit_reason, Some(ExitReason::Interrupted));
}
