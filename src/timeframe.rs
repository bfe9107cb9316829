// Timeframe: the ordered sequence of boundary timestamps driving a run

use chrono::{DateTime, Duration, Utc};

use crate::error::{RunError, RunResult};

/// Immutable description of a time range and step size.
///
/// All accessors are pure functions of (start, end, step); there is no
/// iteration state, so a Timeframe can be shared and restarted freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> RunResult<Self> {
        // Boundary arithmetic works in whole milliseconds.
        if step < Duration::milliseconds(1) {
            return Err(RunError::config(format!(
                "timeframe step must be at least 1ms, got {:?}",
                step
            )));
        }
        if start > end {
            return Err(RunError::config(format!(
                "timeframe start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end, step })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Number of boundaries: floor((end - start) / step) + 1.
    pub fn len(&self) -> usize {
        let span = (self.end - self.start).num_milliseconds();
        let step = self.step.num_milliseconds();
        (span / step) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false // a valid Timeframe always contains at least its start
    }

    /// Boundary at `index`, or None past the end of the sequence.
    pub fn at(&self, index: usize) -> Option<DateTime<Utc>> {
        if index < self.len() {
            Some(self.start + self.step * index as i32)
        } else {
            None
        }
    }

    /// Index of the latest boundary at or before `t`: floor((t - start) / step).
    /// Negative when `t` is before the first boundary. Not clamped to the
    /// sequence length; callers compare against `len()`.
    pub fn index_at(&self, t: DateTime<Utc>) -> i64 {
        let offset = (t - self.start).num_milliseconds();
        offset.div_euclid(self.step.num_milliseconds())
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.len()).map(|i| self.start + self.step * i as i32)
    }
}
