//! Concrete clock implementations.

use super::{Clock, ClockError, Time};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

/// Validates an advance request, returning it as an unsigned step.
fn checked_step(seconds: i64) -> Result<u64, ClockError> {
    u64::try_from(seconds).map_err(|_| ClockError::NegativeAdvance(seconds))
}

/// Adds `step` to `cell` atomically, refusing to overflow.
fn bump(cell: &AtomicU64, step: u64) -> Result<u64, ClockError> {
    cell.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        current.checked_add(step)
    })
    .map(|previous| previous + step)
    .map_err(|current| ClockError::Overflow {
        now: current,
        by: step,
    })
}

/// A purely logical clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    /// Creates a clock starting at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock starting at `epoch`.
    pub fn starting_at(epoch: Time) -> Self {
        Self {
            ticks: AtomicU64::new(epoch),
        }
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Time {
        self.ticks.load(Ordering::Acquire)
    }

    fn advance(&self, seconds: i64) -> Result<Time, ClockError> {
        let step = checked_step(seconds)?;
        let now = bump(&self.ticks, step)?;
        debug!(by = step, now, "Manual clock advanced");
        Ok(now)
    }
}

/// Wall-clock seconds since construction, plus an advanceable offset.
///
/// Built on [`Instant`], so it is monotonic even if the system time is
/// adjusted.
#[derive(Debug)]
pub struct SystemClock {
    started: Instant,
    offset: AtomicU64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            offset: AtomicU64::new(0),
        }
    }

    /// Seconds added through [`Clock::advance`] so far.
    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Time {
        self.started
            .elapsed()
            .as_secs()
            .saturating_add(self.offset.load(Ordering::Acquire))
    }

    fn advance(&self, seconds: i64) -> Result<Time, ClockError> {
        let step = checked_step(seconds)?;
        let offset = bump(&self.offset, step)?;
        let now = self.started.elapsed().as_secs().saturating_add(offset);
        debug!(by = step, now, "System clock advanced");
        Ok(now)
    }
}
