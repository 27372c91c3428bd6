//! Clock Module
//!
//! Every liveness decision in LapseKV is made against a [`Clock`]. The clock is
//! the single source of truth for "now" and is expressed in whole logical
//! seconds ([`Time`]).
//!
//! ## Implementations
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────────────┐
//! │     ManualClock      │      │         SystemClock          │
//! │                      │      │                              │
//! │  AtomicU64 ticks     │      │  Instant (process start)     │
//! │  moves only through  │      │  + AtomicU64 offset          │
//! │  advance()           │      │  (advance() bumps offset)    │
//! └──────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! - [`ManualClock`] never moves on its own. Tests and the conformance driver
//!   use it so that expiry is fully deterministic.
//! - [`SystemClock`] follows real elapsed time but can still be pushed forward,
//!   which lets `delay` work against a long-running engine.
//!
//! Both clocks are monotonic: `advance` rejects negative durations and never
//! moves time backwards.
//!
//! ## Example
//!
//! ```
//! use lapsekv::clock::{Clock, ManualClock};
//!
//! let clock = ManualClock::new();
//! assert_eq!(clock.now(), 0);
//!
//! clock.advance(5).unwrap();
//! assert_eq!(clock.now(), 5);
//!
//! // Time never goes backwards
//! assert!(clock.advance(-1).is_err());
//! assert_eq!(clock.now(), 5);
//! ```

pub mod logical;

pub use logical::{ManualClock, SystemClock};

use std::fmt;
use thiserror::Error;

/// Logical time in whole seconds.
pub type Time = u64;

/// Errors returned when moving a clock.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// A negative duration was requested
    #[error("cannot move the clock backwards by {0}s")]
    NegativeAdvance(i64),

    /// The advance would overflow the time representation
    #[error("advancing {by}s from {now} overflows the clock")]
    Overflow { now: Time, by: u64 },
}

/// A monotonic, externally advanceable source of logical time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current logical time. Never has side effects.
    fn now(&self) -> Time;

    /// Moves the clock forward by `seconds` and returns the new time.
    ///
    /// Fails without touching the clock if `seconds` is negative or the
    /// result would overflow.
    fn advance(&self, seconds: i64) -> Result<Time, ClockError>;
}
