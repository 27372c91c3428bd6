//! Operation Engine
//!
//! The engine turns the raw item store into the observable operation
//! contract. Each operation reads the clock once, then performs its whole
//! lookup → liveness check → mutation sequence inside a single store slot.
//!
//! ## Key Lifecycle
//!
//! ```text
//!            add / set                 clock passes expiry
//!  Absent ─────────────────> Live ───────────────────────────> Expired
//!    ▲                        │  ▲                               │
//!    │   delete / flush       │  │        add / set              │
//!    └────────────────────────┘  └───────────────────────────────┘
//! ```
//!
//! `Expired` and `Absent` behave identically for every operation. An
//! expired item may linger in the store until it is replaced, deleted or
//! reclaimed, but no operation can observe it.

use super::error::EngineError;
use crate::clock::{Clock, ManualClock, Time};
use crate::config::EngineConfig;
use crate::storage::{Expiry, ItemStore};
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Which way an arithmetic operation moves the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Wraps at 2^64
    Up,
    /// Floors at zero
    Down,
}

/// Which end of the value a concatenation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

/// Parses a stored value as an unsigned decimal counter.
fn parse_counter(value: &[u8]) -> Result<u64, EngineError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(EngineError::NotANumber)
}

#[derive(Debug, Default)]
struct Counters {
    adds: AtomicU64,
    add_conflicts: AtomicU64,
    sets: AtomicU64,
    gets: AtomicU64,
    get_misses: AtomicU64,
    deletes: AtomicU64,
    arithmetic: AtomicU64,
    reclaimed: AtomicU64,
    clock_advances: AtomicU64,
}

impl Counters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of engine statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Current logical time
    pub now: Time,
    /// Physical entries, dead ones included
    pub entries: u64,
    /// Entries that are live right now
    pub live_entries: u64,
    /// Store generation (bumped by flush)
    pub generation: u64,
    pub adds: u64,
    pub add_conflicts: u64,
    pub sets: u64,
    pub gets: u64,
    pub get_misses: u64,
    pub deletes: u64,
    pub arithmetic: u64,
    /// Dead entries physically removed
    pub reclaimed: u64,
    pub clock_advances: u64,
}

/// The item lifecycle engine.
///
/// Designed to be wrapped in an `Arc` and shared; every operation is
/// thread-safe.
///
/// # Example
///
/// ```
/// use lapsekv::engine::{Engine, EngineError};
/// use lapsekv::storage::Expiry;
/// use bytes::Bytes;
///
/// let engine = Engine::with_manual_clock();
/// let key = Bytes::from("k");
///
/// engine.add(key.clone(), Bytes::from("0"), Expiry::At(2)).unwrap();
/// assert_eq!(
///     engine.add(key.clone(), Bytes::from("1"), Expiry::At(2)),
///     Err(EngineError::KeyExists)
/// );
///
/// engine.advance_clock(3).unwrap();
/// assert_eq!(engine.get(&key), Err(EngineError::NotFound));
///
/// engine.add(key.clone(), Bytes::from("0"), Expiry::At(5)).unwrap();
/// assert!(engine.check_value(&key, b"0").is_ok());
/// ```
pub struct Engine {
    store: ItemStore,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    counters: Counters,
    advances: watch::Sender<Time>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("shards", &self.store.shard_count())
            .field("entries", &self.store.len())
            .field("now", &self.clock.now())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Engine {
    /// Creates an engine over the given clock.
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let (advances, _) = watch::channel(clock.now());
        Self {
            store: ItemStore::with_shards(config.shards),
            clock,
            config,
            counters: Counters::default(),
            advances,
        }
    }

    /// Creates an engine with default settings on a fresh [`ManualClock`].
    pub fn with_manual_clock() -> Self {
        Self::new(EngineConfig::default(), Arc::new(ManualClock::new()))
    }

    /// Current logical time.
    pub fn now(&self) -> Time {
        self.clock.now()
    }

    /// The underlying item store.
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    fn validate_key(&self, key: &[u8]) -> Result<(), EngineError> {
        if key.is_empty() {
            return Err(EngineError::InvalidArgument("key is empty".into()));
        }
        if key.len() > self.config.max_key_len {
            return Err(EngineError::InvalidArgument(format!(
                "key is {} bytes (max: {})",
                key.len(),
                self.config.max_key_len
            )));
        }
        Ok(())
    }

    fn validate_value(&self, len: usize) -> Result<(), EngineError> {
        if len > self.config.max_value_len {
            return Err(EngineError::InvalidArgument(format!(
                "value is {} bytes (max: {})",
                len, self.config.max_value_len
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Core operations
    // ========================================================================

    /// Stores `value` only if `key` has no live item.
    ///
    /// An expired item under the key does not count: it is replaced by the
    /// new value and expiry. A live item is left untouched and
    /// [`EngineError::KeyExists`] is returned.
    pub fn add(&self, key: Bytes, value: Bytes, expiry: Expiry) -> Result<(), EngineError> {
        self.validate_key(&key)?;
        self.validate_value(value.len())?;
        Counters::bump(&self.counters.adds);

        let now = self.clock.now();
        self.store.with_slot(&key, |slot| {
            let previous = slot.item().map(|item| item.is_live(now));
            match previous {
                Some(true) => {
                    Counters::bump(&self.counters.add_conflicts);
                    trace!(key = ?slot.key(), now, "add rejected, key is live");
                    Err(EngineError::KeyExists)
                }
                Some(false) => {
                    trace!(key = ?slot.key(), now, "add replacing expired item");
                    slot.insert_or_replace(value, expiry, now);
                    Ok(())
                }
                None => {
                    slot.insert_or_replace(value, expiry, now);
                    Ok(())
                }
            }
        })
    }

    /// Returns the value under `key` if its item is live.
    pub fn get(&self, key: &[u8]) -> Result<Bytes, EngineError> {
        self.validate_key(key)?;
        Counters::bump(&self.counters.gets);

        let now = self.clock.now();
        match self.store.lookup(key) {
            Some(item) if item.is_live(now) => Ok(item.value),
            found => {
                Counters::bump(&self.counters.get_misses);
                if found.is_some() {
                    trace!(key = ?Bytes::copy_from_slice(key), now, "get hit expired item");
                }
                Err(EngineError::NotFound)
            }
        }
    }

    /// Succeeds iff a live value exists under `key` and equals `expected`.
    pub fn check_value(&self, key: &[u8], expected: &[u8]) -> Result<(), EngineError> {
        let actual = self.get(key)?;
        if actual.as_ref() == expected {
            Ok(())
        } else {
            Err(EngineError::Mismatch {
                expected: Bytes::copy_from_slice(expected),
                actual,
            })
        }
    }

    /// Moves the clock forward by `seconds`, returning the new time.
    ///
    /// Negative values are rejected and leave every item's liveness as it
    /// was.
    pub fn advance_clock(&self, seconds: i64) -> Result<Time, EngineError> {
        let now = self.clock.advance(seconds)?;
        Counters::bump(&self.counters.clock_advances);
        self.advances.send_replace(now);
        Ok(now)
    }

    /// Subscribes to clock advances made through [`Engine::advance_clock`].
    ///
    /// The receiver sees the latest time after each advance.
    pub fn clock_advances(&self) -> watch::Receiver<Time> {
        self.advances.subscribe()
    }

    // ========================================================================
    // Additional item operations
    // ========================================================================

    /// Stores `value` unconditionally.
    pub fn set(&self, key: Bytes, value: Bytes, expiry: Expiry) -> Result<(), EngineError> {
        self.validate_key(&key)?;
        self.validate_value(value.len())?;
        Counters::bump(&self.counters.sets);

        let now = self.clock.now();
        self.store.with_slot(&key, |slot| {
            slot.insert_or_replace(value, expiry, now);
        });
        Ok(())
    }

    /// Removes the live item under `key`.
    ///
    /// An expired item is reported as [`EngineError::NotFound`]; its slot is
    /// reclaimed on the way.
    pub fn delete(&self, key: &Bytes) -> Result<(), EngineError> {
        self.validate_key(key)?;
        Counters::bump(&self.counters.deletes);

        let now = self.clock.now();
        self.store.with_slot(key, |slot| {
            match slot.item().map(|item| item.is_live(now)) {
                Some(true) => {
                    slot.remove();
                    Ok(())
                }
                Some(false) => {
                    slot.remove();
                    Counters::bump(&self.counters.reclaimed);
                    Err(EngineError::NotFound)
                }
                None => Err(EngineError::NotFound),
            }
        })
    }

    /// Drops every item. Returns how many entries were dropped.
    pub fn flush(&self) -> u64 {
        let dropped = self.store.clear();
        trace!(dropped, "store flushed");
        dropped
    }

    /// Appends `suffix` to the live value under `key`, keeping its expiry.
    pub fn append(&self, key: &Bytes, suffix: &[u8]) -> Result<usize, EngineError> {
        self.concat(key, suffix, End::Back)
    }

    /// Prepends `prefix` to the live value under `key`, keeping its expiry.
    pub fn prepend(&self, key: &Bytes, prefix: &[u8]) -> Result<usize, EngineError> {
        self.concat(key, prefix, End::Front)
    }

    fn concat(&self, key: &Bytes, extra: &[u8], end: End) -> Result<usize, EngineError> {
        self.validate_key(key)?;

        let now = self.clock.now();
        let max_value_len = self.config.max_value_len;
        self.store.with_slot(key, |slot| {
            let item = slot.live_item_mut(now).ok_or(EngineError::NotFound)?;

            let len = item.value.len() + extra.len();
            if len > max_value_len {
                return Err(EngineError::InvalidArgument(format!(
                    "value would grow to {} bytes (max: {})",
                    len, max_value_len
                )));
            }

            let mut joined = BytesMut::with_capacity(len);
            match end {
                End::Back => {
                    joined.extend_from_slice(&item.value);
                    joined.extend_from_slice(extra);
                }
                End::Front => {
                    joined.extend_from_slice(extra);
                    joined.extend_from_slice(&item.value);
                }
            }
            item.value = joined.freeze();
            Ok(len)
        })
    }

    /// Adds `delta` to the live counter under `key`, wrapping at 2^64.
    pub fn incr(&self, key: &Bytes, delta: u64) -> Result<u64, EngineError> {
        self.arithmetic(key, delta, Direction::Up, None)
    }

    /// Subtracts `delta` from the live counter under `key`, flooring at 0.
    pub fn decr(&self, key: &Bytes, delta: u64) -> Result<u64, EngineError> {
        self.arithmetic(key, delta, Direction::Down, None)
    }

    /// Like [`Engine::incr`], but an absent or expired key is created
    /// holding `initial` (unadjusted) with the given expiry.
    pub fn incr_with_default(
        &self,
        key: &Bytes,
        delta: u64,
        initial: u64,
        expiry: Expiry,
    ) -> Result<u64, EngineError> {
        self.arithmetic(key, delta, Direction::Up, Some((initial, expiry)))
    }

    /// Like [`Engine::decr`], but an absent or expired key is created
    /// holding `initial` (unadjusted) with the given expiry.
    pub fn decr_with_default(
        &self,
        key: &Bytes,
        delta: u64,
        initial: u64,
        expiry: Expiry,
    ) -> Result<u64, EngineError> {
        self.arithmetic(key, delta, Direction::Down, Some((initial, expiry)))
    }

    fn arithmetic(
        &self,
        key: &Bytes,
        delta: u64,
        direction: Direction,
        default: Option<(u64, Expiry)>,
    ) -> Result<u64, EngineError> {
        self.validate_key(key)?;
        Counters::bump(&self.counters.arithmetic);

        let now = self.clock.now();
        self.store.with_slot(key, |slot| {
            if let Some(item) = slot.live_item_mut(now) {
                let current = parse_counter(&item.value)?;
                let next = match direction {
                    Direction::Up => current.wrapping_add(delta),
                    Direction::Down => current.saturating_sub(delta),
                };
                let rendered = next.to_string();
                self.validate_value(rendered.len())?;
                item.value = Bytes::from(rendered);
                return Ok(next);
            }

            match default {
                Some((initial, expiry)) => {
                    let rendered = initial.to_string();
                    self.validate_value(rendered.len())?;
                    slot.insert_or_replace(Bytes::from(rendered), expiry, now);
                    Ok(initial)
                }
                None => Err(EngineError::NotFound),
            }
        })
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Physically removes every item that is dead right now.
    pub fn reclaim_expired(&self) -> u64 {
        let reclaimed = self.store.reclaim(self.clock.now());
        if reclaimed > 0 {
            self.counters
                .reclaimed
                .fetch_add(reclaimed, Ordering::Relaxed);
        }
        reclaimed
    }

    /// Returns engine statistics.
    pub fn stats(&self) -> EngineStats {
        let now = self.clock.now();
        let c = &self.counters;
        EngineStats {
            now,
            entries: self.store.len() as u64,
            live_entries: self.store.live_len(now) as u64,
            generation: self.store.generation(),
            adds: c.adds.load(Ordering::Relaxed),
            add_conflicts: c.add_conflicts.load(Ordering::Relaxed),
            sets: c.sets.load(Ordering::Relaxed),
            gets: c.gets.load(Ordering::Relaxed),
            get_misses: c.get_misses.load(Ordering::Relaxed),
            deletes: c.deletes.load(Ordering::Relaxed),
            arithmetic: c.arithmetic.load(Ordering::Relaxed),
            reclaimed: c.reclaimed.load(Ordering::Relaxed),
            clock_advances: c.clock_advances.load(Ordering::Relaxed),
        }
    }
}
