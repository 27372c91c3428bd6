//! # LapseKV - An Item Store with Lazy Expiry and a Conformance Suite
//!
//! LapseKV is an in-memory item store in the memcached mould: keys map to
//! byte values with optional absolute expiry times, measured on a clock the
//! caller controls. It ships with a generator that enumerates every short
//! sequence of item operations and checks the store against a reference
//! model.
//!
//! ## Features
//!
//! - **Lazy Expiry**: An item is live iff it never expires or `now < expiry`.
//!   Nothing has to run for an item to expire.
//! - **Controllable Time**: Every operation reads an injected [`Clock`];
//!   tests advance a [`ManualClock`] instead of sleeping.
//! - **Atomic Check-Then-Act**: `add`, `delete`, arithmetic and concatenation
//!   decide and mutate under the key's shard lock.
//! - **Conformance Suite**: 14,630 generated sequences over 11 actions,
//!   with expectations derived from a model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              LapseKV                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ Conformance │───>│  Reporter   │───>│   Engine    │<── Command       │
//! │  │  Generator  │    │ (asserts)   │    │             │    Handler       │
//! │  └─────────────┘    └─────────────┘    └──┬───────┬──┘                  │
//! │                                           │       │                     │
//! │                                           ▼       ▼                     │
//! │                     ┌────────────────────────┐ ┌─────────┐              │
//! │                     │       ItemStore        │ │  Clock  │              │
//! │                     │ ┌───────┐ ┌───────┐    │ └─────────┘              │
//! │                     │ │Shard 0│ │Shard 1│ ...│                          │
//! │                     │ └───────┘ └───────┘    │                          │
//! │                     └────────────────────────┘                          │
//! │                                 ▲                                       │
//! │                     ┌───────────┴────────────┐                          │
//! │                     │  Reclaimer (optional)  │                          │
//! │                     └────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use lapsekv::engine::{Engine, EngineError};
//! use lapsekv::storage::Expiry;
//! use bytes::Bytes;
//!
//! let engine = Engine::with_manual_clock();
//! let key = Bytes::from("testkey");
//!
//! engine.add(key.clone(), Bytes::from("0"), Expiry::after(engine.now(), 2)).unwrap();
//! assert_eq!(
//!     engine.add(key.clone(), Bytes::from("0"), Expiry::after(engine.now(), 2)),
//!     Err(EngineError::KeyExists)
//! );
//!
//! engine.advance_clock(3).unwrap();
//! engine.add(key.clone(), Bytes::from("0"), Expiry::after(engine.now(), 2)).unwrap();
//! assert!(engine.check_value(&key, b"0").is_ok());
//! ```
//!
//! ## Module Overview
//!
//! - [`clock`]: Logical and wall-clock time sources
//! - [`storage`]: Items, liveness and the sharded item store
//! - [`engine`]: Item operations, errors and the background reclaimer
//! - [`reporter`]: Assertions over operation outcomes
//! - [`conformance`]: Sequence generator, reference model and drivers
//! - [`commands`]: Line-oriented command interpreter
//! - [`config`]: Engine and reclaimer configuration

pub mod clock;
pub mod commands;
pub mod config;
pub mod conformance;
pub mod engine;
pub mod reporter;
pub mod storage;

// Re-export commonly used types for convenience
pub use clock::{Clock, ClockError, ManualClock, SystemClock, Time};
pub use commands::{CommandHandler, Reply};
pub use config::{EngineConfig, ReclaimConfig};
pub use engine::{Engine, EngineError, EngineStats, ErrorKind, Reclaimer};
pub use storage::{Expiry, Item, ItemStore, Liveness};

/// Version of LapseKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
