//! Storage Module
//!
//! This module provides the in-process item storage for LapseKV: a sharded
//! key → item mapping plus the pure liveness predicate the engine uses to
//! interpret what it finds.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ItemStore                            │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...N     │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!            ▲ lookup / with_slot / reclaim
//!            │
//!     ┌──────┴───────┐
//!     │    Engine    │
//!     └──────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: independent shards reduce lock contention
//! - **Derived Liveness**: items never carry a "dead" flag; liveness is
//!   computed from the expiry and the current clock reading
//! - **Tombstones**: dead items may stay in place until they are replaced,
//!   deleted or reclaimed
//! - **Atomic Slots**: all mutations run inside a shard write lock
//!
//! ## Example
//!
//! ```
//! use lapsekv::storage::{liveness, Expiry, ItemStore, Liveness};
//! use bytes::Bytes;
//!
//! let store = ItemStore::new();
//! let key = Bytes::from("session");
//!
//! store.with_slot(&key, |slot| {
//!     slot.insert_or_replace(Bytes::from("token"), Expiry::At(60), 0);
//! });
//!
//! let item = store.lookup(&key).unwrap();
//! assert_eq!(liveness(&item, 30), Liveness::Live);
//! assert_eq!(liveness(&item, 60), Liveness::Expired);
//! ```

pub mod item;
pub mod store;

// Re-export commonly used types
pub use item::{liveness, Expiry, Item, Liveness};
pub use store::{ItemStore, KeySlot, DEFAULT_SHARDS};
