//! Sharded Item Store
//!
//! This module holds the key → item mapping. It knows nothing about operation
//! semantics: it hands out raw items and lets the engine decide what liveness
//! means for each operation.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ItemStore                            │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are distributed across shards by hash. Reads take the shard's read
//! lock; every mutation goes through [`ItemStore::with_slot`], which holds the
//! shard's write lock for the whole closure. That closure is where the engine
//! performs its lookup → liveness check → write sequence, so no other
//! operation on the same key can slip in between the check and the write.

use super::item::{Expiry, Item};
use crate::clock::Time;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 64;

#[derive(Debug, Default)]
struct Shard {
    items: RwLock<HashMap<Bytes, Item>>,
}

/// Exclusive access to one key while its shard is write-locked.
///
/// Obtained through [`ItemStore::with_slot`].
#[derive(Debug)]
pub struct KeySlot<'a> {
    key: &'a Bytes,
    items: &'a mut HashMap<Bytes, Item>,
}

impl<'a> KeySlot<'a> {
    /// The key this slot is bound to.
    pub fn key(&self) -> &Bytes {
        self.key
    }

    /// The stored item, live or not.
    pub fn item(&self) -> Option<&Item> {
        self.items.get(self.key)
    }

    /// Mutable access to the stored item only if it is live at `now`.
    pub fn live_item_mut(&mut self, now: Time) -> Option<&mut Item> {
        self.items.get_mut(self.key).filter(|item| item.is_live(now))
    }

    /// Unconditionally installs a new item, returning whatever was there.
    pub fn insert_or_replace(&mut self, value: Bytes, expiry: Expiry, now: Time) -> Option<Item> {
        let item = Item::new(self.key.clone(), value, expiry, now);
        self.items.insert(self.key.clone(), item)
    }

    /// Removes the stored item.
    pub fn remove(&mut self) -> Option<Item> {
        self.items.remove(self.key)
    }
}

/// The key → item mapping.
///
/// # Example
///
/// ```
/// use lapsekv::storage::{ItemStore, Expiry};
/// use bytes::Bytes;
///
/// let store = ItemStore::new();
/// let key = Bytes::from("k");
///
/// store.with_slot(&key, |slot| {
///     slot.insert_or_replace(Bytes::from("0"), Expiry::At(10), 0);
/// });
///
/// let item = store.lookup(&key).unwrap();
/// assert!(item.is_live(9));
/// assert!(!item.is_live(10));
/// ```
#[derive(Debug)]
pub struct ItemStore {
    shards: Vec<Shard>,
    generation: AtomicU64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    /// Creates a store with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Creates a store with `shards` shards (at least one).
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Shard::default()).collect();
        Self {
            shards,
            generation: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the stored item regardless of liveness.
    ///
    /// `None` means no entry exists in the current generation.
    pub fn lookup(&self, key: &[u8]) -> Option<Item> {
        self.shard(key).items.read().get(key).cloned()
    }

    /// Runs `f` with exclusive access to `key`.
    ///
    /// The owning shard stays write-locked until `f` returns, so everything
    /// `f` does to the slot is atomic with respect to other operations on
    /// the same key.
    ///
    /// The store never checks liveness on writes. Callers read the slot's
    /// item first and then pick one of the write paths the engine uses:
    ///
    /// - `insert_or_replace` when the key has no live item (`add`, and
    ///   with-default arithmetic on a missing counter)
    /// - `insert_or_replace` over a live item (`set` only)
    /// - in-place update through [`KeySlot::live_item_mut`] (`append`,
    ///   `prepend`, `incr`, `decr`), which keeps the item's expiry
    /// - `remove` (`delete`)
    pub fn with_slot<R>(&self, key: &Bytes, f: impl FnOnce(&mut KeySlot<'_>) -> R) -> R {
        let mut items = self.shard(key).items.write();
        let mut slot = KeySlot {
            key,
            items: &mut items,
        };
        f(&mut slot)
    }

    /// Removes the entry for `key`, live or not.
    pub fn remove(&self, key: &[u8]) -> Option<Item> {
        self.shard(key).items.write().remove(key)
    }

    /// Drops every entry and starts a new generation.
    ///
    /// Returns the number of entries dropped.
    pub fn clear(&self) -> u64 {
        let mut dropped = 0u64;
        for shard in &self.shards {
            let mut items = shard.items.write();
            dropped += items.len() as u64;
            items.clear();
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        dropped
    }

    /// Current store generation. Bumped by [`ItemStore::clear`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Physically removes every item that is dead at `now`.
    ///
    /// Returns the number of items removed.
    pub fn reclaim(&self, now: Time) -> u64 {
        let mut reclaimed = 0u64;
        for shard in &self.shards {
            let mut items = shard.items.write();
            let before = items.len();
            items.retain(|_, item| item.is_live(now));
            reclaimed += (before - items.len()) as u64;
        }
        reclaimed
    }

    /// Number of physical entries, including dead ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.items.read().len()).sum()
    }

    /// Number of entries that are live at `now`.
    pub fn live_len(&self, now: Time) -> usize {
        self.shards
            .iter()
            .map(|s| s.items.read().values().filter(|i| i.is_live(now)).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
