//! Operation Engine Module
//!
//! This module implements the observable operation contract of LapseKV on
//! top of the [`storage`](crate::storage) and [`clock`](crate::clock)
//! modules.
//!
//! ## Architecture
//!
//! ```text
//!   caller
//!     │  add / get / check_value / advance_clock / ...
//!     ▼
//! ┌──────────────────────────┐      now()      ┌─────────────┐
//! │          Engine          │ ──────────────> │    Clock    │
//! │                          │                 └─────────────┘
//! │  validate → read clock → │
//! │  with_slot { lookup →    │   with_slot     ┌─────────────┐
//! │    liveness → mutate }   │ ──────────────> │  ItemStore  │
//! └──────────────────────────┘                 └─────────────┘
//!                                                     ▲
//!                                  reclaim_expired()  │
//!                                ┌────────────────────┴──┐
//!                                │  Reclaimer (optional) │
//!                                └───────────────────────┘
//! ```
//!
//! ## Conflict Resolution
//!
//! `add` is an atomic insert-if-absent-or-expired. A key whose item has
//! expired is free again: re-adding it installs the new value and expiry
//! rather than extending the old item.
//!
//! ## Lazy Expiry
//!
//! Liveness is checked on access. The [`Reclaimer`] only frees memory and is
//! never needed for correctness.

pub mod operations;
pub mod error;
pub mod reclaimer;


// Re-export commonly used types
pub use operations::{Engine, EngineStats};
pub use error::{EngineError, ErrorKind};
pub use reclaimer::Reclaimer;
