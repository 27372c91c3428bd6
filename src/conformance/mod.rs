//! Conformance Suite Module
//!
//! Generates every short sequence of item operations, works out from a
//! reference model what each step should report, and checks an engine
//! against it (or prints the result as a listing).
//!
//! ## How It Works
//!
//! ```text
//!   actions × length          ┌───────────────┐
//!  ─────────────────────────> │  sequences()  │  sorted, ≤ `duplicates`
//!                             └───────┬───────┘  repeats per action
//!                                     │
//!                                     ▼
//!                             ┌───────────────┐  pre → effect → post
//!                             │   run_suite   │  against ModelState
//!                             └───────┬───────┘
//!                       hooks         │
//!              ┌──────────────────────┴─────────────────────┐
//!              ▼                                            ▼
//!     ┌─────────────────┐                         ┌─────────────────┐
//!     │  EngineDriver   │                         │  ListingDriver  │
//!     │ run + assert    │                         │ render text     │
//!     └─────────────────┘                         └─────────────────┘
//! ```
//!
//! An action whose preconditions do not hold is expected to fail without
//! touching the state. `delay` models the clock moving past every item's
//! expiry, so it empties the model just like `flush`.
//!
//! ## Example
//!
//! ```
//! use lapsekv::config::EngineConfig;
//! use lapsekv::conformance::{run_suite, Action, EngineDriver, SuiteConfig};
//!
//! let config = SuiteConfig {
//!     actions: vec![Action::Add, Action::Delay, Action::Set],
//!     length: 3,
//!     duplicates: 2,
//!     ..Default::default()
//! };
//! let mut driver = EngineDriver::new(EngineConfig::default(), config.key.clone(), config.expiry);
//! run_suite(&config, &mut driver);
//!
//! let report = driver.into_report();
//! assert_eq!(report.total, 24);
//! assert!(report.is_success());
//! ```

pub mod engine_driver;
pub mod listing;
pub mod model;
pub mod runner;

pub use engine_driver::{EngineDriver, Failure, StepFailure, SuiteReport};
pub use listing::ListingDriver;
pub use model::{Action, Condition, Effect, ModelError, ModelState};
pub use runner::{run_suite, sequences, test_name, Driver, Sequence};

use thiserror::Error;

/// Default key every sequence operates on.
pub const DEFAULT_KEY: &str = "testkey";

/// Default TTL, in logical seconds, of items stored by the suite.
pub const DEFAULT_EXPIRY: u32 = 2;

/// Longest sequence a suite may ask for. Enumeration walks
/// `actions.len() ^ length` candidates.
pub const MAX_SEQUENCE_LENGTH: usize = 6;

/// Reasons a [`SuiteConfig`] cannot be run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SuiteConfigError {
    #[error("suite key is empty")]
    EmptyKey,

    #[error("suite key is {len} bytes (max: {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("sequence length must be between 1 and {max}, got {length}")]
    Length { length: usize, max: usize },

    #[error("suite expiry must be at least 1 second")]
    ZeroExpiry,

    #[error("no actions to generate sequences from")]
    NoActions,
}

/// Shape of a generated suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    /// Actions sequences are drawn from (default: all of them)
    pub actions: Vec<Action>,
    /// Actions per sequence (default: 4)
    pub length: usize,
    /// Most times one action may appear in a sequence (default: 3)
    pub duplicates: usize,
    /// TTL of stored items; `delay` advances `expiry + 1` (default: 2)
    pub expiry: u32,
    /// Key the sequences operate on
    pub key: String,
}

impl SuiteConfig {
    /// Checks that every sequence of this suite can run on an engine that
    /// accepts keys up to `max_key_len` bytes.
    pub fn validate(&self, max_key_len: usize) -> Result<(), SuiteConfigError> {
        if self.key.is_empty() {
            return Err(SuiteConfigError::EmptyKey);
        }
        if self.key.len() > max_key_len {
            return Err(SuiteConfigError::KeyTooLong {
                len: self.key.len(),
                max: max_key_len,
            });
        }
        if self.length == 0 || self.length > MAX_SEQUENCE_LENGTH {
            return Err(SuiteConfigError::Length {
                length: self.length,
                max: MAX_SEQUENCE_LENGTH,
            });
        }
        if self.expiry == 0 {
            return Err(SuiteConfigError::ZeroExpiry);
        }
        if self.actions.is_empty() {
            return Err(SuiteConfigError::NoActions);
        }
        Ok(())
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            actions: Action::ALL.to_vec(),
            length: 4,
            duplicates: 3,
            expiry: DEFAULT_EXPIRY,
            key: DEFAULT_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_KEY_LEN;

    #[test]
    fn test_default_suite_is_valid() {
        assert_eq!(SuiteConfig::default().validate(DEFAULT_MAX_KEY_LEN), Ok(()));
    }

    #[test]
    fn test_rejects_unusable_keys() {
        let empty = SuiteConfig {
            key: String::new(),
            ..Default::default()
        };
        assert_eq!(empty.validate(DEFAULT_MAX_KEY_LEN), Err(SuiteConfigError::EmptyKey));

        let long = SuiteConfig {
            key: "k".repeat(11),
            ..Default::default()
        };
        assert_eq!(
            long.validate(10),
            Err(SuiteConfigError::KeyTooLong { len: 11, max: 10 })
        );
        assert_eq!(long.validate(11), Ok(()));
    }

    #[test]
    fn test_rejects_bad_shape() {
        for length in [0, MAX_SEQUENCE_LENGTH + 1] {
            let config = SuiteConfig {
                length,
                ..Default::default()
            };
            assert_eq!(
                config.validate(DEFAULT_MAX_KEY_LEN),
                Err(SuiteConfigError::Length {
                    length,
                    max: MAX_SEQUENCE_LENGTH
                })
            );
        }

        let zero_expiry = SuiteConfig {
            expiry: 0,
            ..Default::default()
        };
        assert_eq!(
            zero_expiry.validate(DEFAULT_MAX_KEY_LEN),
            Err(SuiteConfigError::ZeroExpiry)
        );

        let no_actions = SuiteConfig {
            actions: vec![],
            ..Default::default()
        };
        assert_eq!(
            no_actions.validate(DEFAULT_MAX_KEY_LEN),
            Err(SuiteConfigError::NoActions)
        );
    }
}
