//! Result Reporter
//!
//! Translates operation results into the success/error signals a caller
//! asserts on. It holds no state and never touches the engine except through
//! its public read operations.
//!
//! ```
//! use lapsekv::engine::{Engine, EngineError};
//! use lapsekv::reporter::{self, Signal};
//! use lapsekv::storage::Expiry;
//! use bytes::Bytes;
//!
//! let engine = Engine::with_manual_clock();
//! let added = engine.add(Bytes::from("k"), Bytes::from("0"), Expiry::Never);
//! assert_eq!(reporter::signal(&added), Signal::NoError);
//! assert!(reporter::assert_has_no_error(&added).is_ok());
//!
//! let again = engine.add(Bytes::from("k"), Bytes::from("0"), Expiry::Never);
//! assert!(reporter::assert_has_error(&again).is_ok());
//! ```

use crate::engine::{Engine, EngineError, ErrorKind};
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// What a caller observes from one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    NoError,
    Error(ErrorKind),
}

impl Signal {
    pub fn is_error(&self) -> bool {
        matches!(self, Signal::Error(_))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::NoError => f.write_str("no error"),
            Signal::Error(kind) => write!(f, "error ({})", kind),
        }
    }
}

/// A failed reporter assertion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Expected success, got an error
    #[error("expected no error, got {0}")]
    UnexpectedError(EngineError),

    /// Expected an error, the operation succeeded
    #[error("expected an error, operation succeeded")]
    MissingError,

    /// The final value check failed
    #[error("value check for {key:?} failed: {source}")]
    ValueCheck { key: Bytes, source: EngineError },

    /// A key expected to be gone is still readable
    #[error("expected {key:?} to be absent, found {value:?}")]
    StillExists { key: Bytes, value: Bytes },
}

/// Maps an operation result to its signal.
pub fn signal<T>(result: &Result<T, EngineError>) -> Signal {
    match result {
        Ok(_) => Signal::NoError,
        Err(err) => Signal::Error(err.kind()),
    }
}

/// Succeeds iff the operation succeeded.
pub fn assert_has_no_error<T>(result: &Result<T, EngineError>) -> Result<(), ReportError> {
    match result {
        Ok(_) => Ok(()),
        Err(err) => Err(ReportError::UnexpectedError(err.clone())),
    }
}

/// Succeeds iff the operation failed.
pub fn assert_has_error<T>(result: &Result<T, EngineError>) -> Result<(), ReportError> {
    match result {
        Ok(_) => Err(ReportError::MissingError),
        Err(_) => Ok(()),
    }
}

/// Succeeds iff `key` holds the live value `expected`.
pub fn check_value(engine: &Engine, key: &Bytes, expected: &[u8]) -> Result<(), ReportError> {
    engine
        .check_value(key, expected)
        .map_err(|source| ReportError::ValueCheck {
            key: key.clone(),
            source,
        })
}

/// Succeeds iff `key` has no live value.
pub fn assert_not_exists(engine: &Engine, key: &Bytes) -> Result<(), ReportError> {
    match engine.get(key) {
        Ok(value) => Err(ReportError::StillExists {
            key: key.clone(),
            value,
        }),
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Expiry;

    #[test]
    fn test_signal() {
        let ok: Result<(), EngineError> = Ok(());
        let err: Result<(), EngineError> = Err(EngineError::KeyExists);

        assert_eq!(signal(&ok), Signal::NoError);
        assert_eq!(signal(&err), Signal::Error(ErrorKind::KeyExists));
        assert!(signal(&err).is_error());
        assert_eq!(signal(&err).to_string(), "error (key_exists)");
    }

    #[test]
    fn test_assertions() {
        let ok: Result<u64, EngineError> = Ok(3);
        let err: Result<u64, EngineError> = Err(EngineError::NotFound);

        assert!(assert_has_no_error(&ok).is_ok());
        assert_eq!(
            assert_has_no_error(&err),
            Err(ReportError::UnexpectedError(EngineError::NotFound))
        );
        assert!(assert_has_error(&err).is_ok());
        assert_eq!(assert_has_error(&ok), Err(ReportError::MissingError));
    }

    #[test]
    fn test_value_checks() {
        let engine = Engine::with_manual_clock();
        let key = Bytes::from("k");

        assert!(assert_not_exists(&engine, &key).is_ok());
        assert!(matches!(
            check_value(&engine, &key, b"0"),
            Err(ReportError::ValueCheck {
                source: EngineError::NotFound,
                ..
            })
        ));

        engine.set(key.clone(), Bytes::from("0"), Expiry::At(1)).unwrap();
        assert!(check_value(&engine, &key, b"0").is_ok());
        assert!(matches!(
            assert_not_exists(&engine, &key),
            Err(ReportError::StillExists { .. })
        ));

        engine.advance_clock(1).unwrap();
        assert!(assert_not_exists(&engine, &key).is_ok());
    }
}
