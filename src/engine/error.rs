//! Operation errors.
//!
//! Every error is a normal, recoverable outcome of a single operation. None
//! of them leaves the engine in a degraded state.

use crate::clock::ClockError;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Errors returned by [`Engine`](super::Engine) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `add` found a live item under the key
    #[error("key already exists")]
    KeyExists,

    /// The key is absent or its item has expired
    #[error("key not found")]
    NotFound,

    /// The live value differs from the expected one
    #[error("value mismatch: expected {expected:?}, found {actual:?}")]
    Mismatch { expected: Bytes, actual: Bytes },

    /// Arithmetic on a value that is not an unsigned decimal integer
    #[error("value is not a number")]
    NotANumber,

    /// Rejected before touching any state
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    /// The kind of this error, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::KeyExists => ErrorKind::KeyExists,
            EngineError::NotFound => ErrorKind::NotFound,
            EngineError::Mismatch { .. } => ErrorKind::Mismatch,
            EngineError::NotANumber => ErrorKind::NotANumber,
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl From<ClockError> for EngineError {
    fn from(err: ClockError) -> Self {
        EngineError::InvalidArgument(err.to_string())
    }
}

/// Payload-free classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyExists,
    NotFound,
    Mismatch,
    NotANumber,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::KeyExists => "key_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Mismatch => "mismatch",
            ErrorKind::NotANumber => "not_a_number",
            ErrorKind::InvalidArgument => "invalid_argument",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
