//! Command Replies
//!
//! Every command produces exactly one [`Reply`]. Replies render as a single
//! line (or, for informational replies, a block of lines):
//!
//! - `OK`
//! - `VALUE <bytes>`
//! - `<integer>`
//! - `ERROR <kind> <message>`
//! - free-form text for `stats` and `help`

use crate::engine::EngineError;
use bytes::Bytes;
use std::fmt;

/// Error kind for commands that could not be parsed.
pub const USAGE_ERROR: &str = "usage";

/// Error kind for unrecognized command names.
pub const UNKNOWN_COMMAND: &str = "unknown_command";

/// The response to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The operation succeeded with nothing to return
    Ok,

    /// A stored value
    Value(Bytes),

    /// A number (counter value, length, time, count)
    Integer(u64),

    /// The operation failed
    Error { kind: String, message: String },

    /// Multi-line informational text
    Info(String),

    /// The session should end
    Quit,
}

impl Reply {
    /// Creates an error reply.
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Reply::Error {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates a usage error reply.
    pub fn usage(message: impl Into<String>) -> Self {
        Reply::error(USAGE_ERROR, message)
    }

    /// Creates a value reply.
    pub fn value(data: impl Into<Bytes>) -> Self {
        Reply::Value(data.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error { .. })
    }

    /// Returns the error kind, if this is an error reply.
    pub fn error_kind(&self) -> Option<&str> {
        match self {
            Reply::Error { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl From<EngineError> for Reply {
    fn from(err: EngineError) -> Self {
        Reply::error(err.kind().as_str(), err.to_string())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Value(data) => write!(f, "VALUE {}", String::from_utf8_lossy(data)),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Error { kind, message } => write!(f, "ERROR {} {}", kind, message),
            Reply::Info(text) => f.write_str(text.trim_end()),
            Reply::Quit => f.write_str("BYE"),
        }
    }
}
