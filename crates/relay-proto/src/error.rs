//! Error types for the relay protocol library.
//!
//! [`ProtocolError`] covers transport-level failures (framing, I/O) and ends
//! the connection it occurs on. [`CommandError`] covers a well-framed line
//! that is not a usable command; callers report it to the peer and carry on.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Transport-level protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line (or an unterminated fragment) exceeded the configured limit.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Bytes seen so far.
        actual: usize,
        /// Configured maximum, terminator included.
        limit: usize,
    },

    /// A complete line was not valid UTF-8.
    #[error("invalid UTF-8 at byte {byte_pos}")]
    InvalidUtf8 {
        /// Offset of the first invalid byte.
        byte_pos: usize,
    },
}

impl ProtocolError {
    /// Whether the peer sent bytes that cannot be framed, as opposed to the
    /// socket itself failing.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::MessageTooLong { .. } | Self::InvalidUtf8 { .. })
    }
}

/// Errors produced while turning a line into a [`Command`](crate::Command).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The line held no verb at all.
    #[error("empty message")]
    Empty,

    /// The verb is not part of the protocol.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The verb is known but fewer arguments than its arity were given.
    #[error("not enough parameters for {0}")]
    NeedMoreParams(String),
}

impl CommandError {
    /// The (upper-cased) verb this error refers to, if any.
    pub fn verb(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::UnknownCommand(verb) | Self::NeedMoreParams(verb) => Some(verb),
        }
    }
}
