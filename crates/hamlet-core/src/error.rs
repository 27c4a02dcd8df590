//! Error types for event decoding.

use std::error::Error;
use std::fmt;

/// Errors from decoding a stream frame into a [`TownEvent`](crate::TownEvent).
///
/// The reconciler never sees these: the caller logs and drops the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventError {
    /// The frame's event name is not one the town understands.
    UnknownKind {
        /// The unrecognised event name.
        kind: String,
    },
    /// The payload could not be decoded into the expected shape.
    Malformed {
        /// The event name whose payload failed.
        kind: String,
        /// Decoder message.
        reason: String,
    },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind { kind } => write!(f, "unknown event kind '{kind}'"),
            Self::Malformed { kind, reason } => {
                write!(f, "malformed '{kind}' payload: {reason}")
            }
        }
    }
}

impl Error for EventError {}
