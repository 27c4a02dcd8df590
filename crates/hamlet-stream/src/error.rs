//! Transport errors. None of them are fatal to the town; the client
//! turns them into reconnects and connectivity events.

use std::error::Error;
use std::fmt;

/// Why an event stream session ended abnormally.
#[derive(Debug)]
pub enum StreamError {
    /// Connecting or reading failed.
    Http(reqwest::Error),
    /// The server answered with a non-success status.
    Status {
        /// HTTP status code.
        code: u16,
    },
    /// The driver channel is closed; the client should stop.
    SinkClosed,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code } => write!(f, "server returned status {code}"),
            Self::SinkClosed => write!(f, "driver channel closed"),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}
