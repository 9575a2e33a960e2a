//! Error types for the transport layer and transaction engine

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a response came up short of the expected length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortReason {
    /// The device went quiet before producing enough bytes
    TimedOut,
    /// The drain loop hit the overall deadline while bytes were still flowing
    EndedEarly,
}

impl fmt::Display for ShortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortReason::TimedOut => write!(f, "response timed out"),
            ShortReason::EndedEarly => write!(f, "response ended before expected length"),
        }
    }
}

/// Errors that can occur while talking to the EC
#[derive(Debug, Error)]
pub enum TransportError {
    /// No output byte became available within the read timeout.
    ///
    /// The transaction engine treats this as "drain complete", not as a
    /// failure; it only becomes one via [`TransportError::ShortResponse`].
    #[error("OBF not set within {0:?} (no data)")]
    ReadTimeout(Duration),

    /// Fewer response bytes arrived than the caller expected
    #[error("{reason}: received {got} of {expected} byte(s)")]
    ShortResponse {
        got: usize,
        expected: usize,
        reason: ShortReason,
    },

    /// The input buffer never cleared before a write (only with the
    /// strict handshake enabled)
    #[error("IBF not cleared before {0}")]
    InputBufferBusy(&'static str),

    /// The underlying port I/O backend failed
    #[error("port I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True for the timeout used internally to detect a finished drain
    pub fn is_read_timeout(&self) -> bool {
        matches!(self, TransportError::ReadTimeout(_))
    }
}
