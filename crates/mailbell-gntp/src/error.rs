//! Error types for GNTP operations.

use crate::types::ErrorCode;
use std::io;
use std::time::Duration;

/// Result type alias for GNTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// GNTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The daemon did not answer in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Protocol error (unexpected or malformed response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Daemon answered `-ERROR`.
    #[error("GNTP error {code}: {description}")]
    Server {
        /// Error code (e.g., 401).
        code: ErrorCode,
        /// Error description from the daemon.
        description: String,
    },
}

impl Error {
    /// Returns true if the daemon could not be reached or stopped answering.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_))
    }

    /// Returns true if the response could not be understood.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}
