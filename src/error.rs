//! Error types for imap-drafter

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("APPEND rejected: {0}")]
    AppendRejected(String),

    #[error("Literal length mismatch: declared {declared} bytes, composed {actual}")]
    Encoding { declared: usize, actual: usize },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the session that produced this error can no longer be
    /// trusted to carry further commands.
    ///
    /// Rejections and unrenderable messages only affect the message in
    /// hand; everything else means the line stream is out of sync or
    /// gone.
    #[must_use]
    pub const fn is_session_fatal(&self) -> bool {
        !matches!(self, Self::AppendRejected(_) | Self::InvalidMessage(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
