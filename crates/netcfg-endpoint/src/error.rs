//! Error types for endpoint access.

use std::io;

use netcfg_core::DeserializationError;
use thiserror::Error;

/// The only error sources and targets return.
///
/// Each variant is either recoverable (worth a fresh connection and another
/// attempt) or fatal. See [`AccessError::is_recoverable`].
#[derive(Debug, Error)]
pub enum AccessError {
    /// The connection could not be established or was lost.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The endpoint is temporarily unable to serve requests.
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    /// Credentials were refused.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The endpoint refused a read or change.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A handle was used outside an open session.
    #[error("endpoint used without an open session")]
    NotOpen,

    /// A record could not be turned into an entity.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] DeserializationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AccessError {
    /// Whether retrying with a fresh connection can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Unavailable(_) => true,
            Self::Authentication(_)
            | Self::Rejected(_)
            | Self::NotOpen
            | Self::Deserialization(_) => false,
            Self::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::WouldBlock
            ),
        }
    }
}

/// Result type for endpoint operations.
pub type Result<T> = std::result::Result<T, AccessError>;
