//! Error types for the relay server.

use std::io;

use thiserror::Error;

use crate::domain::SessionError;

/// Relay server errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// The listener could not be bound
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The peer broke the handshake
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Session lifecycle violated
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Socket-level failure on an accepted connection
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
