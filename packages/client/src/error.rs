//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server unreachable, handshake I/O failure or timeout
    #[error("Connection error: {0}")]
    Connection(String),

    /// Write to an established session failed
    #[error("Send error: {0}")]
    Send(String),

    /// Server did not speak the expected protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Send attempted on a session that is no longer connected
    #[error("Not connected to the server")]
    Disconnected,

    /// Room or display name that cannot be sent as a single line
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
