//! Relay server configuration.

use std::time::Duration;

/// Default bound on a single accept wait, after which the running flag is re-checked.
pub const DEFAULT_ACCEPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time a new connection gets to finish the handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`crate::RelayServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Bounded wait per accept attempt
    pub accept_poll_interval: Duration,
    /// Deadline for a connection to send its room and name (or list request)
    pub handshake_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            accept_poll_interval: DEFAULT_ACCEPT_POLL_INTERVAL,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}
