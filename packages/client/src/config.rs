//! Client connector configuration.

use std::time::Duration;

/// Default deadline for connecting and receiving the readiness marker.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for a complete room list query.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default wait for the receive loop to finish after leaving a room.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(200);

/// Tunables for [`crate::Connector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub connect_timeout: Duration,
    pub list_timeout: Duration,
    pub quiescence: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            list_timeout: DEFAULT_LIST_TIMEOUT,
            quiescence: DEFAULT_QUIESCENCE,
        }
    }
}
