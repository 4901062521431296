//! Where a session's received lines go.

use tokio::sync::mpsc;

/// Receiver of lines from a joined room.
///
/// Called from the session's background task; implementations must return
/// promptly so the receive loop never stalls.
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink: Send + Sync + 'static {
    /// A line arrived from the room
    fn on_message_received(&self, line: String);

    /// The connection dropped without the caller leaving
    fn on_connection_lost(&self);
}

/// Events forwarded through a channel sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Message(String),
    ConnectionLost,
}

impl MessageSink for mpsc::UnboundedSender<ClientEvent> {
    fn on_message_received(&self, line: String) {
        if self.send(ClientEvent::Message(line)).is_err() {
            tracing::debug!("Message sink closed; dropping received line");
        }
    }

    fn on_connection_lost(&self) {
        if self.send(ClientEvent::ConnectionLost).is_err() {
            tracing::debug!("Message sink closed; dropping connection-lost event");
        }
    }
}
