//! Server-side session: identity, lifecycle and the write path to its peer.

use std::{fmt, io, net::SocketAddr};

use thiserror::Error;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use uuid::Uuid;

use relaychat_shared::protocol::write_line;

/// Unique identifier of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random SessionId
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a session.
///
/// `Created -> Joined -> Active* -> Closed`, and `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Joined,
    Active,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Created => "created",
            SessionState::Joined => "joined",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Session lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}

/// One accepted connection as seen by the relay.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    peer: Option<SocketAddr>,
    room: Option<String>,
    name: Option<String>,
    state: SessionState,
}

impl Session {
    /// Create a session for a freshly accepted connection
    pub fn new(peer: Option<SocketAddr>) -> Self {
        Self {
            id: SessionId::generate(),
            peer,
            room: None,
            name: None,
            state: SessionState::Created,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Assign room and display name negotiated by the handshake.
    pub fn join(&mut self, room: String, name: String) -> Result<(), SessionError> {
        self.transition(SessionState::Joined)?;
        self.room = Some(room);
        self.name = Some(name);
        Ok(())
    }

    /// Mark that the session relayed a message.
    pub fn record_activity(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Active)
    }

    /// Close the session. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.state = SessionState::Closed;
        true
    }

    fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        let allowed = matches!(
            (self.state, to),
            (SessionState::Created, SessionState::Joined)
                | (SessionState::Joined, SessionState::Active)
                | (SessionState::Active, SessionState::Active)
        );
        if !allowed {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Boxed write half of a session's connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Write path to a joined session, shared with the room registry.
///
/// Writes are serialized by an internal lock so concurrent broadcasts never
/// interleave partial lines on the same connection.
pub struct SessionHandle {
    id: SessionId,
    name: String,
    writer: Mutex<BoxedWriter>,
}

impl SessionHandle {
    pub fn new(id: SessionId, name: String, writer: BoxedWriter) -> Self {
        Self {
            id,
            name,
            writer: Mutex::new(writer),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write one line to the peer.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        write_line(&mut *writer, line).await
    }

    /// Shut down the write side of the connection.
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("Failed to shut down session '{}' cleanly: {}", self.id, e);
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
