//! Chat client for the room-scoped relay.
//!
//! [`Connector`] queries the room list and joins rooms; a joined room is a
//! [`ClientSession`] whose background task hands every received line to a
//! [`MessageSink`]. The terminal front end lives in [`runner`].

pub mod config;
pub mod connector;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod sink;
mod ui;

pub use config::ConnectorConfig;
pub use connector::{Connector, join, list_rooms};
pub use error::ClientError;
pub use session::ClientSession;
pub use sink::{ClientEvent, MessageSink};
