//! Room-scoped chat relay server.
//!
//! Clients connect over TCP, negotiate either a room list query or a room
//! join, and every line a member sends is relayed to the other members of
//! its room.

pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod relay;

pub use config::RelayConfig;
pub use error::RelayError;
pub use registry::RoomRegistry;
pub use relay::RelayServer;
