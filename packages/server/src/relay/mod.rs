//! Relay server: accept loop, handshake and per-session receive loop.

mod connection;
mod handshake;
mod server;

pub use handshake::{HandshakeRequest, negotiate, reply_room_list};
pub use server::RelayServer;
