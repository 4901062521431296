//! Pieces shared by the relay server and the chat client.
//!
//! - [`protocol`]: handshake tokens, notice formats and line framing helpers.
//! - [`logger`]: tracing subscriber setup for the binaries.
//! - [`time`]: wall-clock helpers for displaying received lines.

pub mod logger;
pub mod protocol;
pub mod time;
