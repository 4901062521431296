//! Domain model: sessions and rooms.

mod room;
mod session;

pub use room::Room;
pub use session::{BoxedWriter, Session, SessionError, SessionHandle, SessionId, SessionState};
