//! Join/list handshake, server side.

use std::io;

use tokio::io::{AsyncBufRead, AsyncWrite};

use relaychat_shared::protocol::{
    LIST_ROOMS_SENTINEL, encode_room_list, read_line, write_line, write_marker,
};

use crate::error::RelayError;

/// What a freshly accepted connection asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeRequest {
    /// Room list query; the connection is closed after the reply
    ListRooms,
    /// Join `room` under the display name `name`
    Join { room: String, name: String },
}

/// Run the server side of the handshake.
///
/// Sends the readiness marker, then reads the first line. The list sentinel
/// must be followed by a second, confirmatory line whose content is ignored.
/// Anything else is a room name followed by a display name line.
pub async fn negotiate<R, W>(reader: &mut R, writer: &mut W) -> Result<HandshakeRequest, RelayError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_marker(writer).await?;

    let first = read_required_line(reader, "room name").await?;
    if first.trim() == LIST_ROOMS_SENTINEL {
        read_required_line(reader, "list confirmation").await?;
        return Ok(HandshakeRequest::ListRooms);
    }

    let room = non_empty(first, "room name")?;
    let name = non_empty(read_required_line(reader, "display name").await?, "display name")?;

    Ok(HandshakeRequest::Join { room, name })
}

/// Reply to a list query with the pipe-joined room names.
pub async fn reply_room_list<W>(writer: &mut W, names: &[String]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &encode_room_list(names)).await
}

async fn read_required_line<R>(reader: &mut R, what: &str) -> Result<String, RelayError>
where
    R: AsyncBufRead + Unpin,
{
    let line = match read_line(reader).await {
        Ok(line) => line,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return Err(RelayError::Protocol(format!("unreadable {}: {}", what, e)));
        }
        Err(e) => return Err(e.into()),
    };
    line.ok_or_else(|| RelayError::Protocol(format!("connection closed before {} was sent", what)))
}

fn non_empty(value: String, what: &str) -> Result<String, RelayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RelayError::Protocol(format!("empty {}", what)));
    }
    Ok(trimmed.to_string())
}
