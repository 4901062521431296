//! Room discovery and join handshake, client side.

use std::future::Future;

use tokio::{
    io::{AsyncRead, BufReader},
    net::TcpStream,
    time::timeout,
};

use relaychat_shared::protocol::{
    LIST_ROOMS_SENTINEL, decode_room_list, read_line, read_marker, write_line,
};

use crate::{
    config::ConnectorConfig, domain::validate_handshake_token, error::ClientError,
    session::ClientSession, sink::MessageSink,
};

/// Opens list queries and room sessions against a relay server.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connector {
    config: ConnectorConfig,
}

impl Connector {
    pub fn new(config: ConnectorConfig) -> Self {
        Self { config }
    }

    /// Ask the server which rooms exist.
    ///
    /// Uses a short-lived connection. Names are returned in the order the
    /// server sent them.
    ///
    /// # Errors
    ///
    /// [`ClientError::Connection`] on any socket fault or when the whole
    /// exchange exceeds the list timeout.
    pub async fn list_rooms(&self, server_addr: &str) -> Result<Vec<String>, ClientError> {
        with_deadline(self.config.list_timeout, "room list query", async {
            let stream = connect(server_addr).await?;
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);

            expect_marker(&mut reader).await?;
            // The server reads the sentinel twice: once to pick the list branch,
            // once as confirmation.
            for _ in 0..2 {
                write_line(&mut writer, LIST_ROOMS_SENTINEL)
                    .await
                    .map_err(connection_error)?;
            }

            let reply = read_line(&mut reader)
                .await
                .map_err(connection_error)?
                .ok_or_else(|| {
                    ClientError::Protocol("server closed before sending the room list".to_string())
                })?;
            let rooms = decode_room_list(&reply);
            tracing::debug!("Received {} room(s) from {}", rooms.len(), server_addr);
            Ok::<_, ClientError>(rooms)
        })
        .await
    }

    /// Join `room` as `name` and start delivering its lines to `sink`.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidInput`] if room or name cannot be sent as one
    /// line, [`ClientError::Connection`] if the server cannot be reached in
    /// time, [`ClientError::Protocol`] if it does not greet with the marker.
    pub async fn join<S>(
        &self,
        server_addr: &str,
        room: &str,
        name: &str,
        sink: S,
    ) -> Result<ClientSession, ClientError>
    where
        S: MessageSink,
    {
        let room = validate_handshake_token(room, "room name")?;
        let name = validate_handshake_token(name, "display name")?;

        let (reader, mut writer) = with_deadline(self.config.connect_timeout, "connect", async {
            let stream = connect(server_addr).await?;
            let (reader, writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            expect_marker(&mut reader).await?;
            Ok::<_, ClientError>((reader, writer))
        })
        .await?;

        write_line(&mut writer, &room)
            .await
            .map_err(connection_error)?;
        write_line(&mut writer, &name)
            .await
            .map_err(connection_error)?;
        tracing::info!("Joined room '{}' on {} as '{}'", room, server_addr, name);

        Ok(ClientSession::start(
            room,
            name,
            reader,
            Box::new(writer),
            sink,
            self.config.quiescence,
        ))
    }
}

/// [`Connector::list_rooms`] with default configuration.
pub async fn list_rooms(server_addr: &str) -> Result<Vec<String>, ClientError> {
    Connector::default().list_rooms(server_addr).await
}

/// [`Connector::join`] with default configuration.
pub async fn join<S>(
    server_addr: &str,
    room: &str,
    name: &str,
    sink: S,
) -> Result<ClientSession, ClientError>
where
    S: MessageSink,
{
    Connector::default().join(server_addr, room, name, sink).await
}

async fn connect(server_addr: &str) -> Result<TcpStream, ClientError> {
    TcpStream::connect(server_addr).await.map_err(|e| {
        ClientError::Connection(format!("failed to connect to {}: {}", server_addr, e))
    })
}

async fn expect_marker<R>(reader: &mut R) -> Result<(), ClientError>
where
    R: AsyncRead + Unpin,
{
    let greeted = read_marker(reader).await.map_err(connection_error)?;
    if !greeted {
        return Err(ClientError::Protocol(
            "server did not send the readiness marker".to_string(),
        ));
    }
    Ok(())
}

async fn with_deadline<T, F>(
    deadline: std::time::Duration,
    what: &str,
    operation: F,
) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    timeout(deadline, operation).await.map_err(|_| {
        ClientError::Connection(format!("{} timed out after {:?}", what, deadline))
    })?
}

fn connection_error(e: std::io::Error) -> ClientError {
    ClientError::Connection(e.to_string())
}
