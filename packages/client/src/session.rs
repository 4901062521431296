//! A joined room on the client side: send path, receive loop and leave.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufRead, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
    task::JoinHandle,
    time::timeout,
};

use relaychat_shared::protocol::{read_line, write_line};

use crate::{error::ClientError, sink::MessageSink};

/// Boxed write half of the session's connection.
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One joined room.
///
/// Dropping a session without calling [`ClientSession::leave`] leaves the
/// receive loop running until the server closes the connection.
pub struct ClientSession {
    room: String,
    name: String,
    writer: Mutex<BoxedWriter>,
    connected: Arc<AtomicBool>,
    stopping: Arc<AtomicBool>,
    receive_task: JoinHandle<()>,
    quiescence: Duration,
}

impl ClientSession {
    /// Start the receive loop on an already negotiated connection.
    pub(crate) fn start<R, S>(
        room: String,
        name: String,
        reader: R,
        writer: BoxedWriter,
        sink: S,
        quiescence: Duration,
    ) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        S: MessageSink,
    {
        let connected = Arc::new(AtomicBool::new(true));
        let stopping = Arc::new(AtomicBool::new(false));
        let receive_task = tokio::spawn(receive_loop(
            reader,
            sink,
            connected.clone(),
            stopping.clone(),
        ));

        Self {
            room,
            name,
            writer: Mutex::new(writer),
            connected,
            stopping,
            receive_task,
            quiescence,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send one line of chat text to the room.
    ///
    /// A failed write marks the session disconnected; it is not retried.
    pub async fn send(&self, text: &str) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::Disconnected);
        }

        let mut writer = self.writer.lock().await;
        if let Err(e) = write_line(&mut *writer, text).await {
            self.connected.store(false, Ordering::SeqCst);
            tracing::warn!("Failed to send to room '{}': {}", self.room, e);
            return Err(ClientError::Send(e.to_string()));
        }
        Ok(())
    }

    /// Close the connection and stop the receive loop.
    ///
    /// Waits up to the configured quiescence delay for the loop to see the
    /// close, then aborts it. The sink gets no connection-lost event.
    pub async fn leave(self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);

        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Failed to shut down connection cleanly: {}", e);
            }
        }

        let mut receive_task = self.receive_task;
        if timeout(self.quiescence, &mut receive_task).await.is_err() {
            tracing::debug!("Receive loop still running after {:?}; aborting", self.quiescence);
            receive_task.abort();
        }
        tracing::info!("Left room '{}' as '{}'", self.room, self.name);
    }
}

/// Deliver received lines to `sink` until the connection ends.
pub(crate) async fn receive_loop<R, S>(
    mut reader: R,
    sink: S,
    connected: Arc<AtomicBool>,
    stopping: Arc<AtomicBool>,
) where
    R: AsyncBufRead + Unpin,
    S: MessageSink,
{
    loop {
        match read_line(&mut reader).await {
            Ok(Some(line)) => {
                if !line.is_empty() {
                    sink.on_message_received(line);
                }
            }
            Ok(None) => {
                tracing::debug!("Server closed the connection");
                break;
            }
            Err(e) => {
                tracing::debug!("Read from server failed: {}", e);
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    if !stopping.load(Ordering::SeqCst) {
        sink.on_connection_lost();
    }
}
