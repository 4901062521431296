//! Per-connection handling: handshake, then either list reply or session relay.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{TcpStream, tcp::OwnedReadHalf},
    time::timeout,
};

use relaychat_shared::protocol::{chat_line, join_notice, leave_notice, read_line};

use crate::{
    domain::{Session, SessionHandle},
    registry::RoomRegistry,
};

use super::handshake::{HandshakeRequest, negotiate, reply_room_list};

/// State every connection task needs from the server.
#[derive(Clone)]
pub(crate) struct ConnectionContext {
    pub registry: Arc<RoomRegistry>,
    pub running: Arc<AtomicBool>,
    pub handshake_timeout: Duration,
}

/// Spawn the task that owns one accepted connection.
pub(crate) fn spawn_connection_handler(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: &ConnectionContext,
) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        handle_connection(stream, peer, ctx).await;
    });
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: ConnectionContext) {
    tracing::info!("{} connected to the server", peer);

    let session = Session::new(Some(peer));
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let request = match timeout(ctx.handshake_timeout, negotiate(&mut reader, &mut writer)).await {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            tracing::warn!("Handshake with {} failed: {}", peer, e);
            return;
        }
        Err(_) => {
            tracing::warn!(
                "Handshake with {} timed out after {:?}",
                peer,
                ctx.handshake_timeout
            );
            return;
        }
    };

    match request {
        HandshakeRequest::ListRooms => {
            let names = ctx.registry.room_names().await;
            if let Err(e) = reply_room_list(&mut writer, &names).await {
                tracing::warn!("Failed to send room list to {}: {}", peer, e);
                return;
            }
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Failed to shut down list connection {}: {}", peer, e);
            }
            tracing::info!("Room list sent to {} ({} rooms)", peer, names.len());
        }
        HandshakeRequest::Join { room, name } => {
            let handle = Arc::new(SessionHandle::new(session.id(), name.clone(), Box::new(writer)));
            run_session(session, room, name, reader, handle, ctx).await;
        }
    }
}

/// Register the session, relay its lines, and clean up once it ends.
async fn run_session(
    mut session: Session,
    room: String,
    name: String,
    reader: BufReader<OwnedReadHalf>,
    handle: Arc<SessionHandle>,
    ctx: ConnectionContext,
) {
    let id = session.id();
    if let Err(e) = session.join(room.clone(), name.clone()) {
        tracing::error!("Session '{}' could not join '{}': {}", id, room, e);
        handle.close().await;
        return;
    }

    ctx.registry.join(&room, handle.clone()).await;
    tracing::info!(
        "{} joined room '{}' from {:?} (session {})",
        name,
        room,
        session.peer(),
        id
    );
    ctx.registry.broadcast(&room, &join_notice(&name), None).await;

    // The loop runs on its own task so the cleanup below also runs if it panics.
    let receive_task = tokio::spawn(receive_loop(session, reader, ctx.clone()));
    let finished = match receive_task.await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::error!("Receive loop of '{}' in '{}' aborted: {}", name, room, e);
            None
        }
    };

    ctx.registry.leave(&room, &id).await;
    tracing::info!("{} left room '{}'", name, room);
    ctx.registry
        .broadcast(&room, &leave_notice(&name), Some(id))
        .await;
    handle.close().await;

    if let Some(mut session) = finished {
        session.close();
    }
}

/// Read lines until the peer goes away or the server stops, relaying each one.
async fn receive_loop(
    mut session: Session,
    mut reader: BufReader<OwnedReadHalf>,
    ctx: ConnectionContext,
) -> Session {
    let id = session.id();
    let room = session.room().unwrap_or_default().to_string();
    let name = session.name().unwrap_or_default().to_string();

    loop {
        let message = match read_line(&mut reader).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::debug!("Session '{}' closed by peer", id);
                break;
            }
            Err(e) => {
                tracing::debug!("Session '{}' read failed: {}", id, e);
                break;
            }
        };

        if !ctx.running.load(Ordering::SeqCst) {
            tracing::debug!("Server stopped; ending session '{}'", id);
            break;
        }

        if message.is_empty() {
            continue;
        }

        if let Err(e) = session.record_activity() {
            tracing::warn!("Session '{}' cannot relay: {}", id, e);
            break;
        }

        let formatted = chat_line(&name, &message);
        tracing::info!("[Room {}] {}", room, formatted);
        let outcome = ctx.registry.broadcast(&room, &formatted, Some(id)).await;
        tracing::debug!(
            "Relayed line from '{}' to {} member(s), evicted {}",
            name,
            outcome.delivered,
            outcome.evicted.len()
        );
    }

    session
}
