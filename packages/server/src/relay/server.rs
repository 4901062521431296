//! Relay server lifecycle and accept loop.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    net::TcpListener,
    sync::{Mutex, watch},
    task::JoinHandle,
    time::timeout,
};

use crate::{config::RelayConfig, error::RelayError, registry::RoomRegistry};

use super::connection::{ConnectionContext, spawn_connection_handler};

/// Room-scoped chat relay server
///
/// # Example
///
/// ```no_run
/// # async fn run() -> Result<(), relaychat_server::RelayError> {
/// use relaychat_server::RelayServer;
///
/// let server = RelayServer::new();
/// let addr = server.start("127.0.0.1:9000").await?;
/// println!("listening on {}", addr);
/// server.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct RelayServer {
    config: RelayConfig,
    registry: Arc<RoomRegistry>,
    running: Arc<AtomicBool>,
    listener: Mutex<Option<ListenerTask>>,
}

struct ListenerTask {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl RelayServer {
    /// Create a server with default configuration
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    /// Create a server with the given configuration
    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            config,
            registry: Arc::new(RoomRegistry::new()),
            running: Arc::new(AtomicBool::new(false)),
            listener: Mutex::new(None),
        }
    }

    /// Shared handle to the room registry
    pub fn registry(&self) -> Arc<RoomRegistry> {
        self.registry.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to, while running
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().await.as_ref().map(|task| task.local_addr)
    }

    /// Start listening on `bind_addr` and accepting connections.
    ///
    /// Returns the bound address. Calling this while already running is a
    /// no-op that returns the current address.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Bind`] if the address is unavailable or in use.
    pub async fn start(&self, bind_addr: &str) -> Result<SocketAddr, RelayError> {
        let mut slot = self.listener.lock().await;
        if let Some(task) = slot.as_ref() {
            tracing::debug!("Relay server already running on {}", task.local_addr);
            return Ok(task.local_addr);
        }

        let bind_error = |source| RelayError::Bind {
            addr: bind_addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(bind_addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.running.store(true, Ordering::SeqCst);
        let ctx = ConnectionContext {
            registry: self.registry.clone(),
            running: self.running.clone(),
            handshake_timeout: self.config.handshake_timeout,
        };
        let accept_task = tokio::spawn(accept_loop(
            listener,
            shutdown_rx,
            self.config.accept_poll_interval,
            ctx,
        ));

        *slot = Some(ListenerTask {
            local_addr,
            shutdown: shutdown_tx,
            accept_task,
        });
        tracing::info!("Relay server listening on {}", local_addr);

        Ok(local_addr)
    }

    /// Stop accepting connections and close the listener.
    ///
    /// Sessions already accepted are not interrupted; each one ends after its
    /// next read observes the stop. Calling this more than once has no
    /// further effect.
    pub async fn stop(&self) {
        let task = self.listener.lock().await.take();
        let Some(task) = task else {
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        // The accept loop may already have exited; a closed channel is fine.
        let _ = task.shutdown.send(true);
        if let Err(e) = task.accept_task.await {
            tracing::warn!("Accept loop ended abnormally: {}", e);
        }
        tracing::info!("Relay server on {} stopped", task.local_addr);
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept connections until shutdown is signalled or the running flag is cleared.
///
/// Each accept waits at most `poll_interval` so a cleared flag is noticed
/// even if the shutdown signal is missed.
async fn accept_loop(
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
    poll_interval: Duration,
    ctx: ConnectionContext,
) {
    loop {
        if *shutdown.borrow() || !ctx.running.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = timeout(poll_interval, listener.accept()) => match accepted {
                Err(_) => continue,
                Ok(Ok((stream, peer))) => spawn_connection_handler(stream, peer, &ctx),
                Ok(Err(e)) => {
                    // Errors such as EMFILE persist; back off instead of spinning.
                    tracing::warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(poll_interval).await;
                }
            },
        }
    }

    tracing::debug!("Accept loop finished; closing listener");
}
