//! Room-scoped chat relay server.
//!
//! Accepts TCP connections, lets each client list rooms or join one, and
//! relays every line a member sends to the other members of its room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaychat-server
//! cargo run --bin relaychat-server -- --host 0.0.0.0 --port 9000
//! ```

use std::time::Duration;

use clap::Parser;

use relaychat_server::{RelayConfig, RelayServer};
use relaychat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaychat-server")]
#[command(about = "Room-scoped TCP chat relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "9000")]
    port: u16,

    /// Upper bound on each accept wait, in milliseconds
    #[arg(long, default_value = "1000")]
    accept_poll_ms: u64,

    /// Seconds a new connection gets to complete the handshake
    #[arg(long, default_value = "10")]
    handshake_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = RelayConfig {
        accept_poll_interval: Duration::from_millis(args.accept_poll_ms),
        handshake_timeout: Duration::from_secs(args.handshake_timeout_secs),
    };

    let server = RelayServer::with_config(config);
    let bind_addr = format!("{}:{}", args.host, args.port);
    if let Err(e) = server.start(&bind_addr).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
    }

    server.stop().await;
    tracing::info!("Server shutdown complete");
}
