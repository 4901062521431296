//! Chat client for a room-scoped relay server.
//!
//! Joins the given room, or lists rooms and waits for `/join` when none is
//! given. Every line received from the room is shown with an `HH:MM:SS`
//! prefix; typed lines are sent to the room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaychat-client -- --name alice --room lobby
//! cargo run --bin relaychat-client -- -n bob -H 10.0.0.5 -p 9000
//! ```

use clap::Parser;

use relaychat_client::runner::run_client;
use relaychat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaychat-client")]
#[command(about = "Room-scoped TCP chat client", long_about = None)]
struct Args {
    /// Display name shown to other members of the room
    #[arg(short = 'n', long)]
    name: String,

    /// Room to join on startup; omit to pick one from the list
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value = "9000")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();
    let server_addr = format!("{}:{}", args.host, args.port);

    if let Err(e) = run_client(server_addr, args.name, args.room).await {
        tracing::error!("Client error: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
