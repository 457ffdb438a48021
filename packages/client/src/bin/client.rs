//! Terminal chat client for Hiroba.
//!
//! Lists and creates rooms through the chat service REST API and exchanges
//! live messages over STOMP on WebSocket. Reconnects automatically after the
//! connection is lost. Without `--username` the user saved by the last run is
//! resumed.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --username alice
//! cargo run --bin hiroba-client -- --ws-url ws://chat.example.com/ws --api-url http://chat.example.com/api
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use hiroba_client::{
    infrastructure::http::DEFAULT_API_URL,
    session::DEFAULT_WS_URL,
    ui::{ClientOptions, run_client},
    usecase::DEFAULT_HISTORY_LIMIT,
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "Group chat client over STOMP/WebSocket", long_about = None)]
struct Args {
    /// Log in as this user (otherwise the saved user is resumed)
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// STOMP over WebSocket endpoint
    #[arg(long, default_value = DEFAULT_WS_URL)]
    ws_url: String,

    /// Chat service REST API base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// File holding the last-used username
    #[arg(long, default_value = ".hiroba-user")]
    state_file: PathBuf,

    /// Delay between reconnection attempts (milliseconds)
    #[arg(long, default_value_t = 5000)]
    reconnect_delay_ms: u64,

    /// Heart-beat period in both directions, 0 disables (milliseconds)
    #[arg(long, default_value_t = 4000)]
    heartbeat_ms: u64,

    /// Number of recent messages shown when a room is opened
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let options = ClientOptions {
        ws_url: args.ws_url,
        api_url: args.api_url,
        state_file: args.state_file,
        username: args.username,
        reconnect_delay: Duration::from_millis(args.reconnect_delay_ms),
        heartbeat: Duration::from_millis(args.heartbeat_ms),
        history_limit: args.history_limit,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
