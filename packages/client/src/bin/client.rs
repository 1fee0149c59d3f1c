//! Interactive WebSocket chat client.
//!
//! Connects to a chat server, announces the username with a JOIN message,
//! keeps the connection alive with heartbeats and reconnects automatically
//! after unexpected disconnections.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagu-client -- --name Alice
//! cargo run --bin tsunagu-client -- -n Bob --host chat.example.com --port 443 --secure
//! cargo run --bin tsunagu-client -- -n Carol --integrated --page-host localhost --page-port 3000
//! ```

use std::time::Duration;

use clap::Parser;

use tsunagu_client::{ClientConfig, EndpointConfig, PageLocation, runner::run_client};
use tsunagu_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsunagu-client")]
#[command(about = "WebSocket chat client with heartbeat and automatic reconnection", long_about = None)]
struct Args {
    /// Username announced to the server
    #[arg(short = 'n', long, default_value = "Anonymous")]
    name: String,

    /// Chat server host (standalone mode)
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Chat server port (standalone mode)
    #[arg(short = 'p', long, default_value = "8080")]
    port: Option<u16>,

    /// WebSocket endpoint path
    #[arg(short = 'e', long, default_value = "/ws")]
    endpoint: String,

    /// Use wss:// (the hosting page is served over https)
    #[arg(long)]
    secure: bool,

    /// Connect to the host serving the page instead of --host/--port
    #[arg(long)]
    integrated: bool,

    /// Host of the page (integrated mode)
    #[arg(long, default_value = "localhost")]
    page_host: String,

    /// Port of the page (integrated mode)
    #[arg(long)]
    page_port: Option<u16>,

    /// Heartbeat period in milliseconds
    #[arg(long, default_value = "10000")]
    heartbeat_ms: u64,

    /// Delay before reconnecting after an unexpected disconnect, in milliseconds
    #[arg(long, default_value = "5000")]
    reconnect_ms: u64,

    /// Poll interval while a send waits for the connection, in milliseconds
    #[arg(long, default_value = "200")]
    connection_interval_ms: u64,

    /// Maximum polls while a send waits for the connection
    #[arg(long, default_value = "10")]
    connection_attempts: u32,
}

impl Args {
    fn url(&self) -> String {
        let endpoint = EndpointConfig {
            host: self.host.clone(),
            port: self.port,
            endpoint: self.endpoint.clone(),
            integrated: self.integrated,
        };
        let page = PageLocation {
            secure: self.secure,
            host: self.page_host.clone(),
            port: self.page_port,
        };
        endpoint.resolve_url(&page)
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(self.name.trim())
            .with_heartbeat_period(Duration::from_millis(self.heartbeat_ms))
            .with_reconnect_delay(Duration::from_millis(self.reconnect_ms))
            .with_connection_wait(
                Duration::from_millis(self.connection_interval_ms),
                self.connection_attempts,
            )
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let url = args.url();
    tracing::info!("Resolved chat server URL: {}", url);

    if let Err(e) = run_client(args.config(), url).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
