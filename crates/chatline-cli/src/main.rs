//! Chatline terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Join immediately
//! chatline --endpoint ws://localhost:8080/ws --username alice
//!
//! # Pick a name interactively with /join <name>
//! CHATLINE_ENDPOINT=wss://chat.example/ws chatline
//! ```

use chatline_cli::{Args, session};
use chatline_client::WsConnector;
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = args.session_config()?;
    tracing::info!(endpoint = %config.endpoint, "chatline starting");

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    session::run(config, WsConnector::new(), args.startup_username(), input, &mut out).await?;

    Ok(())
}
