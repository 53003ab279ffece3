//! CLI errors.

use std::io;

use chatline_client::ClientError;
use thiserror::Error;

/// Errors that end the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Endpoint is not a WebSocket URL.
    #[error("endpoint must start with ws:// or wss://, got {0:?}")]
    InvalidEndpoint(String),

    /// Backoff cap is below the initial delay.
    #[error("max backoff ({max_ms} ms) is shorter than the reconnect delay ({delay_ms} ms)")]
    InvalidBackoff {
        /// Initial reconnect delay.
        delay_ms: u64,
        /// Configured cap.
        max_ms: u64,
    },

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Client runtime is gone.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}
