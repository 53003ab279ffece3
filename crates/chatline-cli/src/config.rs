//! Command-line configuration.

use std::time::Duration;

use chatline_core::{DEFAULT_ENDPOINT, ReconnectPolicy, SessionConfig};
use clap::Parser;

use crate::error::CliError;

/// Chatline terminal client
#[derive(Parser, Debug, Clone)]
#[command(name = "chatline")]
#[command(about = "Terminal client for a WebSocket chat server")]
#[command(version)]
pub struct Args {
    /// WebSocket endpoint of the chat server
    #[arg(short, long, env = "CHATLINE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Join under this name on startup
    ///
    /// Without it, use `/join <name>` once the client is running.
    #[arg(short, long, env = "CHATLINE_USERNAME")]
    pub username: Option<String>,

    /// Delay before reconnecting after the connection drops, in milliseconds
    #[arg(long, env = "CHATLINE_RECONNECT_DELAY_MS", default_value_t = 3000)]
    pub reconnect_delay_ms: u64,

    /// Double the reconnect delay after each failed attempt, up to this cap
    /// (milliseconds)
    #[arg(long, env = "CHATLINE_MAX_BACKOFF_MS")]
    pub max_backoff_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Build the session configuration.
    pub fn session_config(&self) -> Result<SessionConfig, CliError> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(CliError::InvalidEndpoint(self.endpoint.clone()));
        }

        let delay = Duration::from_millis(self.reconnect_delay_ms);
        let reconnect = match self.max_backoff_ms {
            None => ReconnectPolicy::Fixed(delay),
            Some(max_ms) if max_ms < self.reconnect_delay_ms => {
                return Err(CliError::InvalidBackoff {
                    delay_ms: self.reconnect_delay_ms,
                    max_ms,
                });
            },
            Some(max_ms) => {
                ReconnectPolicy::Backoff { initial: delay, max: Duration::from_millis(max_ms) }
            },
        };

        Ok(SessionConfig::new(self.endpoint.as_str()).with_reconnect(reconnect))
    }

    /// Username to join with on startup, if any non-blank one was given.
    pub fn startup_username(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chatline_core::DEFAULT_RECONNECT_DELAY;

    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("chatline").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_session_defaults() {
        let args = Args::try_parse_from(["chatline", "--endpoint", DEFAULT_ENDPOINT]).unwrap();
        let config = args.session_config().unwrap();

        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.reconnect, ReconnectPolicy::Fixed(DEFAULT_RECONNECT_DELAY));
    }

    #[test]
    fn fixed_delay_is_configurable() {
        let config = parse(&["-e", "ws://chat:9000/ws", "--reconnect-delay-ms", "250"])
            .session_config()
            .unwrap();

        assert_eq!(config.endpoint, "ws://chat:9000/ws");
        assert_eq!(config.reconnect, ReconnectPolicy::Fixed(Duration::from_millis(250)));
    }

    #[test]
    fn max_backoff_enables_backoff() {
        let config = parse(&["-e", "wss://chat/ws", "--max-backoff-ms", "60000"])
            .session_config()
            .unwrap();

        assert_eq!(config.reconnect, ReconnectPolicy::Backoff {
            initial: Duration::from_secs(3),
            max: Duration::from_secs(60),
        });
    }

    #[test]
    fn backoff_cap_below_delay_is_rejected() {
        let err = parse(&["-e", "ws://chat/ws", "--max-backoff-ms", "100"])
            .session_config()
            .unwrap_err();

        assert!(matches!(err, CliError::InvalidBackoff { delay_ms: 3000, max_ms: 100 }));
    }

    #[test]
    fn non_websocket_endpoint_is_rejected() {
        let err = parse(&["-e", "http://chat/ws"]).session_config().unwrap_err();
        assert!(matches!(err, CliError::InvalidEndpoint(_)));
    }

    #[test]
    fn blank_username_is_ignored() {
        assert_eq!(parse(&["-e", "ws://chat/ws", "-u", "  "]).startup_username(), None);
        assert_eq!(parse(&["-e", "ws://chat/ws", "-u", " bob "]).startup_username(), Some("bob"));
    }
}
