//! Session configuration.

use std::time::Duration;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// Delay between an unexpected close and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How long to wait before each reconnect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay before every attempt, retried indefinitely.
    Fixed(Duration),

    /// Delay doubles after every failed attempt, capped at `max`. Resets to
    /// `initial` once a handshake is sent.
    Backoff {
        /// Delay before the first attempt.
        initial: Duration,
        /// Upper bound on the delay.
        max: Duration,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    /// Delay before attempt number `attempt` (0-based count of consecutive
    /// failures since the last successful handshake).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Backoff { initial, max } => {
                let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            },
        }
    }
}

/// Configuration for one [`crate::ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Transport endpoint (e.g. `ws://host:port/ws`).
    pub endpoint: String,
    /// Reconnect delay policy.
    pub reconnect: ReconnectPolicy,
}

impl SessionConfig {
    /// Configuration for `endpoint` with the default reconnect policy.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), reconnect: ReconnectPolicy::default() }
    }

    /// Replace the reconnect policy.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}
