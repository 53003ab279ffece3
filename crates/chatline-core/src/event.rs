//! Manager events and actions.

use std::{fmt, time::Duration};

/// Tag for one transport instance.
///
/// Every `OpenTransport` action mints a fresh tag. Events carrying a tag other
/// than the live socket's come from a superseded transport and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    /// Wrap a raw tag.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw tag value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag for one armed reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw tag.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw tag value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events the caller feeds into the manager.
///
/// The caller is responsible for:
/// - Reporting transport lifecycle (open, text frames, errors, close)
/// - Firing reconnect timers it was asked to arm
///
/// Generic over `T`, the receipt timestamp stored on each message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent<T> {
    /// Transport finished opening.
    TransportOpened {
        /// Socket that opened.
        socket: SocketId,
    },

    /// Text frame arrived.
    FrameReceived {
        /// Socket the frame arrived on.
        socket: SocketId,
        /// Raw frame text.
        text: String,
        /// Client-observed receipt time.
        now: T,
    },

    /// Transport reported an error. Does not by itself change state; a
    /// `TransportClosed` is expected to follow if the socket is gone.
    TransportError {
        /// Socket that errored.
        socket: SocketId,
        /// Error description.
        reason: String,
    },

    /// Transport closed, or failed to open.
    TransportClosed {
        /// Socket that closed.
        socket: SocketId,
    },

    /// A reconnect timer armed via [`SessionAction::ArmReconnectTimer`]
    /// elapsed.
    ReconnectTimerFired {
        /// Timer that fired.
        timer: TimerId,
    },
}

/// Actions the manager produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a new transport to `endpoint`, tagged `socket`.
    OpenTransport {
        /// Tag for the new transport.
        socket: SocketId,
        /// Address to connect to.
        endpoint: String,
    },

    /// Write a text frame to the transport.
    SendText {
        /// Target socket.
        socket: SocketId,
        /// Encoded frame.
        text: String,
    },

    /// Close the transport. Later events from it must not be reported, or
    /// will be ignored if they are.
    CloseTransport {
        /// Socket to close.
        socket: SocketId,
    },

    /// Fire [`SessionEvent::ReconnectTimerFired`] after `delay`.
    ArmReconnectTimer {
        /// Tag for the timer.
        timer: TimerId,
        /// How long to wait.
        delay: Duration,
    },

    /// Drop a previously armed timer without firing it.
    CancelReconnectTimer {
        /// Timer to cancel.
        timer: TimerId,
    },
}
