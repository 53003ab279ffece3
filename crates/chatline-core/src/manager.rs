//! Connection manager state machine.
//!
//! Owns the socket lifecycle, the reconnect timer, inbound frame
//! classification, and the view state derived from frames. Uses the action
//! pattern: user intents and transport events go in, [`SessionAction`]s come
//! out for the driver to execute. No I/O happens here.
//!
//! # State Machine
//!
//! ```text
//!            connect          TransportOpened
//! ┌──────┐ ────────> ┌────────────┐ ──────────> ┌────────┐
//! │ Idle │           │ Connecting │             │ Joined │
//! └──────┘           └────────────┘ <──┐        └────────┘
//!    ↑                     │           │             │
//!    │          Closed     │           │ timer       │ Closed
//!    │                     ↓           │             │
//!    │               ┌──────────────┐  │             │
//!    │               │ Reconnecting │ ─┘ <───────────┘
//!    │               └──────────────┘
//!    │
//!    └──────── disconnect (from any state)
//! ```
//!
//! # Late events
//!
//! Every transport and timer gets a fresh tag. Only events carrying the live
//! tag are acted on; anything else belongs to a socket or timer that was
//! already torn down and is ignored, so a slow open that completes after
//! `disconnect` cannot resurrect the session.

use std::{mem, time::SystemTime};

use chatline_proto::Frame;

use crate::{
    config::SessionConfig,
    error::SessionError,
    event::{SessionAction, SessionEvent, SocketId, TimerId},
    state::{
        Message, MessageId, MessageKind, Roster, RosterEntry, SYSTEM_AUTHOR, SessionSnapshot,
        UserId,
    },
};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket, no identity.
    Idle,
    /// Transport opening.
    Connecting,
    /// Handshake sent, transport open.
    Joined,
    /// Transport closed unexpectedly; reconnect timer armed.
    Reconnecting,
}

/// Internal state carrying the live tags.
#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Connecting {
        socket: SocketId,
        /// Name to join under once the transport opens.
        username: String,
    },
    Joined {
        socket: SocketId,
    },
    Reconnecting {
        timer: TimerId,
        /// Name to reconnect under when the timer fires.
        username: String,
    },
}

/// Connection manager for one chat session.
///
/// Pure state machine: no sockets, no clocks, no global state. Several
/// managers can coexist (e.g. in a test harness), each with its own
/// configuration.
///
/// Generic over `T`, the receipt timestamp stored on messages. Production
/// uses wall-clock time; tests can use any `Copy` value.
#[derive(Debug, Clone)]
pub struct ConnectionManager<T = SystemTime> {
    /// Endpoint and reconnect policy
    config: SessionConfig,
    /// Lifecycle state with live socket/timer tags
    phase: Phase,
    /// Username the last join frame was sent under
    identity: Option<String>,
    /// True only while the live transport is open
    connected: bool,
    /// Timeline in receipt order
    messages: Vec<Message<T>>,
    /// Online users
    roster: Roster,
    /// Consecutive closes since the last successful handshake
    failed_attempts: u32,
    /// Bumped on every observable change
    revision: u64,
    next_socket: u64,
    next_timer: u64,
    next_message: u64,
    next_user: u64,
}

impl<T: Copy> ConnectionManager<T> {
    /// Create an idle manager.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            identity: None,
            connected: false,
            messages: Vec::new(),
            roster: Roster::new(),
            failed_attempts: 0,
            revision: 0,
            next_socket: 0,
            next_timer: 0,
            next_message: 0,
            next_user: 0,
        }
    }

    /// Configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Connecting { .. } => SessionState::Connecting,
            Phase::Joined { .. } => SessionState::Joined,
            Phase::Reconnecting { .. } => SessionState::Reconnecting,
        }
    }

    /// Username claimed by the last handshake. `None` if never joined or
    /// after `disconnect`.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// True only while the transport is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Timeline in receipt order.
    pub fn messages(&self) -> &[Message<T>] {
        &self.messages
    }

    /// Online users.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Tag of the socket that is opening or open. `None` otherwise.
    pub fn live_socket(&self) -> Option<SocketId> {
        match self.phase {
            Phase::Connecting { socket, .. } | Phase::Joined { socket } => Some(socket),
            Phase::Idle | Phase::Reconnecting { .. } => None,
        }
    }

    /// Tag of the armed reconnect timer. `None` if no timer is pending.
    pub fn pending_timer(&self) -> Option<TimerId> {
        match self.phase {
            Phase::Reconnecting { timer, .. } => Some(timer),
            _ => None,
        }
    }

    /// Change counter for the view state.
    ///
    /// Increases whenever anything [`Self::snapshot`] reports may have
    /// changed. Equal revisions imply equal snapshots, so observers can skip
    /// rebuilding one.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Read-only copy of the view state.
    pub fn snapshot(&self) -> SessionSnapshot<T> {
        SessionSnapshot {
            state: self.state(),
            identity: self.identity.clone(),
            connected: self.connected,
            messages: self.messages.clone(),
            roster: self.roster.entries().to_vec(),
        }
    }

    /// Start a session as `username`.
    ///
    /// No-op while `Joined`: at most one live socket per session. While
    /// `Connecting`, the in-flight socket is closed and replaced. While
    /// `Reconnecting`, the pending timer is cancelled and the attempt starts
    /// immediately.
    pub fn connect(&mut self, username: &str) -> Vec<SessionAction> {
        let mut actions = Vec::new();

        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Joined { socket } => {
                tracing::debug!(%socket, "connect ignored: transport already open");
                self.phase = Phase::Joined { socket };
                return actions;
            },
            Phase::Connecting { socket, .. } => {
                tracing::debug!(%socket, "superseding in-flight connection attempt");
                actions.push(SessionAction::CloseTransport { socket });
            },
            Phase::Reconnecting { timer, .. } => {
                actions.push(SessionAction::CancelReconnectTimer { timer });
            },
            Phase::Idle => {},
        }

        let socket = self.mint_socket();
        tracing::info!(%socket, endpoint = %self.config.endpoint, %username, "opening transport");

        actions.push(SessionAction::OpenTransport {
            socket,
            endpoint: self.config.endpoint.clone(),
        });
        self.phase = Phase::Connecting { socket, username: username.to_string() };
        self.touch();

        actions
    }

    /// Send chat text as the current identity.
    ///
    /// The caller trims and validates `text`; it is sent as-is.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotConnected` if the transport is not open or no
    ///   identity is set. Nothing is written.
    /// - `SessionError::Encode` if the frame cannot be serialized
    pub fn send(&mut self, text: &str) -> Result<Vec<SessionAction>, SessionError> {
        let (Phase::Joined { socket }, Some(identity)) = (&self.phase, &self.identity) else {
            return Err(SessionError::NotConnected);
        };
        if !self.connected {
            return Err(SessionError::NotConnected);
        }

        let text = Frame::broadcast(identity.as_str(), text).encode()?;
        Ok(vec![SessionAction::SendText { socket: *socket, text }])
    }

    /// End the session.
    ///
    /// Cancels any pending timer, closes any socket, and clears identity,
    /// connectivity, message log and roster. Idempotent.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        let actions = match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Vec::new(),
            Phase::Connecting { socket, .. } | Phase::Joined { socket } => {
                vec![SessionAction::CloseTransport { socket }]
            },
            Phase::Reconnecting { timer, .. } => {
                vec![SessionAction::CancelReconnectTimer { timer }]
            },
        };

        if !actions.is_empty() {
            tracing::info!(identity = ?self.identity, "disconnected");
            self.touch();
        }

        self.connected = false;
        self.identity = None;
        self.messages.clear();
        self.roster.clear();
        self.failed_attempts = 0;

        actions
    }

    /// Process a transport or timer event.
    ///
    /// Events tagged with a socket or timer that is no longer live are
    /// ignored.
    ///
    /// # Errors
    ///
    /// All errors are reports; state is unchanged when one is returned.
    ///
    /// - `SessionError::Decode` if a frame is malformed
    /// - `SessionError::UnknownDiscriminant` if a frame has an unknown type
    /// - `SessionError::Transport` if the live transport reported an error
    /// - `SessionError::Encode` if the handshake cannot be serialized
    pub fn handle(&mut self, event: SessionEvent<T>) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::TransportOpened { socket } => self.handle_open(socket),
            SessionEvent::FrameReceived { socket, text, now } => {
                self.handle_frame(socket, &text, now)?;
                Ok(Vec::new())
            },
            SessionEvent::TransportError { socket, reason } => {
                if self.live_socket() == Some(socket) {
                    Err(SessionError::Transport { socket, reason })
                } else {
                    tracing::debug!(%socket, %reason, "ignoring error from stale socket");
                    Ok(Vec::new())
                }
            },
            SessionEvent::TransportClosed { socket } => Ok(self.handle_close(socket)),
            SessionEvent::ReconnectTimerFired { timer } => Ok(self.handle_timer(timer)),
        }
    }

    /// Transport open: send the handshake and adopt the identity.
    fn handle_open(&mut self, socket: SocketId) -> Result<Vec<SessionAction>, SessionError> {
        let username = match &self.phase {
            Phase::Connecting { socket: live, username } if *live == socket => username.clone(),
            _ => {
                tracing::debug!(%socket, "ignoring open from stale socket");
                return Ok(Vec::new());
            },
        };

        let text = Frame::join(username.as_str()).encode()?;

        tracing::info!(%socket, %username, "transport open, joining");
        self.connected = true;
        self.identity = Some(username);
        self.phase = Phase::Joined { socket };
        self.failed_attempts = 0;
        self.touch();

        Ok(vec![SessionAction::SendText { socket, text }])
    }

    /// Unexpected close (or failed open): schedule one reconnect attempt.
    fn handle_close(&mut self, socket: SocketId) -> Vec<SessionAction> {
        let username = match &self.phase {
            Phase::Connecting { socket: live, username } if *live == socket => {
                Some(username.clone())
            },
            Phase::Joined { socket: live } if *live == socket => self.identity.clone(),
            _ => {
                tracing::debug!(%socket, "ignoring close from stale socket");
                return Vec::new();
            },
        };

        self.connected = false;
        self.touch();

        let Some(username) = username else {
            self.phase = Phase::Idle;
            return Vec::new();
        };

        let timer = self.mint_timer();
        let delay = self.config.reconnect.delay(self.failed_attempts);
        self.failed_attempts = self.failed_attempts.saturating_add(1);

        tracing::info!(%socket, %timer, ?delay, "transport closed, reconnect scheduled");
        self.phase = Phase::Reconnecting { timer, username };

        vec![SessionAction::ArmReconnectTimer { timer, delay }]
    }

    /// Reconnect timer elapsed: try again under the retained name.
    ///
    /// The name is the one requested by `connect`, not `identity`. A first
    /// attempt that never reached the handshake has no identity yet and is
    /// still retried; only `disconnect` ends the retry loop.
    fn handle_timer(&mut self, timer: TimerId) -> Vec<SessionAction> {
        let username = match &self.phase {
            Phase::Reconnecting { timer: armed, username } if *armed == timer => username.clone(),
            _ => {
                tracing::debug!(%timer, "ignoring stale reconnect timer");
                return Vec::new();
            },
        };

        // The fired timer needs no cancel action.
        self.phase = Phase::Idle;
        self.connect(&username)
    }

    /// Classify an inbound frame and fold it into the view state.
    fn handle_frame(&mut self, socket: SocketId, text: &str, now: T) -> Result<(), SessionError> {
        match self.phase {
            Phase::Joined { socket: live } if live == socket => {},
            _ => {
                tracing::debug!(%socket, "ignoring frame from stale socket");
                return Ok(());
            },
        }

        match Frame::decode(text)? {
            Frame::Roster { users } => {
                let entries: Vec<RosterEntry> = users
                    .into_iter()
                    .map(|user| RosterEntry { user_id: self.mint_user(), username: user.username })
                    .collect();
                tracing::debug!(count = entries.len(), "roster replaced");
                self.roster.replace(entries);
            },
            Frame::Join { username } => {
                let user_id = self.mint_user();
                if !self.roster.insert(user_id, &username) {
                    tracing::debug!(%username, "join for user already in roster");
                }
                let body = format!("{username} joined the chat");
                self.push_message(SYSTEM_AUTHOR.to_string(), body, now, MessageKind::System);
            },
            Frame::Broadcast { username, payload } => {
                self.push_message(username, payload, now, MessageKind::User);
            },
        }
        self.touch();

        Ok(())
    }

    fn push_message(&mut self, author: String, body: String, received_at: T, kind: MessageKind) {
        self.next_message += 1;
        let id = MessageId(self.next_message);
        self.messages.push(Message { id, author, body, received_at, kind });
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn mint_socket(&mut self) -> SocketId {
        self.next_socket += 1;
        SocketId::new(self.next_socket)
    }

    fn mint_timer(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId::new(self.next_timer)
    }

    fn mint_user(&mut self) -> UserId {
        self.next_user += 1;
        UserId(self.next_user)
    }
}
