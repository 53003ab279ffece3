//! Chatline core
//!
//! The connection manager for a single chat session: socket lifecycle,
//! reconnect policy, inbound frame classification, and the view state derived
//! from it (message log, roster, connectivity).
//!
//! # Architecture
//!
//! The manager is Sans-IO. It never touches a socket or a clock. Callers feed
//! it [`SessionEvent`]s and user intents (`connect`, `send`, `disconnect`) and
//! execute the [`SessionAction`]s it returns. Time enters only as the receipt
//! timestamp carried by [`SessionEvent::FrameReceived`], which keeps every
//! transition deterministic and testable without a runtime.
//!
//! # Components
//!
//! - [`ConnectionManager`]: the session state machine
//! - [`SessionConfig`] / [`ReconnectPolicy`]: injected configuration
//! - [`SessionEvent`] / [`SessionAction`]: inputs and outputs
//! - [`Message`], [`RosterEntry`], [`Roster`], [`SessionSnapshot`]: view state

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod manager;
mod state;

pub use chatline_proto::{Frame, FrameKind, ProtocolError};
pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_RECONNECT_DELAY, ReconnectPolicy, SessionConfig,
};
pub use error::SessionError;
pub use event::{SessionAction, SessionEvent, SocketId, TimerId};
pub use manager::{ConnectionManager, SessionState};
pub use state::{
    Message, MessageId, MessageKind, Roster, RosterEntry, SYSTEM_AUTHOR, SessionSnapshot, UserId,
};
