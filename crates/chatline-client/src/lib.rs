//! Chatline client runtime.
//!
//! Production glue around [`chatline_core::ConnectionManager`]: executes its
//! actions with real I/O (WebSocket transport, Tokio timers) and exposes the
//! session to presentation layers.
//!
//! # Components
//!
//! - [`Runtime`]: single-task event loop that owns the manager
//! - [`ChatHandle`]: cloneable control surface (`connect`, `send`,
//!   `disconnect`) plus a `watch` channel of [`Snapshot`]s
//! - [`Connector`]: transport seam; [`WsConnector`] is the WebSocket
//!   implementation, tests plug in their own

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod runtime;
pub mod transport;

pub use chatline_core::{
    Message, MessageKind, ReconnectPolicy, RosterEntry, SessionConfig, SessionState,
};
pub use error::ClientError;
pub use runtime::{ChatHandle, Runtime, Snapshot};
pub use transport::{Connector, Inbound, Link, RemoteEnd, TransportError, WsConnector};
