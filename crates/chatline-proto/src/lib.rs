//! Chatline wire protocol.
//!
//! Every frame is a single JSON object carried in one WebSocket text message.
//! The `messagetype` field is the discriminant; the remaining fields depend on
//! the frame kind.
//!
//! | `messagetype`      | Fields                  |
//! |--------------------|-------------------------|
//! | `newUser`          | `username`              |
//! | `broadcastMessage` | `username`, `payload`   |
//! | `userList`         | `users: [{username}]`   |
//!
//! `newUser` and `broadcastMessage` travel in both directions with the same
//! shape. `userList` is only ever sent by the server.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;

pub use errors::{ProtocolError, Result};
pub use frame::{Frame, FrameKind, RosterUser};
