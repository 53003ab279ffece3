//! Frame types and JSON codec.
//!
//! Decoding is two-stage. The envelope is read first so that a frame with an
//! unrecognized `messagetype` can be told apart from a malformed one: the
//! former is [`ProtocolError::UnknownDiscriminant`], the latter
//! [`ProtocolError::Decode`]. Only known kinds are decoded in full.

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ProtocolError, Result};

/// A single protocol frame.
///
/// # Invariants
///
/// - Each variant maps to exactly one `messagetype` value (see
///   [`FrameKind`]).
/// - `encode` emits the discriminant as the first field and never emits a
///   newline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "messagetype")]
pub enum Frame {
    /// A user announces itself. Sent by the client as its handshake, and
    /// relayed by the server to everyone when someone joins.
    #[serde(rename = "newUser")]
    Join {
        /// Name the user joined under.
        username: String,
    },

    /// Chat text. Sent by the client, relayed by the server to everyone.
    #[serde(rename = "broadcastMessage")]
    Broadcast {
        /// Author of the message.
        username: String,
        /// Message text.
        payload: String,
    },

    /// Full roster of connected users, in server order.
    #[serde(rename = "userList")]
    Roster {
        /// Users currently online.
        #[serde(default, deserialize_with = "null_as_empty")]
        users: Vec<RosterUser>,
    },
}

/// One user in a [`Frame::Roster`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterUser {
    /// Display name.
    pub username: String,
    /// Server-side identifier, when the server provides one. Not used as the
    /// client's roster key.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl RosterUser {
    /// Roster user with no server identifier.
    pub fn new(username: impl Into<String>) -> Self {
        Self { username: username.into(), user_id: None }
    }
}

/// Frame discriminant without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `newUser`
    Join,
    /// `broadcastMessage`
    Broadcast,
    /// `userList`
    Roster,
}

impl FrameKind {
    /// All kinds, in wire-table order.
    pub const ALL: [Self; 3] = [Self::Join, Self::Broadcast, Self::Roster];

    /// Wire value of the `messagetype` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "newUser",
            Self::Broadcast => "broadcastMessage",
            Self::Roster => "userList",
        }
    }

    /// Parse a wire discriminant. `None` if unknown.
    pub fn from_discriminant(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Just enough of a frame to classify it.
#[derive(Deserialize)]
struct Envelope {
    messagetype: String,
}

impl Frame {
    /// Handshake / join announcement.
    pub fn join(username: impl Into<String>) -> Self {
        Self::Join { username: username.into() }
    }

    /// Chat message.
    pub fn broadcast(username: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Broadcast { username: username.into(), payload: payload.into() }
    }

    /// Roster snapshot from a list of names.
    pub fn roster<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Roster { users: usernames.into_iter().map(RosterUser::new).collect() }
    }

    /// Discriminant of this frame.
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Join { .. } => FrameKind::Join,
            Self::Broadcast { .. } => FrameKind::Broadcast,
            Self::Roster { .. } => FrameKind::Roster,
        }
    }

    /// Serialize to a single-line JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the text is not a JSON object with a string
    ///   `messagetype`, or a known kind is missing required fields
    /// - `ProtocolError::UnknownDiscriminant` if `messagetype` is not a known
    ///   kind
    pub fn decode(text: &str) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))?;

        if FrameKind::from_discriminant(&envelope.messagetype).is_none() {
            return Err(ProtocolError::UnknownDiscriminant(envelope.messagetype));
        }

        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Servers may send `"users": null` for an empty roster.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<RosterUser>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RosterUser>>::deserialize(deserializer)?.unwrap_or_default())
}
