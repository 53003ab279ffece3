//! Observable session state.
//!
//! These are the view-model types presentation layers render from. They are
//! owned by [`crate::ConnectionManager`] and handed out as read-only borrows
//! or as a cloned [`SessionSnapshot`].

use crate::manager::SessionState;

/// Author name used for locally synthesized notices.
pub const SYSTEM_AUTHOR: &str = "System";

/// Locally generated message identifier. Unique for the lifetime of one
/// manager; carries no ordering or time meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

/// Locally generated roster identifier. Unique within the roster at any
/// instant; not stable across a roster replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Origin of a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Chat text relayed from a user.
    User,
    /// Notice synthesized by the client (e.g. "bob joined the chat").
    System,
}

/// One entry in the message timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<T> {
    /// Local identifier.
    pub id: MessageId,
    /// Username, or [`SYSTEM_AUTHOR`] for notices.
    pub author: String,
    /// Text content.
    pub body: String,
    /// Client-observed receipt time.
    pub received_at: T,
    /// User message or system notice.
    pub kind: MessageKind,
}

impl<T> Message<T> {
    /// Returns true for locally synthesized notices.
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }
}

/// One known online user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Local identifier.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
}

/// Users the client believes are online, in server order followed by
/// incremental joins.
///
/// Usernames are unique across incremental adds, but [`Roster::replace`]
/// trusts the server's list verbatim, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nobody is online.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `username` is present (exact match).
    pub fn contains(&self, username: &str) -> bool {
        self.entries.iter().any(|e| e.username == username)
    }

    /// Usernames in display order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.username.as_str())
    }

    /// Append `username` unless already present. Returns true if added.
    pub(crate) fn insert(&mut self, user_id: UserId, username: &str) -> bool {
        if self.contains(username) {
            return false;
        }
        self.entries.push(RosterEntry { user_id, username: username.to_string() });
        true
    }

    /// Replace every entry.
    pub(crate) fn replace(&mut self, entries: Vec<RosterEntry>) {
        self.entries = entries;
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Read-only copy of everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot<T> {
    /// Lifecycle state.
    pub state: SessionState,
    /// Username claimed at connect time. `None` until a join frame is sent.
    pub identity: Option<String>,
    /// True only while the transport is open.
    pub connected: bool,
    /// Timeline in receipt order.
    pub messages: Vec<Message<T>>,
    /// Online users.
    pub roster: Vec<RosterEntry>,
}

impl<T> Default for SessionSnapshot<T> {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            identity: None,
            connected: false,
            messages: Vec::new(),
            roster: Vec::new(),
        }
    }
}
