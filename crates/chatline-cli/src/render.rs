//! Snapshot rendering.
//!
//! The runtime publishes whole snapshots; [`Renderer`] diffs consecutive ones
//! into the lines a terminal should print.

use chatline_client::{Message, MessageKind, RosterEntry, SessionState, Snapshot};

/// Format one timeline entry.
pub fn message_line<T>(message: &Message<T>) -> String {
    match message.kind {
        MessageKind::User => format!("{}: {}", message.author, message.body),
        MessageKind::System => format!("* {}", message.body),
    }
}

/// Format the roster for `/users`.
pub fn roster_line(roster: &[RosterEntry]) -> String {
    if roster.is_empty() {
        return "* nobody online".to_string();
    }

    let names: Vec<&str> = roster.iter().map(|entry| entry.username.as_str()).collect();
    format!("* online ({}): {}", names.len(), names.join(", "))
}

/// Tracks what has already been printed.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Snapshot,
}

impl Renderer {
    /// Renderer that has printed nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for the transition to `next`.
    pub fn update(&mut self, next: Snapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(line) = status_line(&self.last, &next) {
            lines.push(line);
        }

        // Message ids only grow, and a disconnect empties the log.
        let seen = self.last.messages.last().map(|m| m.id);
        lines.extend(
            next.messages
                .iter()
                .filter(|m| seen.is_none_or(|seen| m.id > seen))
                .map(message_line),
        );

        self.last = next;
        lines
    }
}

fn status_line(prev: &Snapshot, next: &Snapshot) -> Option<String> {
    if next.connected && !prev.connected {
        let name = next.identity.as_deref().unwrap_or("?");
        return Some(format!("* connected as {name}"));
    }

    match (prev.state, next.state) {
        (a, b) if a == b => None,
        (_, SessionState::Reconnecting) => Some("* connection lost, reconnecting".to_string()),
        (_, SessionState::Idle) => Some("* disconnected".to_string()),
        (SessionState::Idle, SessionState::Connecting) => Some("* connecting".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use chatline_core::{MessageId, UserId};

    use super::*;

    fn user(id: u64, author: &str, body: &str) -> Message<SystemTime> {
        Message {
            id: MessageId(id),
            author: author.to_string(),
            body: body.to_string(),
            received_at: SystemTime::UNIX_EPOCH,
            kind: MessageKind::User,
        }
    }

    fn notice(id: u64, body: &str) -> Message<SystemTime> {
        Message { kind: MessageKind::System, author: "System".to_string(), ..user(id, "", body) }
    }

    fn joined(messages: Vec<Message<SystemTime>>) -> Snapshot {
        Snapshot {
            state: SessionState::Joined,
            identity: Some("alice".to_string()),
            connected: true,
            messages,
            roster: Vec::new(),
        }
    }

    #[test]
    fn formats_messages() {
        assert_eq!(message_line(&user(0, "bob", "hi")), "bob: hi");
        assert_eq!(message_line(&notice(1, "carol joined the chat")), "* carol joined the chat");
    }

    #[test]
    fn formats_roster() {
        let roster = vec![
            RosterEntry { user_id: UserId(0), username: "alice".to_string() },
            RosterEntry { user_id: UserId(1), username: "bob".to_string() },
        ];

        insta::assert_snapshot!(roster_line(&roster), @"* online (2): alice, bob");
        insta::assert_snapshot!(roster_line(&[]), @"* nobody online");
    }

    #[test]
    fn prints_each_message_once() {
        let mut renderer = Renderer::new();

        let first = renderer.update(joined(vec![user(0, "bob", "one")]));
        assert_eq!(first, ["* connected as alice", "bob: one"]);

        let second =
            renderer.update(joined(vec![user(0, "bob", "one"), notice(1, "dave joined the chat")]));
        assert_eq!(second, ["* dave joined the chat"]);

        assert!(renderer.update(joined(vec![user(0, "bob", "one")])).is_empty());
    }

    #[test]
    fn reports_connectivity_changes() {
        let mut renderer = Renderer::new();
        renderer.update(joined(Vec::new()));

        let lost = Snapshot {
            state: SessionState::Reconnecting,
            connected: false,
            ..joined(Vec::new())
        };
        assert_eq!(renderer.update(lost), ["* connection lost, reconnecting"]);
        assert_eq!(renderer.update(joined(Vec::new())), ["* connected as alice"]);
        assert_eq!(renderer.update(Snapshot::default()), ["* disconnected"]);
    }

    #[test]
    fn messages_after_disconnect_are_new() {
        let mut renderer = Renderer::new();
        renderer.update(joined(vec![user(0, "bob", "old")]));
        renderer.update(Snapshot::default());

        let lines = renderer.update(joined(vec![user(1, "bob", "fresh")]));
        assert_eq!(lines, ["* connected as alice", "bob: fresh"]);
    }
}
