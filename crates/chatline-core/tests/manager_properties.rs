//! Property-based tests for the connection manager.
//!
//! Tests verify that the view-state invariants hold under arbitrary sequences
//! of inbound frames, lifecycle events and user intents.

use std::collections::HashSet;

use chatline_core::{
    ConnectionManager, Frame, MessageId, MessageKind, SYSTEM_AUTHOR, SessionAction, SessionConfig,
    SessionEvent, SessionState, SocketId,
};
use proptest::prelude::*;

fn username_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alice", "bob", "carol", "dave"]).prop_map(String::from)
}

/// Inbound frames a server could send.
fn frame_strategy() -> impl Strategy<Value = Frame> {
    prop_oneof![
        2 => username_strategy().prop_map(Frame::join),
        3 => (username_strategy(), "[a-z ]{0,12}").prop_map(|(u, p)| Frame::broadcast(u, p)),
        1 => prop::collection::vec(username_strategy(), 0..5).prop_map(Frame::roster),
    ]
}

/// Operations a runtime or user could perform.
#[derive(Debug, Clone)]
enum Op {
    Connect(String),
    Disconnect,
    Send(String),
    Open,
    Close,
    FireTimer,
    Frame(Frame),
    Garbage(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => username_strategy().prop_map(Op::Connect),
        1 => Just(Op::Disconnect),
        1 => "[a-z]{1,8}".prop_map(Op::Send),
        2 => Just(Op::Open),
        1 => Just(Op::Close),
        1 => Just(Op::FireTimer),
        4 => frame_strategy().prop_map(Op::Frame),
        1 => ".{0,16}".prop_map(Op::Garbage),
    ]
}

fn joined(username: &str) -> (ConnectionManager<u64>, SocketId) {
    let mut m = ConnectionManager::new(SessionConfig::default());
    let actions = m.connect(username);
    let Some(SessionAction::OpenTransport { socket, .. }) = actions.first().cloned() else {
        panic!("connect did not open a transport");
    };
    m.handle(SessionEvent::TransportOpened { socket }).unwrap();
    (m, socket)
}

/// Apply one op, feeding events with the manager's own live tags so the
/// sequence exercises real transitions instead of only stale-event paths.
fn apply(m: &mut ConnectionManager<u64>, op: Op, now: u64) -> Vec<SessionAction> {
    match op {
        Op::Connect(name) => m.connect(&name),
        Op::Disconnect => m.disconnect(),
        Op::Send(text) => m.send(&text).unwrap_or_default(),
        Op::Open => match m.live_socket() {
            Some(socket) => m.handle(SessionEvent::TransportOpened { socket }).unwrap_or_default(),
            None => Vec::new(),
        },
        Op::Close => match m.live_socket() {
            Some(socket) => m.handle(SessionEvent::TransportClosed { socket }).unwrap_or_default(),
            None => Vec::new(),
        },
        Op::FireTimer => match m.pending_timer() {
            Some(timer) => {
                m.handle(SessionEvent::ReconnectTimerFired { timer }).unwrap_or_default()
            },
            None => Vec::new(),
        },
        Op::Frame(frame) => match m.live_socket() {
            Some(socket) => {
                let text = frame.encode().unwrap();
                m.handle(SessionEvent::FrameReceived { socket, text, now }).unwrap_or_default()
            },
            None => Vec::new(),
        },
        Op::Garbage(text) => match m.live_socket() {
            Some(socket) => {
                m.handle(SessionEvent::FrameReceived { socket, text, now }).unwrap_or_default()
            },
            None => Vec::new(),
        },
    }
}

proptest! {
    #[test]
    fn prop_log_follows_arrival_order(frames in prop::collection::vec(frame_strategy(), 0..40)) {
        let (mut m, socket) = joined("alice");

        let mut expected = Vec::new();
        for (now, frame) in frames.into_iter().enumerate() {
            match &frame {
                Frame::Broadcast { username, payload } => {
                    expected.push((username.clone(), payload.clone()));
                },
                Frame::Join { username } => {
                    expected.push((SYSTEM_AUTHOR.to_string(), format!("{username} joined the chat")));
                },
                Frame::Roster { .. } => {},
            }
            let text = frame.encode().unwrap();
            m.handle(SessionEvent::FrameReceived { socket, text, now: now as u64 }).unwrap();
        }

        let actual: Vec<_> =
            m.messages().iter().map(|msg| (msg.author.clone(), msg.body.clone())).collect();
        prop_assert_eq!(actual, expected);

        let times: Vec<u64> = m.messages().iter().map(|msg| msg.received_at).collect();
        prop_assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_roster_snapshot_replaces_everything(
        before in prop::collection::vec(frame_strategy(), 0..20),
        users in prop::collection::vec(username_strategy(), 0..6),
    ) {
        let (mut m, socket) = joined("alice");
        for frame in before {
            let text = frame.encode().unwrap();
            m.handle(SessionEvent::FrameReceived { socket, text, now: 0 }).unwrap();
        }
        let log_len = m.messages().len();

        let text = Frame::roster(users.clone()).encode().unwrap();
        m.handle(SessionEvent::FrameReceived { socket, text, now: 1 }).unwrap();

        let after: Vec<String> = m.roster().usernames().map(String::from).collect();
        prop_assert_eq!(after, users);
        prop_assert_eq!(m.messages().len(), log_len);
    }

    #[test]
    fn prop_join_is_idempotent_for_roster(name in username_strategy(), repeats in 1usize..5) {
        let (mut m, socket) = joined("alice");
        let text = Frame::join(name.clone()).encode().unwrap();

        for _ in 0..repeats {
            m.handle(SessionEvent::FrameReceived { socket, text: text.clone(), now: 0 }).unwrap();
        }

        prop_assert_eq!(m.roster().len(), 1);
        prop_assert_eq!(m.messages().len(), repeats);
        prop_assert!(m.messages().iter().all(|msg| msg.kind == MessageKind::System));
    }

    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut m: ConnectionManager<u64> = ConnectionManager::new(SessionConfig::default());
        let mut previous_ids: HashSet<MessageId> = HashSet::new();
        let mut high_water: Option<MessageId> = None;
        let mut last = (m.revision(), m.snapshot());

        for (now, op) in ops.into_iter().enumerate() {
            let actions = apply(&mut m, op, now as u64);

            // Revision only stands still when the snapshot does.
            let snapshot = m.snapshot();
            prop_assert!(m.revision() >= last.0);
            if m.revision() == last.0 {
                prop_assert_eq!(&snapshot, &last.1);
            }
            last = (m.revision(), snapshot);

            // At most one transport is opened per step.
            let opens = actions
                .iter()
                .filter(|a| matches!(a, SessionAction::OpenTransport { .. }))
                .count();
            prop_assert!(opens <= 1);

            // Connectivity is true exactly while joined.
            prop_assert_eq!(m.is_connected(), m.state() == SessionState::Joined);

            // Joined implies a handshake was sent under the identity.
            if m.state() == SessionState::Joined {
                prop_assert!(m.identity().is_some());
            }

            // Idle means nothing is retained.
            if m.state() == SessionState::Idle {
                prop_assert!(m.identity().is_none());
                prop_assert!(m.messages().is_empty());
                prop_assert!(m.roster().is_empty());
                prop_assert!(m.pending_timer().is_none());
                prop_assert!(m.live_socket().is_none());
            }

            // A timer is pending exactly while reconnecting.
            prop_assert_eq!(m.pending_timer().is_some(), m.state() == SessionState::Reconnecting);

            // Message ids never repeat, even across disconnects: anything not
            // carried over from the previous step is newer than all ids seen.
            for msg in m.messages() {
                if !previous_ids.contains(&msg.id) {
                    prop_assert!(high_water.is_none_or(|max| msg.id > max));
                }
            }
            previous_ids = m.messages().iter().map(|msg| msg.id).collect();
            high_water = m.messages().iter().map(|msg| msg.id).max().max(high_water);

            // Roster ids are unique at every instant.
            let ids: HashSet<_> = m.roster().entries().iter().map(|e| e.user_id).collect();
            prop_assert_eq!(ids.len(), m.roster().len());
        }
    }

    #[test]
    fn prop_disconnect_is_idempotent(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut m: ConnectionManager<u64> = ConnectionManager::new(SessionConfig::default());
        for (now, op) in ops.into_iter().enumerate() {
            apply(&mut m, op, now as u64);
        }

        m.disconnect();
        let snapshot = m.snapshot();
        let revision = m.revision();
        prop_assert!(m.disconnect().is_empty());
        prop_assert_eq!(m.snapshot(), snapshot);
        prop_assert_eq!(m.revision(), revision);
        prop_assert_eq!(m.state(), SessionState::Idle);
    }
}
