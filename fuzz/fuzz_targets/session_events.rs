//! Fuzz target for the ConnectionManager state machine
//!
//! # Strategy
//!
//! - Interleave user intents (connect, send, disconnect) with transport
//!   events, timer firings and raw inbound text
//! - Events are tagged either with the live socket/timer or with a stale one
//!
//! # Invariants
//!
//! - `connected` implies `Joined` with an identity
//! - At most one of live socket and pending timer exists
//! - `Idle` after disconnect with an empty log and roster
//! - Message ids strictly increase along the log

#![no_main]

use arbitrary::Arbitrary;
use chatline_core::{
    ConnectionManager, SessionConfig, SessionEvent, SessionState, SocketId, TimerId,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Connect { name: u8 },
    Send { text: String },
    Disconnect,
    Opened { stale: Option<u8> },
    Closed { stale: Option<u8> },
    Error { stale: Option<u8> },
    FireTimer { stale: Option<u8> },
    Receive { text: String, stale: Option<u8> },
}

const NAMES: [&str; 4] = ["alice", "bob", "carol", "dave"];

fuzz_target!(|ops: Vec<Op>| {
    let mut m: ConnectionManager<u32> = ConnectionManager::new(SessionConfig::default());
    let mut clock = 0u32;

    for op in ops {
        let socket =
            |stale: Option<u8>, m: &ConnectionManager<u32>| match (stale, m.live_socket()) {
                (None, Some(live)) => live,
                (stale, _) => SocketId::new(u64::from(stale.unwrap_or(0)) + 10_000),
            };

        match op {
            Op::Connect { name } => {
                let _ = m.connect(NAMES[usize::from(name) % NAMES.len()]);
            },
            Op::Send { text } => {
                let _ = m.send(&text);
            },
            Op::Disconnect => {
                let _ = m.disconnect();
                assert_eq!(m.state(), SessionState::Idle);
                assert!(m.messages().is_empty());
                assert!(m.roster().is_empty());
                assert!(!m.is_connected());
            },
            Op::Opened { stale } => {
                let socket = socket(stale, &m);
                let _ = m.handle(SessionEvent::TransportOpened { socket });
            },
            Op::Closed { stale } => {
                let socket = socket(stale, &m);
                let _ = m.handle(SessionEvent::TransportClosed { socket });
            },
            Op::Error { stale } => {
                let socket = socket(stale, &m);
                let reason = "fuzz".to_string();
                let _ = m.handle(SessionEvent::TransportError { socket, reason });
            },
            Op::FireTimer { stale } => {
                let timer = match (stale, m.pending_timer()) {
                    (None, Some(live)) => live,
                    (stale, _) => TimerId::new(u64::from(stale.unwrap_or(0)) + 10_000),
                };
                let _ = m.handle(SessionEvent::ReconnectTimerFired { timer });
            },
            Op::Receive { text, stale } => {
                clock += 1;
                let socket = socket(stale, &m);
                let _ = m.handle(SessionEvent::FrameReceived { socket, text, now: clock });
            },
        }

        if m.is_connected() {
            assert_eq!(m.state(), SessionState::Joined);
            assert!(m.identity().is_some());
        }
        assert!(!(m.live_socket().is_some() && m.pending_timer().is_some()));
        assert!(m.messages().windows(2).all(|w| w[0].id < w[1].id));
    }
});
