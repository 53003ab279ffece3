//! Property-based tests for frame encoding and decoding.
//!
//! These verify that the codec never panics on hostile input and that every
//! frame we can build survives the trip through JSON text.

use chatline_proto::{Frame, FrameKind, ProtocolError, RosterUser};
use proptest::prelude::*;

fn roster_user_strategy() -> impl Strategy<Value = RosterUser> {
    (".{0,16}", proptest::option::of(any::<u64>()))
        .prop_map(|(username, user_id)| RosterUser { username, user_id })
}

fn frame_strategy() -> impl Strategy<Value = Frame> {
    prop_oneof![
        ".{0,32}".prop_map(Frame::join),
        (".{0,16}", ".{0,64}").prop_map(|(u, p)| Frame::broadcast(u, p)),
        prop::collection::vec(roster_user_strategy(), 0..8)
            .prop_map(|users| Frame::Roster { users }),
    ]
}

proptest! {
    #[test]
    fn prop_encode_decode_preserves_frame(frame in frame_strategy()) {
        let text = frame.encode().unwrap();
        prop_assert!(!text.contains('\n'));
        prop_assert_eq!(Frame::decode(&text).unwrap(), frame);
    }

    #[test]
    fn prop_decode_never_panics(text in ".{0,256}") {
        let _ = Frame::decode(&text);
    }

    #[test]
    fn prop_unknown_discriminant_is_reported(tag in "[a-zA-Z]{1,20}") {
        prop_assume!(FrameKind::from_discriminant(&tag).is_none());

        let text = format!(r#"{{"messagetype":"{tag}","username":"bob"}}"#);
        prop_assert_eq!(Frame::decode(&text), Err(ProtocolError::UnknownDiscriminant(tag)));
    }
}
