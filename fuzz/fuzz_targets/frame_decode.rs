//! Fuzz target for Frame::decode
//!
//! Feeds arbitrary text to the inbound classifier to find:
//! - Panics in the two-stage decode (envelope, then body)
//! - Accepted frames that do not survive re-encoding
//!
//! The fuzzer should NEVER panic. Invalid input must return an error.

#![no_main]

use chatline_proto::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(frame) = Frame::decode(text) {
        let encoded = frame.encode().expect("decoded frame must encode");
        let again = Frame::decode(&encoded).expect("encoded frame must decode");
        assert_eq!(again.kind(), frame.kind());
    }
});
