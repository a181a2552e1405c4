//! Fuzz target: `Framing::decode_envelope`
//!
//! Drives arbitrary bytes through the envelope decoder in both header
//! layouts and asserts that it never panics, never yields a payload
//! over the cap, and that anything it accepts survives a
//! re-encode/re-decode round trip unchanged.
//!
//! cargo fuzz run fuzz_envelope_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use reach_device::config::{HeaderFormat, MAX_MESSAGE_SIZE, MESSAGE_PAYLOAD_MAX};
use reach_device::wire::Framing;

fuzz_target!(|data: &[u8]| {
    for format in [HeaderFormat::Classic, HeaderFormat::SizePrefixed] {
        let framing = Framing::new(format);
        let Ok((header, payload)) = framing.decode_envelope(data) else {
            continue;
        };
        assert!(data.len() <= MAX_MESSAGE_SIZE, "accepted an over-MTU frame");
        assert!(
            payload.len() <= MESSAGE_PAYLOAD_MAX,
            "payload exceeds the cap"
        );

        // Anything accepted must re-encode within one MTU and decode
        // back to the same parts.
        let mut frame = [0u8; MAX_MESSAGE_SIZE];
        let len = framing
            .encode_envelope(&header, payload, &mut frame)
            .expect("decoded parts must re-encode");
        let (header2, payload2) = framing
            .decode_envelope(&frame[..len])
            .expect("re-encoded frame must decode");
        assert_eq!(header2, header);
        assert_eq!(payload2, payload);
    }
});
