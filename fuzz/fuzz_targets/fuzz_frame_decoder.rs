//! Fuzz target: `FrameDecoder::push`
//!
//! The first byte picks the checksum mode, the rest is split into
//! (byte, gap) pairs so the inter-byte timeout gets exercised too. The
//! decoder must never panic and never yield a payload longer than the
//! frame limit. Whatever it yields must re-encode to a frame of the same
//! length.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use wallgate::config::ChecksumMode;
use wallgate::serial::{FrameDecoder, MAX_FRAME_LEN, MAX_PAYLOAD, encode_frame};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let mode = if selector & 1 == 0 { ChecksumMode::DataOnly } else { ChecksumMode::WithType };
    let mut decoder = FrameDecoder::new(mode, 1000);
    let mut now = 0u32;
    let mut out = [0u8; MAX_FRAME_LEN];

    for pair in rest.chunks(2) {
        let byte = pair[0];
        let gap = pair.get(1).copied().unwrap_or(0);
        // Scale so a single gap can cross the timeout.
        now = now.wrapping_add(u32::from(gap) * 8);
        if let Some(Ok(frame)) = decoder.push(byte, now) {
            assert!(frame.data.len() <= MAX_PAYLOAD, "payload exceeds MAX_PAYLOAD");
            let len = encode_frame(frame.msg_type, frame.data, mode, &mut out)
                .expect("decoded frame re-encodes");
            assert_eq!(len, frame.data.len() + 5);
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert!(!decoder.in_frame());
    for &b in rest {
        let _ = decoder.push(b, now);
    }
});
