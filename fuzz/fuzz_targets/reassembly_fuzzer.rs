//! Fuzz target for `u2fkey_proto::message::Reassembler`.
//!
//! Splits the fuzz input into 64-byte chunks, decodes each as a packet, and
//! feeds whichever of init/continuation it turns out to be into a single
//! reassembler in sequence — exercising arbitrary interleavings of init and
//! continuation frames (including ones that never form a complete message)
//! without ever panicking.

#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use u2fkey_proto::message::Reassembler;
use u2fkey_proto::packet::{self, PacketView};

fuzz_target!(|data: &[u8]| {
    let mut reassembler: Reassembler<Duration> = Reassembler::new();
    let mut now = Duration::ZERO;

    for chunk in data.chunks(64) {
        if chunk.len() != 64 {
            let _ = reassembler.check_timeout(now);
            continue;
        }
        now += Duration::from_millis(10);
        match packet::decode(chunk) {
            Ok(PacketView::Init { cmd, bcnt, head, .. }) => {
                let _ = reassembler.on_init(cmd, bcnt, head, now);
            },
            Ok(PacketView::Cont { seq, tail, .. }) => {
                let _ = reassembler.on_cont(seq, tail, now);
            },
            Err(_) => {},
        }
        let _ = reassembler.check_timeout(now);
    }
});
