//! Fuzz target for `u2fkey_proto::packet::decode`.
//!
//! Feeds arbitrary byte sequences of any length through the packet decoder,
//! which should never panic: short or malformed input must come back as
//! `Err`, never a slice-index panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use u2fkey_proto::packet;

fuzz_target!(|data: &[u8]| {
    let _ = packet::decode(data);
});
