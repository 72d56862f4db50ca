//! Fuzz target for `u2fkey_core::apdu::parse`.
//!
//! Malformed APDUs (truncated headers, extended-length fields overrunning
//! the buffer, bogus instruction bytes) must come back as `None` rather than
//! panicking. Also exercises `ApduRequest::command()` on whatever parses.

#![no_main]

use libfuzzer_sys::fuzz_target;
use u2fkey_core::apdu;

fuzz_target!(|data: &[u8]| {
    if let Some(req) = apdu::parse(data) {
        let _ = req.command();
    }
});
