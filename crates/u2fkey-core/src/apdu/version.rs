//! `U2F_VERSION`: report the raw-message protocol version string.

use u2fkey_proto::constants::SW_NO_ERROR;

use super::ApduRequest;
use crate::dispatcher::ApduOutcome;

/// The raw-message protocol version this authenticator implements.
///
/// Not null-terminated — the six ASCII bytes are the entire response body
/// preceding the status word, per the U2F raw message format.
const VERSION_STRING: &[u8] = b"U2F_V2";

/// Handle a `U2F_VERSION` request.
///
/// The request's data field is ignored: `spec.md` §4.5 does not define any
/// input for this command, and real authenticators accept (and ignore) a
/// stray data field rather than rejecting it.
#[must_use]
pub fn handle_version(_req: &ApduRequest<'_>) -> ApduOutcome {
    let mut response = Vec::with_capacity(VERSION_STRING.len() + 2);
    response.extend_from_slice(VERSION_STRING);
    super::push_sw(&mut response, SW_NO_ERROR);
    ApduOutcome::Response(response)
}
