//! Scenario 2: a 200-byte `U2FHID_PING` round-trips unchanged across an
//! init frame plus three continuation frames.

use u2fkey_client::RelyingPartyClient;
use u2fkey_harness::AuthenticatorHarness;
use u2fkey_proto::constants::{BROADCAST_CID, CMD_INIT, CMD_PING};
use u2fkey_proto::packet::encode_init;

#[test]
fn ping_payload_reassembles_across_continuation_frames() {
    let harness = AuthenticatorHarness::spawn(2);

    let init_request = encode_init(BROADCAST_CID, CMD_INIT, 8, &[0u8; 8]);
    harness.send(init_request);
    let init_reply = harness.recv().expect("init reply");

    let mut rp = RelyingPartyClient::new();
    rp.feed(&init_reply).expect("decode init reply");
    assert!(rp.cid().is_some());

    let payload = vec![0xABu8; 200];
    let frames = rp.build_ping(&payload).expect("channel allocated");
    assert_eq!(frames.len(), 4, "57 + 59 + 59 + 25 bytes across four frames");
    for frame in &frames {
        harness.send(*frame);
    }

    let mut assembled = None;
    for _ in 0..frames.len() {
        let reply = harness.recv().expect("ping response frame");
        assembled = rp.feed(&reply).expect("reassemble response");
    }
    let (cmd, reassembled) = assembled.expect("response completed on the last frame");
    assert_eq!(cmd, CMD_PING);
    assert_eq!(reassembled, payload);

    harness.shutdown();
}
