//! Scenario 1 from the authenticator's concrete end-to-end test list: an
//! `U2FHID_INIT` handshake on the broadcast channel allocates a new channel
//! and echoes the requesting nonce.

use u2fkey_harness::AuthenticatorHarness;
use u2fkey_proto::constants::{BROADCAST_CID, CMD_INIT, PROTOCOL_VERSION};
use u2fkey_proto::packet::{self, PacketView, encode_init};

#[test]
fn init_handshake_allocates_a_channel_and_echoes_the_nonce() {
    let harness = AuthenticatorHarness::spawn(1);

    let nonce = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
    let request = encode_init(BROADCAST_CID, CMD_INIT, 8, &nonce);
    harness.send(request);

    let reply = harness.recv().expect("authenticator replies to INIT");
    let PacketView::Init { cid, cmd, bcnt, head } = packet::decode(&reply).expect("well-formed frame")
    else {
        panic!("expected an init frame");
    };

    assert_eq!(cid, BROADCAST_CID);
    assert_eq!(cmd, CMD_INIT);
    assert_eq!(bcnt, 17);
    assert_eq!(&head[..8], &nonce, "nonce must be echoed verbatim");

    let new_cid = u32::from_be_bytes(head[8..12].try_into().unwrap());
    assert_ne!(new_cid, 0, "allocated cid must not be the null cid");
    assert_ne!(new_cid, BROADCAST_CID, "allocated cid must not be the broadcast cid");
    assert_eq!(head[12], PROTOCOL_VERSION);

    harness.shutdown();
}
