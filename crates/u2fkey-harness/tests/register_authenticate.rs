//! Scenario 5: REGISTER mints a credential whose key handle AUTHENTICATE
//! later accepts, producing a signature that verifies under the public key
//! REGISTER returned and a strictly increasing counter.

use ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use u2fkey_client::RelyingPartyClient;
use u2fkey_harness::{ATTESTATION_CERT, AuthenticatorHarness};
use u2fkey_proto::constants::{
    BROADCAST_CID, CMD_INIT, CMD_MSG, SW_NO_ERROR, U2F_AUTH_ENFORCE, U2F_AUTHENTICATE,
    U2F_REGISTER,
};
use u2fkey_proto::packet::encode_init;

fn apdu(ins: u8, p1: u8, data: &[u8]) -> Vec<u8> {
    let mut raw = vec![0x00, ins, p1, 0x00];
    let lc = data.len();
    raw.push((lc >> 16) as u8);
    raw.push((lc >> 8) as u8);
    raw.push(lc as u8);
    raw.extend_from_slice(data);
    raw
}

struct RegisterResponse {
    pubkey: [u8; 65],
    key_handle: Vec<u8>,
}

fn parse_register_response(payload: &[u8]) -> RegisterResponse {
    assert_eq!(payload[0], 0x05, "reserved register byte");
    let mut pubkey = [0u8; 65];
    pubkey.copy_from_slice(&payload[1..66]);
    let key_handle_size = payload[66] as usize;
    let key_handle = payload[67..67 + key_handle_size].to_vec();
    RegisterResponse { pubkey, key_handle }
}

fn send_msg_and_collect(
    harness: &AuthenticatorHarness,
    rp: &mut RelyingPartyClient,
    apdu_bytes: &[u8],
) -> Vec<u8> {
    for frame in rp.build_msg(apdu_bytes).expect("channel allocated") {
        harness.send(frame);
    }
    let mut result = None;
    while result.is_none() {
        let reply = harness.recv().expect("authenticator responds");
        result = rp.feed(&reply).expect("reassemble response");
    }
    let (cmd, payload) = result.expect("loop only exits once populated");
    assert_eq!(cmd, CMD_MSG);
    payload
}

#[test]
fn register_then_authenticate_enforce_verifies_and_increments_the_counter() {
    let harness = AuthenticatorHarness::spawn(5);
    harness.send(encode_init(BROADCAST_CID, CMD_INIT, 8, &[0u8; 8]));
    let init_reply = harness.recv().expect("init reply");
    let mut rp = RelyingPartyClient::new();
    rp.feed(&init_reply).expect("decode init reply");

    let challenge_1 = [0x11u8; 32];
    let app_param_1 = [0x22u8; 32];
    let register_apdu = apdu(U2F_REGISTER, 0x00, &[challenge_1, app_param_1].concat());
    let register_resp = send_msg_and_collect(&harness, &mut rp, &register_apdu);
    assert_eq!(&register_resp[register_resp.len() - 2..], &SW_NO_ERROR.to_be_bytes());

    let reg = parse_register_response(&register_resp);
    let cert_start = 67 + reg.key_handle.len();
    let cert_end = cert_start + ATTESTATION_CERT.len();
    assert_eq!(
        &register_resp[cert_start..cert_end],
        ATTESTATION_CERT,
        "attestation certificate must appear verbatim after the key handle"
    );

    let challenge_2 = [0x33u8; 32];
    let mut auth_data = challenge_2.to_vec();
    auth_data.extend_from_slice(&app_param_1);
    auth_data.push(reg.key_handle.len() as u8);
    auth_data.extend_from_slice(&reg.key_handle);
    let authenticate_apdu = apdu(U2F_AUTHENTICATE, U2F_AUTH_ENFORCE, &auth_data);
    let auth_resp = send_msg_and_collect(&harness, &mut rp, &authenticate_apdu);

    assert_eq!(auth_resp[0], 0x01, "user presence byte");
    let counter = u32::from_be_bytes(auth_resp[1..5].try_into().unwrap());
    assert!(counter > 0, "counter must have advanced from its initial value");

    let sig_len = auth_resp.len() - 5 - 2;
    let signature_der = &auth_resp[5..5 + sig_len];
    let mut signed = app_param_1.to_vec();
    signed.push(0x01);
    signed.extend_from_slice(&auth_resp[1..5]);
    signed.extend_from_slice(&challenge_2);

    let verifying = VerifyingKey::from_sec1_bytes(&reg.pubkey).expect("valid SEC1 point");
    let signature = Signature::from_der(signature_der).expect("valid DER signature");
    assert!(verifying.verify(&signed, &signature).is_ok());
    assert_eq!(&auth_resp[auth_resp.len() - 2..], &SW_NO_ERROR.to_be_bytes());

    harness.shutdown();
}
