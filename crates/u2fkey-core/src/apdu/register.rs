//! `U2F_REGISTER`: mint a fresh keypair, wrap it into an opaque key handle,
//! and sign the attestation blob over it.

use rand_core::CryptoRngCore;
use u2fkey_crypto::CryptoProvider;
use u2fkey_proto::constants::{SW_NO_ERROR, SW_WRONG_DATA};
use zeroize::Zeroizing;

use super::ApduRequest;
use crate::dispatcher::ApduOutcome;
use crate::provider::{AttestationProvider, WrappingKeyProvider};

const CHALLENGE_LEN: usize = 32;
const APP_PARAM_LEN: usize = 32;
const REGISTER_DATA_LEN: usize = CHALLENGE_LEN + APP_PARAM_LEN;
/// Reserved-for-future-use marker byte the real U2F spec prepends to a
/// REGISTER response's public key field.
const RESERVED_REGISTER_BYTE: u8 = 0x05;
/// Prefix byte of the signed blob, fixed at zero per the U2F raw message
/// format.
const SIGNED_DATA_PREFIX: u8 = 0x00;

/// Handle a `U2F_REGISTER` request.
///
/// # Errors
///
/// Never returns an `Err` — a malformed request or a key-handle length that
/// would not fit in one byte both collapse to `SW_WRONG_DATA`, matching
/// `spec.md` §4.5/§7 (APDU faults never cross into the HID error
/// taxonomy).
pub fn handle_register(
    req: &ApduRequest<'_>,
    crypto: &dyn CryptoProvider,
    wrapping_key: &dyn WrappingKeyProvider,
    attestation: &dyn AttestationProvider,
    rng: &mut dyn CryptoRngCore,
) -> ApduOutcome {
    if req.data.len() != REGISTER_DATA_LEN {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    }
    let challenge_param = &req.data[..CHALLENGE_LEN];
    let application_param = &req.data[CHALLENGE_LEN..REGISTER_DATA_LEN];

    let pair = crypto.ec_p256_generate(rng);

    let mut plaintext = Zeroizing::new([0u8; u2fkey_crypto::wrap::PLAINTEXT_LEN]);
    plaintext[..32].copy_from_slice(&pair.private.to_bytes());
    plaintext[32..].copy_from_slice(application_param);

    let key_handle = crypto.aes_wrap(wrapping_key.wrapping_key(), plaintext.as_slice(), rng);
    let Ok(key_handle_size) = u8::try_from(key_handle.len()) else {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    };

    let mut signed = Vec::with_capacity(1 + 32 + 32 + key_handle.len() + 65);
    signed.push(SIGNED_DATA_PREFIX);
    signed.extend_from_slice(application_param);
    signed.extend_from_slice(challenge_param);
    signed.extend_from_slice(&key_handle);
    signed.extend_from_slice(&pair.public_uncompressed);
    let signature = crypto.ec_p256_sign(attestation.key(), &signed);

    let mut response = Vec::with_capacity(
        1 + 65 + 1 + key_handle.len() + attestation.cert_der().len() + signature.len() + 2,
    );
    response.push(RESERVED_REGISTER_BYTE);
    response.extend_from_slice(&pair.public_uncompressed);
    response.push(key_handle_size);
    response.extend_from_slice(&key_handle);
    response.extend_from_slice(attestation.cert_der());
    response.extend_from_slice(&signature);
    super::push_sw(&mut response, SW_NO_ERROR);

    ApduOutcome::Response(response)
}
