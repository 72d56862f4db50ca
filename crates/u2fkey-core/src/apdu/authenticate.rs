//! `U2F_AUTHENTICATE`: unwrap a key handle, verify it belongs to the
//! requesting application, and (except in CHECK mode) sign an assertion.
//!
//! Resolves both Open Questions from `spec.md` §9 that concern this
//! command: (a) CHECK and ENFORCE share one APDU-declared key-handle size
//! rather than two subtly different fields; (b) `NO_ENFORCE` behaves
//! exactly like ENFORCE with `presence = 0`, not a dropped response.

use rand_core::CryptoRngCore;
use u2fkey_crypto::CryptoProvider;
use u2fkey_proto::constants::{SW_CONDITIONS_NOT_SATISFIED, SW_NO_ERROR, SW_WRONG_DATA};

use super::{ApduRequest, AuthMode};
use crate::dispatcher::ApduOutcome;
use crate::error::ProviderError;
use crate::provider::{CounterProvider, PresenceCheck, WrappingKeyProvider};

const CHALLENGE_LEN: usize = 32;
const APP_PARAM_LEN: usize = 32;
const SIZE_FIELD_LEN: usize = 1;
const HEADER_LEN: usize = CHALLENGE_LEN + APP_PARAM_LEN + SIZE_FIELD_LEN;
/// Byte that marks a signed assertion as backed by observed user presence.
const PRESENCE_OBSERVED: u8 = 0x01;
/// Byte used when the caller did not require (or this mode never checks)
/// user presence.
const PRESENCE_NOT_REQUIRED: u8 = 0x00;

/// Handle a `U2F_AUTHENTICATE` request.
///
/// # Errors
///
/// Never returns an `Err` for APDU-level faults (malformed data, app-param
/// mismatch, a key handle this authenticator never minted) — all of those
/// collapse into `SW_WRONG_DATA` or `SW_CONDITIONS_NOT_SATISFIED` per
/// `spec.md` §4.5. [`ApduOutcome::Fatal`] is reserved for the counter
/// provider's persistence failure, which the driver must treat as a
/// process-terminating condition (`spec.md` §7).
pub fn handle_authenticate(
    req: &ApduRequest<'_>,
    mode: AuthMode,
    crypto: &dyn CryptoProvider,
    wrapping_key: &dyn WrappingKeyProvider,
    counter: &dyn CounterProvider,
    presence: &dyn PresenceCheck,
    _rng: &mut dyn CryptoRngCore,
) -> ApduOutcome {
    if req.data.len() < HEADER_LEN {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    }
    let challenge_param = &req.data[..CHALLENGE_LEN];
    let application_param = &req.data[CHALLENGE_LEN..CHALLENGE_LEN + APP_PARAM_LEN];
    let key_handle_size = usize::from(req.data[CHALLENGE_LEN + APP_PARAM_LEN]);
    if req.data.len() != HEADER_LEN + key_handle_size {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    }
    let key_handle = &req.data[HEADER_LEN..];

    let Ok(plaintext) = crypto.aes_unwrap(wrapping_key.wrapping_key(), key_handle) else {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    };
    if plaintext.len() != u2fkey_crypto::wrap::PLAINTEXT_LEN {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    }
    let (scalar, stored_app_param) = plaintext.split_at(32);
    if stored_app_param != application_param {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    }

    match mode {
        AuthMode::Check => ApduOutcome::Response(super::sw_only(SW_CONDITIONS_NOT_SATISFIED)),
        AuthMode::Enforce | AuthMode::NoEnforce => {
            sign_assertion(mode, scalar, application_param, challenge_param, crypto, counter, presence)
        },
        AuthMode::Unknown(_) => ApduOutcome::Response(super::sw_only(SW_WRONG_DATA)),
    }
}

fn sign_assertion(
    mode: AuthMode,
    scalar: &[u8],
    application_param: &[u8],
    challenge_param: &[u8],
    crypto: &dyn CryptoProvider,
    counter: &dyn CounterProvider,
    presence: &dyn PresenceCheck,
) -> ApduOutcome {
    let require_presence = matches!(mode, AuthMode::Enforce);
    if require_presence && !presence.is_present() {
        return ApduOutcome::Response(super::sw_only(SW_CONDITIONS_NOT_SATISFIED));
    }
    let presence_byte = if require_presence { PRESENCE_OBSERVED } else { PRESENCE_NOT_REQUIRED };

    let counter_value = match counter.next() {
        Ok(value) => value,
        Err(ProviderError::PersistenceFailed(reason)) => {
            return ApduOutcome::Fatal(format!("counter persistence failed: {reason}"));
        },
    };

    let Ok(key) = crypto.ec_p256_import(scalar) else {
        return ApduOutcome::Response(super::sw_only(SW_WRONG_DATA));
    };

    let mut signed = Vec::with_capacity(32 + 1 + 4 + 32);
    signed.extend_from_slice(application_param);
    signed.push(presence_byte);
    signed.extend_from_slice(&counter_value.to_be_bytes());
    signed.extend_from_slice(challenge_param);
    let signature = crypto.ec_p256_sign(&key, &signed);

    let mut response = Vec::with_capacity(1 + 4 + signature.len() + 2);
    response.push(presence_byte);
    response.extend_from_slice(&counter_value.to_be_bytes());
    response.extend_from_slice(&signature);
    super::push_sw(&mut response, SW_NO_ERROR);

    ApduOutcome::Response(response)
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use u2fkey_crypto::DefaultCryptoProvider;

    use super::*;
    use crate::apdu::parse;
    use crate::provider::AlwaysPresent;

    struct FixedCounter(std::sync::atomic::AtomicU32);

    impl CounterProvider for FixedCounter {
        fn next(&self) -> Result<u32, ProviderError> {
            Ok(self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1)
        }
    }

    struct FailingCounter;

    impl CounterProvider for FailingCounter {
        fn next(&self) -> Result<u32, ProviderError> {
            Err(ProviderError::PersistenceFailed("disk full".to_string()))
        }
    }

    struct FixedWrappingKey([u8; 32]);

    impl WrappingKeyProvider for FixedWrappingKey {
        fn wrapping_key(&self) -> &[u8; 32] {
            &self.0
        }
    }

    fn authenticate_request(p1: u8, data: Vec<u8>) -> Vec<u8> {
        let mut raw = vec![0x00, u2fkey_proto::constants::U2F_AUTHENTICATE, p1, 0x00];
        let lc = data.len();
        raw.push((lc >> 16) as u8);
        raw.push((lc >> 8) as u8);
        raw.push(lc as u8);
        raw.extend_from_slice(&data);
        raw
    }

    fn mint_key_handle(
        crypto: &DefaultCryptoProvider,
        wrapping_key: &FixedWrappingKey,
        app_param: [u8; 32],
        rng: &mut ChaCha20Rng,
    ) -> Vec<u8> {
        let pair = crypto.ec_p256_generate(rng);
        let mut plaintext = [0u8; 64];
        plaintext[..32].copy_from_slice(&pair.private.to_bytes());
        plaintext[32..].copy_from_slice(&app_param);
        crypto.aes_wrap(wrapping_key.wrapping_key(), &plaintext, rng)
    }

    #[test]
    fn enforce_signs_and_increments_counter() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let wrapping_key = FixedWrappingKey([3u8; 32]);
        let crypto = DefaultCryptoProvider;
        let app_param = [9u8; 32];
        let key_handle = mint_key_handle(&crypto, &wrapping_key, app_param, &mut rng);

        let mut data = vec![1u8; 32]; // challenge
        data.extend_from_slice(&app_param);
        data.push(key_handle.len() as u8);
        data.extend_from_slice(&key_handle);
        let raw = authenticate_request(u2fkey_proto::constants::U2F_AUTH_ENFORCE, data);
        let req = parse(&raw).expect("should parse");

        let counter = FixedCounter(std::sync::atomic::AtomicU32::new(0));
        let outcome = handle_authenticate(
            &req,
            AuthMode::Enforce,
            &crypto,
            &wrapping_key,
            &counter,
            &AlwaysPresent,
            &mut rng,
        );
        let ApduOutcome::Response(resp) = outcome else { panic!("expected response") };
        assert_eq!(resp[0], 0x01);
        let counter_be = u32::from_be_bytes(resp[1..5].try_into().unwrap());
        assert_eq!(counter_be, 1);
        let sw = &resp[resp.len() - 2..];
        assert_eq!(sw, u2fkey_proto::constants::SW_NO_ERROR.to_be_bytes());
    }

    #[test]
    fn no_enforce_signs_with_presence_byte_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let wrapping_key = FixedWrappingKey([4u8; 32]);
        let crypto = DefaultCryptoProvider;
        let app_param = [8u8; 32];
        let key_handle = mint_key_handle(&crypto, &wrapping_key, app_param, &mut rng);

        let mut data = vec![2u8; 32];
        data.extend_from_slice(&app_param);
        data.push(key_handle.len() as u8);
        data.extend_from_slice(&key_handle);
        let raw = authenticate_request(u2fkey_proto::constants::U2F_AUTH_NO_ENFORCE, data);
        let req = parse(&raw).expect("should parse");

        let counter = FixedCounter(std::sync::atomic::AtomicU32::new(0));
        let outcome = handle_authenticate(
            &req,
            AuthMode::NoEnforce,
            &crypto,
            &wrapping_key,
            &counter,
            &AlwaysPresent,
            &mut rng,
        );
        let ApduOutcome::Response(resp) = outcome else { panic!("expected response") };
        assert_eq!(resp[0], 0x00);
        assert_eq!(&resp[resp.len() - 2..], &u2fkey_proto::constants::SW_NO_ERROR.to_be_bytes());
    }

    #[test]
    fn check_never_signs_and_reports_conditions_not_satisfied_for_a_valid_handle() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let wrapping_key = FixedWrappingKey([5u8; 32]);
        let crypto = DefaultCryptoProvider;
        let app_param = [1u8; 32];
        let key_handle = mint_key_handle(&crypto, &wrapping_key, app_param, &mut rng);

        let mut data = vec![3u8; 32];
        data.extend_from_slice(&app_param);
        data.push(key_handle.len() as u8);
        data.extend_from_slice(&key_handle);
        let raw = authenticate_request(u2fkey_proto::constants::U2F_AUTH_CHECK, data);
        let req = parse(&raw).expect("should parse");

        let counter = FixedCounter(std::sync::atomic::AtomicU32::new(0));
        let outcome = handle_authenticate(
            &req,
            AuthMode::Check,
            &crypto,
            &wrapping_key,
            &counter,
            &AlwaysPresent,
            &mut rng,
        );
        let ApduOutcome::Response(resp) = outcome else { panic!("expected response") };
        assert_eq!(resp, u2fkey_proto::constants::SW_CONDITIONS_NOT_SATISFIED.to_be_bytes());
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 0, "CHECK must never increment");
    }

    #[test]
    fn wrong_application_param_is_rejected_without_incrementing_counter() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let wrapping_key = FixedWrappingKey([6u8; 32]);
        let crypto = DefaultCryptoProvider;
        let minted_for = [1u8; 32];
        let requested_with = [2u8; 32];
        let key_handle = mint_key_handle(&crypto, &wrapping_key, minted_for, &mut rng);

        let mut data = vec![4u8; 32];
        data.extend_from_slice(&requested_with);
        data.push(key_handle.len() as u8);
        data.extend_from_slice(&key_handle);
        let raw = authenticate_request(u2fkey_proto::constants::U2F_AUTH_ENFORCE, data);
        let req = parse(&raw).expect("should parse");

        let counter = FixedCounter(std::sync::atomic::AtomicU32::new(0));
        let outcome = handle_authenticate(
            &req,
            AuthMode::Enforce,
            &crypto,
            &wrapping_key,
            &counter,
            &AlwaysPresent,
            &mut rng,
        );
        let ApduOutcome::Response(resp) = outcome else { panic!("expected response") };
        assert_eq!(resp, u2fkey_proto::constants::SW_WRONG_DATA.to_be_bytes());
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn counter_persistence_failure_is_fatal() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let wrapping_key = FixedWrappingKey([2u8; 32]);
        let crypto = DefaultCryptoProvider;
        let app_param = [7u8; 32];
        let key_handle = mint_key_handle(&crypto, &wrapping_key, app_param, &mut rng);

        let mut data = vec![5u8; 32];
        data.extend_from_slice(&app_param);
        data.push(key_handle.len() as u8);
        data.extend_from_slice(&key_handle);
        let raw = authenticate_request(u2fkey_proto::constants::U2F_AUTH_ENFORCE, data);
        let req = parse(&raw).expect("should parse");

        let outcome = handle_authenticate(
            &req,
            AuthMode::Enforce,
            &crypto,
            &wrapping_key,
            &FailingCounter,
            &AlwaysPresent,
            &mut rng,
        );
        assert!(matches!(outcome, ApduOutcome::Fatal(_)));
    }
}
