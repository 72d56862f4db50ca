//! AES-256-GCM wrapping of key-handle plaintext.
//!
//! See the crate-level docs for the wire format. Wrapping always draws a
//! fresh random nonce; unwrapping never succeeds on a handle minted under a
//! different master key or tampered with in transit — AEAD authentication
//! failure and "not my key handle" collapse into the same caller-visible
//! outcome, which the raw-message layer reports as `SW_WRONG_DATA`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand_core::CryptoRngCore;
use thiserror::Error;
use zeroize::Zeroize;

/// Length in bytes of the random nonce prefixed to every wrapped handle.
pub const NONCE_LEN: usize = 12;
/// Length in bytes of the GCM authentication tag appended to ciphertext.
pub const TAG_LEN: usize = 16;
/// Length in bytes of the wrapped key-handle plaintext (scalar + app param).
pub const PLAINTEXT_LEN: usize = 32 + 32;
/// Total length in bytes of a wrapped key handle: `nonce || ciphertext || tag`.
pub const KEY_HANDLE_LEN: usize = NONCE_LEN + PLAINTEXT_LEN + TAG_LEN;

/// Errors unwrapping a key handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The handle was not [`KEY_HANDLE_LEN`] bytes.
    #[error("invalid key handle length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length actually given.
        actual: usize,
    },
    /// Authenticated decryption failed: wrong key, or the handle was
    /// tampered with, or it was never minted by this authenticator.
    #[error("key handle authentication failed")]
    AuthenticationFailed,
}

/// Wrap `plaintext` (expected to be exactly [`PLAINTEXT_LEN`] bytes) under
/// `master_key`, drawing a fresh nonce from `rng`.
///
/// # Panics
///
/// Panics if `plaintext` is not exactly [`PLAINTEXT_LEN`] bytes — callers
/// build it themselves from a freshly generated scalar and the request's
/// application parameter, so this indicates a caller bug, not untrusted
/// input.
#[must_use]
pub fn aes_wrap(master_key: &[u8; 32], plaintext: &[u8], rng: &mut dyn CryptoRngCore) -> Vec<u8> {
    assert_eq!(plaintext.len(), PLAINTEXT_LEN, "key handle plaintext has the wrong length");

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(master_key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    #[allow(clippy::expect_used, reason = "fixed-size key/nonce; GCM encryption cannot fail here")]
    let ciphertext =
        cipher.encrypt(nonce, Payload { msg: plaintext, aad: &[] }).expect("encryption failed");

    let mut wrapped = Vec::with_capacity(KEY_HANDLE_LEN);
    wrapped.extend_from_slice(&nonce_bytes);
    wrapped.extend_from_slice(&ciphertext);

    nonce_bytes.zeroize();
    wrapped
}

/// Unwrap a key handle previously produced by [`aes_wrap`] under the same
/// `master_key`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidLength`] if `wrapped` is not
/// [`KEY_HANDLE_LEN`] bytes, or [`CryptoError::AuthenticationFailed`] if
/// decryption fails for any reason.
pub fn aes_unwrap(master_key: &[u8; 32], wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if wrapped.len() != KEY_HANDLE_LEN {
        return Err(CryptoError::InvalidLength { expected: KEY_HANDLE_LEN, actual: wrapped.len() });
    }

    let (nonce_bytes, ciphertext) = wrapped.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(master_key));
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad: &[] })
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use super::*;

    fn master_key() -> [u8; 32] {
        [0x42; 32]
    }

    #[test]
    fn wrap_unwrap_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let plaintext = [9u8; PLAINTEXT_LEN];
        let wrapped = aes_wrap(&master_key(), &plaintext, &mut rng);
        assert_eq!(wrapped.len(), KEY_HANDLE_LEN);

        let unwrapped = aes_unwrap(&master_key(), &wrapped).expect("unwrap should succeed");
        assert_eq!(unwrapped, plaintext);
    }

    #[test]
    fn distinct_wraps_of_same_plaintext_differ() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let plaintext = [1u8; PLAINTEXT_LEN];
        let a = aes_wrap(&master_key(), &plaintext, &mut rng);
        let b = aes_wrap(&master_key(), &plaintext, &mut rng);
        assert_ne!(a, b, "wrapping must not be deterministic across calls");
    }

    #[test]
    fn unwrap_rejects_wrong_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let plaintext = [5u8; PLAINTEXT_LEN];
        let wrapped = aes_wrap(&master_key(), &plaintext, &mut rng);

        let wrong_key = [0x24; 32];
        assert_eq!(aes_unwrap(&wrong_key, &wrapped), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn unwrap_rejects_tampered_ciphertext() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let plaintext = [3u8; PLAINTEXT_LEN];
        let mut wrapped = aes_wrap(&master_key(), &plaintext, &mut rng);
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0x01;

        assert_eq!(aes_unwrap(&master_key(), &wrapped), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn unwrap_rejects_wrong_length() {
        assert_eq!(
            aes_unwrap(&master_key(), &[0u8; 10]),
            Err(CryptoError::InvalidLength { expected: KEY_HANDLE_LEN, actual: 10 })
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_round_trip_any_plaintext(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), PLAINTEXT_LEN..=PLAINTEXT_LEN)) {
            let mut rng = ChaCha20Rng::seed_from_u64(11);
            let wrapped = aes_wrap(&master_key(), &bytes, &mut rng);
            let unwrapped = aes_unwrap(&master_key(), &wrapped).expect("unwrap should succeed");
            proptest::prop_assert_eq!(unwrapped, bytes);
        }
    }
}
