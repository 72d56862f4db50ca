//! ECDSA over P-256: key generation, signing, and importing a raw private
//! scalar recovered from an unwrapped key handle.

use ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::CryptoRngCore;
use thiserror::Error;

/// A freshly generated P-256 keypair.
pub struct KeyPair {
    /// Private signing key. Zeroized on drop by the underlying curve crate.
    pub private: SigningKey,
    /// Uncompressed SEC1 public key point (0x04 || X(32) || Y(32)), exactly
    /// the encoding REGISTER places in its response.
    pub public_uncompressed: [u8; 65],
}

/// Errors importing a raw scalar as a P-256 private key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The scalar is zero, or at least the curve order — not a valid P-256
    /// private key.
    #[error("scalar is not a valid P-256 private key")]
    InvalidScalar,
    /// The input was not exactly 32 bytes.
    #[error("expected a 32-byte scalar, got {0} bytes")]
    WrongLength(usize),
}

/// Generate a new P-256 keypair using `rng` for randomness.
#[must_use]
pub fn ec_p256_generate(rng: &mut dyn CryptoRngCore) -> KeyPair {
    let private = SigningKey::random(rng);
    let verifying = VerifyingKey::from(&private);
    let point = verifying.to_encoded_point(false);
    let mut public_uncompressed = [0u8; 65];
    public_uncompressed.copy_from_slice(point.as_bytes());
    KeyPair { private, public_uncompressed }
}

/// Import a raw 32-byte scalar as a P-256 private key — used to reconstruct
/// the signing key carried inside an unwrapped key handle.
///
/// # Errors
///
/// Returns [`ImportError`] if `scalar` is not exactly 32 bytes, or does not
/// encode a valid non-zero scalar less than the curve order.
pub fn ec_p256_import(scalar: &[u8]) -> Result<SigningKey, ImportError> {
    if scalar.len() != 32 {
        return Err(ImportError::WrongLength(scalar.len()));
    }
    SigningKey::from_slice(scalar).map_err(|_| ImportError::InvalidScalar)
}

/// Sign `message` with `key`, returning a DER-encoded ECDSA signature.
///
/// `message` is the raw signed-data blob defined by the raw-message layer
/// (application parameter, challenge, key handle, public key for REGISTER;
/// application parameter, presence+counter, challenge for AUTHENTICATE) —
/// this function hashes it with SHA-256 internally, as P-256 ECDSA requires.
#[must_use]
pub fn ec_p256_sign(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    let signature: Signature = key.sign(message);
    signature.to_der().as_bytes().to_vec()
}
