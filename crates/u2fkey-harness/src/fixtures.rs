//! Fixed, non-random capability providers for scenario tests: an
//! attestation identity and a key-handle wrapping key that stay constant
//! across runs, so test assertions can pin down exact byte layouts instead
//! of only checking shape.

use p256::ecdsa::SigningKey;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use u2fkey_core::provider::{AttestationProvider, WrappingKeyProvider};

/// The placeholder "certificate" every [`FixedAttestation`] reports,
/// exposed so scenario tests can compute its length when slicing a
/// REGISTER response apart.
pub const ATTESTATION_CERT: &[u8] = b"test-attestation-cert";

/// A fixed attestation key and a placeholder DER certificate, derived from
/// a seed so the same scenario always exercises the same signing key.
pub struct FixedAttestation {
    key: SigningKey,
    cert: Vec<u8>,
}

impl FixedAttestation {
    /// Derive a fixed attestation identity from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self { key: SigningKey::random(&mut rng), cert: ATTESTATION_CERT.to_vec() }
    }
}

impl AttestationProvider for FixedAttestation {
    fn key(&self) -> &SigningKey {
        &self.key
    }

    fn cert_der(&self) -> &[u8] {
        &self.cert
    }
}

/// A fixed 256-bit key-handle wrapping key.
pub struct FixedWrappingKey(pub [u8; 32]);

impl FixedWrappingKey {
    /// Derive a fixed wrapping key from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut bytes = [0u8; 32];
        rand_core::RngCore::fill_bytes(&mut rng, &mut bytes);
        Self(bytes)
    }
}

impl WrappingKeyProvider for FixedWrappingKey {
    fn wrapping_key(&self) -> &[u8; 32] {
        &self.0
    }
}
