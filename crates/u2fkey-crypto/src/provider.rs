//! [`CryptoProvider`]: the single seam between the raw-message layer and
//! the concrete crypto backend, mirrored on the teacher's `Storage` and
//! `Environment` trait-injection pattern so tests can substitute a fixed
//! or instrumented implementation without touching production code.

use p256::ecdsa::SigningKey;
use rand_core::CryptoRngCore;

use crate::hash::sha256;
use crate::sign::{ImportError, KeyPair, ec_p256_generate, ec_p256_import, ec_p256_sign};
use crate::wrap::{CryptoError, aes_unwrap, aes_wrap};

/// Crypto operations the U2F raw-message handlers depend on.
///
/// Every method is free of hidden I/O or randomness: where randomness is
/// needed it is taken as an explicit `&mut dyn CryptoRngCore` parameter.
pub trait CryptoProvider: Send + Sync {
    /// SHA-256 digest of `data`.
    fn sha256(&self, data: &[u8]) -> [u8; 32];

    /// Generate a fresh P-256 keypair.
    fn ec_p256_generate(&self, rng: &mut dyn CryptoRngCore) -> KeyPair;

    /// Sign `message` (already-assembled signed-data blob) with `key`,
    /// returning a DER-encoded ECDSA signature.
    fn ec_p256_sign(&self, key: &SigningKey, message: &[u8]) -> Vec<u8>;

    /// Reconstruct a signing key from a raw 32-byte scalar recovered from an
    /// unwrapped key handle.
    fn ec_p256_import(&self, scalar: &[u8]) -> Result<SigningKey, ImportError>;

    /// Wrap key-handle plaintext under `master_key`.
    fn aes_wrap(&self, master_key: &[u8; 32], plaintext: &[u8], rng: &mut dyn CryptoRngCore)
    -> Vec<u8>;

    /// Unwrap a key handle previously produced by `aes_wrap`.
    fn aes_unwrap(&self, master_key: &[u8; 32], wrapped: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// The production [`CryptoProvider`]: P-256 ECDSA via `p256`/`ecdsa`,
/// SHA-256 via `sha2`, key-handle wrapping via AES-256-GCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCryptoProvider;

impl CryptoProvider for DefaultCryptoProvider {
    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        sha256(data)
    }

    fn ec_p256_generate(&self, rng: &mut dyn CryptoRngCore) -> KeyPair {
        ec_p256_generate(rng)
    }

    fn ec_p256_sign(&self, key: &SigningKey, message: &[u8]) -> Vec<u8> {
        ec_p256_sign(key, message)
    }

    fn ec_p256_import(&self, scalar: &[u8]) -> Result<SigningKey, ImportError> {
        ec_p256_import(scalar)
    }

    fn aes_wrap(
        &self,
        master_key: &[u8; 32],
        plaintext: &[u8],
        rng: &mut dyn CryptoRngCore,
    ) -> Vec<u8> {
        aes_wrap(master_key, plaintext, rng)
    }

    fn aes_unwrap(&self, master_key: &[u8; 32], wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aes_unwrap(master_key, wrapped)
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::wrap::PLAINTEXT_LEN;

    #[test]
    fn default_provider_round_trips_a_key_handle() {
        let provider = DefaultCryptoProvider;
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let master_key = [0x11; 32];
        let plaintext = [2u8; PLAINTEXT_LEN];

        let wrapped = provider.aes_wrap(&master_key, &plaintext, &mut rng);
        let unwrapped = provider.aes_unwrap(&master_key, &wrapped).expect("unwrap should succeed");
        assert_eq!(unwrapped, plaintext);
    }

    #[test]
    fn default_provider_generates_and_signs() {
        let provider = DefaultCryptoProvider;
        let mut rng = ChaCha20Rng::seed_from_u64(43);
        let pair = provider.ec_p256_generate(&mut rng);
        let sig = provider.ec_p256_sign(&pair.private, b"blob");
        assert!(!sig.is_empty());
    }
}
