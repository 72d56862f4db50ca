//! SHA-256, used for the challenge and application parameter digests that
//! every U2F raw message carries.

use sha2::{Digest, Sha256};

/// Hash `data` with SHA-256.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hashes_to_32_bytes() {
        assert_eq!(sha256(b"").len(), 32);
    }

    #[test]
    fn same_input_same_digest() {
        assert_eq!(sha256(b"u2f"), sha256(b"u2f"));
    }

    #[test]
    fn different_input_different_digest() {
        assert_ne!(sha256(b"u2f"), sha256(b"U2F"));
    }
}
