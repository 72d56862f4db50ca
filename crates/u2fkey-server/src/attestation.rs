//! Loads the authenticator's fixed attestation identity and key-handle
//! wrapping key from disk paths given on the CLI.
//!
//! Mirrors the way a Lockframe-style server treats its TLS certificate/key
//! pair as load-once-at-startup, read-only identity material; unlike a TLS
//! listener, the U2F attestation key and wrapping key never rotate for the
//! life of the process (`spec.md` §1).

use std::path::Path;

use p256::ecdsa::SigningKey;
use p256::pkcs8::DecodePrivateKey;
use u2fkey_core::provider::{AttestationProvider, WrappingKeyProvider};

/// Errors loading attestation or wrapping-key material from disk.
#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The attestation private key file was not valid PKCS#8 PEM.
    #[error("failed to parse attestation private key: {0}")]
    InvalidKey(p256::pkcs8::Error),
    /// The wrapping-key file was not exactly 32 bytes.
    #[error("wrapping key file must be exactly 32 bytes, got {actual}")]
    InvalidWrappingKeyLength {
        /// Length actually read.
        actual: usize,
    },
}

/// An [`AttestationProvider`] loaded once from a PKCS#8 PEM private key and
/// a DER certificate, both given as file paths.
pub struct FileAttestationProvider {
    key: SigningKey,
    cert_der: Vec<u8>,
}

impl FileAttestationProvider {
    /// Load the attestation key and certificate from disk.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if either file cannot be read or the key
    /// cannot be parsed as a PKCS#8 PEM-encoded P-256 private key.
    pub fn load(key_path: impl AsRef<Path>, cert_path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let key_path = key_path.as_ref();
        let cert_path = cert_path.as_ref();

        let key_pem = std::fs::read_to_string(key_path)
            .map_err(|source| IdentityError::Read { path: key_path.display().to_string(), source })?;
        let key = SigningKey::from_pkcs8_pem(&key_pem).map_err(IdentityError::InvalidKey)?;

        let cert_der = std::fs::read(cert_path)
            .map_err(|source| IdentityError::Read { path: cert_path.display().to_string(), source })?;

        Ok(Self { key, cert_der })
    }
}

impl AttestationProvider for FileAttestationProvider {
    fn key(&self) -> &SigningKey {
        &self.key
    }

    fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }
}

/// A [`WrappingKeyProvider`] loaded once from a raw 32-byte key file.
pub struct FileWrappingKeyProvider {
    key: [u8; 32],
}

impl FileWrappingKeyProvider {
    /// Load the 32-byte AES key-handle wrapping key from disk.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the file cannot be read or is not
    /// exactly 32 bytes long.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| IdentityError::Read { path: path.display().to_string(), source })?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| IdentityError::InvalidWrappingKeyLength { actual: bytes.len() })?;
        Ok(Self { key })
    }
}

impl WrappingKeyProvider for FileWrappingKeyProvider {
    fn wrapping_key(&self) -> &[u8; 32] {
        &self.key
    }
}
