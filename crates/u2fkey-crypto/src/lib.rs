//! Cryptographic primitives for the U2F authenticator.
//!
//! Everything here is a thin, explicit façade over audited crates — no
//! hand-rolled elliptic-curve or AEAD math lives in this crate. Callers
//! inject randomness explicitly (see [`CryptoProvider`]) so tests can run
//! deterministically without touching the OS RNG.
//!
//! # Key handle format
//!
//! A key handle returned by REGISTER and round-tripped through AUTHENTICATE
//! is the AES-256-GCM wrapping of `private_scalar(32) || application_parameter(32)`:
//!
//! ```text
//! key handle = nonce(12) || ciphertext(64) || tag(16)   = 92 bytes
//! ```
//!
//! Wrapping with a random nonce (rather than one derived from the
//! plaintext) means the same application/credential pair never produces the
//! same handle twice, and handle length fits comfortably in the single byte
//! the raw-message layer uses to declare it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod hash;
pub mod provider;
pub mod sign;
pub mod wrap;

pub use hash::sha256;
pub use provider::{CryptoProvider, DefaultCryptoProvider};
pub use sign::{KeyPair, ec_p256_generate, ec_p256_import, ec_p256_sign};
pub use wrap::{CryptoError, KEY_HANDLE_LEN, aes_unwrap, aes_wrap};
