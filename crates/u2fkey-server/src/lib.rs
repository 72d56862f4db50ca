//! Software U2F HID authenticator: device event loop and production
//! providers.
//!
//! Everything that decides U2F semantics lives in `u2fkey-core`; this crate
//! only supplies the production seams that crate defines — a real character
//! device ([`device::HidDevice`]), persistent counter storage
//! ([`storage::CounterStore`]), attestation identity loaded from disk
//! ([`attestation::FileAttestationProvider`]), and a system clock/RNG
//! ([`system_env::SystemEnv`]) — and the thin loop ([`driver::run`]) that
//! wires them to [`u2fkey_core::Dispatcher`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attestation;
pub mod device;
pub mod driver;
pub mod error;
pub mod storage;
pub mod system_env;

pub use error::ServerError;
pub use system_env::SystemEnv;

use u2fkey_core::dispatcher::Dispatcher;
use u2fkey_core::provider::AlwaysPresent;
use u2fkey_core::raw_message::RawMessageLayer;
use u2fkey_crypto::DefaultCryptoProvider;

use crate::attestation::{FileAttestationProvider, FileWrappingKeyProvider};
use crate::storage::{CounterProviderAdapter, CounterStore};

/// Everything needed to run one authenticator instance: its identity,
/// counter storage, and the device it talks over.
pub struct AuthenticatorConfig<S: CounterStore, D: device::HidDevice> {
    /// Loaded attestation private key and certificate.
    pub attestation: FileAttestationProvider,
    /// Loaded key-handle wrapping key.
    pub wrapping_key: FileWrappingKeyProvider,
    /// Durable counter storage.
    pub counter: S,
    /// The device transport to serve frames on.
    pub device: D,
}

/// Assemble the capability providers into a [`Dispatcher`] and run the
/// event loop to completion.
///
/// Always uses [`AlwaysPresent`] for the user-presence check and
/// [`DefaultCryptoProvider`] for cryptographic operations — the spec's
/// non-goals exclude wiring in a real presence button, and the crypto
/// façade has exactly one production implementation.
///
/// # Errors
///
/// Propagates whatever [`driver::run`] returns.
pub fn run_authenticator<S, D>(
    env: SystemEnv,
    config: AuthenticatorConfig<S, D>,
) -> Result<(), ServerError>
where
    S: CounterStore,
    D: device::HidDevice,
{
    let handler = RawMessageLayer::new(
        Box::new(DefaultCryptoProvider),
        Box::new(config.wrapping_key),
        Box::new(config.attestation),
        Box::new(CounterProviderAdapter(config.counter)),
        Box::new(AlwaysPresent),
    );
    let dispatcher = Dispatcher::new(env, handler);
    driver::log_start(dispatcher.channel_count());
    driver::run(dispatcher, config.device)
}
