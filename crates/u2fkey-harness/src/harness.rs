//! Runs a real authenticator ([`u2fkey_server::driver::run`]) against a
//! [`DuplexMemoryDevice`] on a background thread, giving scenario tests a
//! host-side handle to send request frames, receive response frames, and
//! advance the authenticator's clock.

use std::thread::JoinHandle;
use std::time::Duration;

use u2fkey_core::dispatcher::Dispatcher;
use u2fkey_core::provider::AlwaysPresent;
use u2fkey_core::raw_message::RawMessageLayer;
use u2fkey_crypto::DefaultCryptoProvider;
use u2fkey_server::device::{DuplexMemoryDevice, DuplexMemoryHost};
use u2fkey_server::error::ServerError;
use u2fkey_server::storage::{CounterProviderAdapter, MemoryCounterStore};

use crate::env::TestEnv;
use crate::fixtures::{FixedAttestation, FixedWrappingKey};

/// How long a scenario test waits for one response frame before concluding
/// the authenticator will not answer.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// A running authenticator instance wired to an in-memory device, with a
/// clock the test drives by hand.
pub struct AuthenticatorHarness {
    host: DuplexMemoryHost,
    env: TestEnv,
    driver: Option<JoinHandle<Result<(), ServerError>>>,
}

impl AuthenticatorHarness {
    /// Start an authenticator with a fresh [`MemoryCounterStore`] and fixed,
    /// seed-derived attestation/wrapping-key identities.
    #[must_use]
    pub fn spawn(seed: u64) -> Self {
        let env = TestEnv::new(seed);
        let attestation = FixedAttestation::new(seed);
        let wrapping_key = FixedWrappingKey::new(seed.wrapping_add(1));
        let counter = MemoryCounterStore::new();

        let handler = RawMessageLayer::new(
            Box::new(DefaultCryptoProvider),
            Box::new(wrapping_key),
            Box::new(attestation),
            Box::new(CounterProviderAdapter(counter)),
            Box::new(AlwaysPresent),
        );
        let dispatcher = Dispatcher::new(env.clone(), handler);
        let (device, host) = DuplexMemoryDevice::pair();
        let driver = std::thread::spawn(move || u2fkey_server::driver::run(dispatcher, device));

        Self { host, env, driver: Some(driver) }
    }

    /// Send one request frame to the authenticator.
    pub fn send(&self, frame: [u8; 64]) {
        self.host.host_send(frame);
    }

    /// Wait up to [`RECV_TIMEOUT`] for the authenticator's next response
    /// frame.
    pub fn recv(&self) -> Option<[u8; 64]> {
        self.host.host_recv(RECV_TIMEOUT)
    }

    /// Move the authenticator's clock forward. Reassembly timeouts are
    /// noticed the next time the driver's internal device poll elapses
    /// (well under [`RECV_TIMEOUT`]).
    pub fn advance_clock(&self, delta: Duration) {
        self.env.advance(delta);
    }

    /// Drop the host side and wait for the driver thread to exit, returning
    /// whatever [`ServerError`] it terminated with.
    ///
    /// # Panics
    ///
    /// Panics if the driver thread itself panicked.
    pub fn shutdown(mut self) -> ServerError {
        let driver = self.driver.take().expect("spawned in new");
        drop(self.host);
        driver
            .join()
            .expect("driver thread panicked")
            .expect_err("driver only stops by returning an error")
    }
}
