//! Production [`Environment`] implementation using system time and RNG.
//!
//! Real system time and OS-backed cryptographic randomness. Production
//! behavior is therefore non-deterministic — scenario tests substitute their
//! own `Environment` with a manually-advanceable clock and a seeded RNG
//! instead.

use std::time::Duration;

use u2fkey_core::env::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Panics
///
/// [`random_bytes`](Environment::random_bytes) panics if the OS RNG fails. A
/// server without functioning cryptographic randomness cannot mint secure
/// channel ids or key material, so continuing would be worse than aborting.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used, reason = "OS RNG failure is unrecoverable; the authenticator cannot operate securely without it")]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("OS RNG is available");
    }
}
