//! A scenario-test [`Environment`]: a manually-advanceable clock paired with
//! a seeded RNG, so reassembly-timeout scenarios control time directly
//! instead of racing a real clock, while every other operation stays
//! reproducible across runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use u2fkey_core::env::Environment;

/// A [`Environment`] whose clock only moves when [`TestEnv::advance`] is
/// called, and whose randomness comes from a seeded [`ChaCha20Rng`] instead
/// of OS entropy.
///
/// Cheap to clone: every clone shares the same clock and RNG, so the handle
/// kept by a test and the one moved into the driver thread observe the same
/// advances.
#[derive(Clone)]
pub struct TestEnv {
    now: Arc<Mutex<Duration>>,
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl TestEnv {
    /// Create an environment starting at `Duration::ZERO`, seeded for
    /// reproducible randomness.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            now: Arc::new(Mutex::new(Duration::ZERO)),
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }

    /// Move the clock forward by `delta`.
    ///
    /// # Panics
    ///
    /// Panics if the internal clock mutex is poisoned.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += delta;
    }
}

impl Environment for TestEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        *self.now.lock().expect("clock mutex poisoned")
    }

    async fn sleep(&self, _duration: Duration) {
        // Scenario tests drive timing through `advance`, not real sleeps.
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().expect("rng mutex poisoned").fill_bytes(buffer);
    }
}
