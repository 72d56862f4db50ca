//! Fault-injecting counter storage wrapper, for chaos/recovery testing.
//!
//! Delegates to an inner [`CounterStore`] but randomly fails operations at a
//! configured rate, so callers can exercise the fatal-on-counter-failure
//! path (`spec.md` §7) without a real storage outage.

use std::sync::{Arc, Mutex};

use super::{CounterStore, StorageError};

/// Wraps an inner [`CounterStore`], injecting deterministic, seeded failures.
#[derive(Clone)]
pub struct ChaoticCounterStore<S: CounterStore> {
    inner: S,
    /// Failure rate in `[0.0, 1.0]`.
    failure_rate: f64,
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<Mutex<usize>>,
}

/// Deterministic linear congruential generator, so chaos runs are
/// reproducible given the same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> f64 {
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: CounterStore> ChaoticCounterStore<S> {
    /// Wrap `inner`, failing operations with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    #[must_use]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// As [`Self::new`], with an explicit seed for reproducible runs.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    #[must_use]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );
        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// The wrapped storage, for inspecting state after a chaos run.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of operations attempted so far.
    #[allow(clippy::expect_used, reason = "only poisoned if a prior call panicked mid-lock")]
    pub fn operation_count(&self) -> usize {
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    #[allow(clippy::expect_used, reason = "only poisoned if a prior call panicked mid-lock")]
    fn increment_operation_count(&self) {
        *self.operation_count.lock().expect("operation_count mutex poisoned") += 1;
    }

    #[allow(clippy::expect_used, reason = "only poisoned if a prior call panicked mid-lock")]
    fn should_fail(&self) -> bool {
        self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate)
    }
}

impl<S: CounterStore> CounterStore for ChaoticCounterStore<S> {
    fn increment(&self) -> Result<u32, StorageError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StorageError::Io("chaotic failure injection".to_string()));
        }
        self.inner.increment()
    }

    fn current(&self) -> Result<u32, StorageError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StorageError::Io("chaotic failure injection".to_string()));
        }
        self.inner.current()
    }
}
