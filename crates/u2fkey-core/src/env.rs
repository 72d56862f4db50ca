//! Environment abstraction for deterministic testing.
//!
//! Decouples the channel table and dispatcher from system resources (time,
//! randomness), so the same logic runs against a real clock and OS RNG in
//! production and against a manually-advanceable clock and seeded RNG in
//! scenario tests.

use std::time::Duration;

/// Abstract environment providing time, randomness, and the one async
/// primitive (`sleep`) a driver loop may need between blocking reads.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards.
/// - `random_bytes()` uses cryptographically secure entropy in production.
/// - Methods are infallible except in exceptional circumstances (e.g. OS
///   entropy exhaustion, incorrect simulation setup).
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; scenario tests use a plain
    /// tick counter. Must support computing a deadline (`Add<Duration>`)
    /// and measuring elapsed time since one (`Sub<Duration, Output = Self>`
    /// via `Sub<Output = Duration>`).
    type Instant: Copy
        + Ord
        + Send
        + Sync
        + std::ops::Sub<Output = Duration>
        + std::ops::Add<Duration, Output = Self::Instant>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// Subsequent calls must return times greater than or equal to
    /// previous calls within one execution context.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the only async method in the trait; the dispatcher and
    /// channel table never call it — only driver code waiting between
    /// blocking device reads does.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// Given the same RNG seed, this produces the same sequence of bytes;
    /// production implementations use cryptographically secure entropy.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`, used to mint channel ids.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
