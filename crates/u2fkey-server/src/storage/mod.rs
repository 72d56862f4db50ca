//! Storage abstraction for the authentication counter.
//!
//! Narrowed from the kind of `Storage` trait a Lockframe-style server
//! persists frames and MLS group state through down to the one piece of
//! mutable state a U2F authenticator actually owns: a single monotonic
//! `u32`.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticCounterStore;
pub use error::StorageError;
pub use memory::MemoryCounterStore;
pub use self::redb::RedbCounterStore;

/// Durable storage for the authentication counter.
///
/// Must be `Clone + Send + Sync` so the same handle can be shared between
/// the driver loop and anything that inspects the counter out of band (e.g.
/// a `--show-counter` diagnostic). Synchronous, matching the driver's
/// blocking-read event loop: counter persistence happens between device
/// reads, never concurrently with one.
///
/// # Panics
///
/// Implementations may panic if internal synchronization primitives are
/// poisoned. Acceptable for in-memory/test storage; a production medium
/// should not be able to poison its lock in the first place.
pub trait CounterStore: Clone + Send + Sync + 'static {
    /// Atomically increment the counter and return its new value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the new value could not be durably
    /// recorded.
    fn increment(&self) -> Result<u32, StorageError>;

    /// The counter's current value without incrementing it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value could not be read.
    fn current(&self) -> Result<u32, StorageError>;
}

/// Adapts any [`CounterStore`] into the [`u2fkey_core::provider::CounterProvider`]
/// seam the raw-message layer depends on, translating [`StorageError`] into
/// [`u2fkey_core::error::ProviderError::PersistenceFailed`].
pub struct CounterProviderAdapter<S: CounterStore>(pub S);

impl<S: CounterStore> u2fkey_core::provider::CounterProvider for CounterProviderAdapter<S> {
    fn next(&self) -> Result<u32, u2fkey_core::error::ProviderError> {
        self.0
            .increment()
            .map_err(|e| u2fkey_core::error::ProviderError::PersistenceFailed(e.to_string()))
    }
}
