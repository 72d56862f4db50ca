//! In-memory counter storage for tests and simulation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::{CounterStore, StorageError};

/// In-memory counter, backed by an atomic so `increment`/`current` never
/// need to take a lock.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    value: Arc<AtomicU32>,
}

impl MemoryCounterStore {
    /// Create a new counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn increment(&self) -> Result<u32, StorageError> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn current(&self) -> Result<u32, StorageError> {
        Ok(self.value.load(Ordering::SeqCst))
    }
}
