//! Errors from the counter persistence medium.

use thiserror::Error;

/// Errors a [`super::CounterStore`] implementation may return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The underlying medium (disk, injected chaos) failed the operation.
    #[error("counter storage I/O failure: {0}")]
    Io(String),
}
