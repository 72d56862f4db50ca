//! `redb`-backed durable counter storage.
//!
//! Uses `redb`'s ACID transactions with copy-on-write for crash safety, the
//! same story a Lockframe-style server relies on for its frame and MLS-state
//! tables — here narrowed to a single row holding one `u32`.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};

use super::{CounterStore, StorageError};

/// Table: counter
/// Key: the fixed string `"counter"` (only one row ever exists).
/// Value: the current counter value.
const COUNTER: TableDefinition<&str, u32> = TableDefinition::new("counter");

const COUNTER_KEY: &str = "counter";

/// Durable counter backed by `redb`.
///
/// Thread-safe through `redb`'s internal locking. Clone is cheap (`Arc`).
#[derive(Clone)]
pub struct RedbCounterStore {
    db: Arc<Database>,
}

impl RedbCounterStore {
    /// Open or create a `redb` database at `path`, initializing the counter
    /// table (and its row) to zero if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the database cannot be opened or
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(COUNTER).map_err(|e| StorageError::Io(e.to_string()))?;
            if table.get(COUNTER_KEY).map_err(|e| StorageError::Io(e.to_string()))?.is_none() {
                table.insert(COUNTER_KEY, 0u32).map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl CounterStore for RedbCounterStore {
    fn increment(&self) -> Result<u32, StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        let next = {
            let mut table =
                txn.open_table(COUNTER).map_err(|e| StorageError::Io(e.to_string()))?;
            let current =
                table.get(COUNTER_KEY).map_err(|e| StorageError::Io(e.to_string()))?.map_or(
                    0,
                    |value| value.value(),
                );
            let next = current.wrapping_add(1);
            table.insert(COUNTER_KEY, next).map_err(|e| StorageError::Io(e.to_string()))?;
            next
        };
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(next)
    }

    fn current(&self) -> Result<u32, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(COUNTER).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(table
            .get(COUNTER_KEY)
            .map_err(|e| StorageError::Io(e.to_string()))?
            .map_or(0, |value| value.value()))
    }
}
