//! Best-effort reads and writes against a `DurableStore`.
//!
//! Nothing in the core fails because storage failed. A failed read degrades
//! to "nothing stored"; a failed write is logged and handed back to the
//! caller as a `PersistenceWarning` next to the value it was saving.

use tracing::warn;

use dishdose_contracts::error::{PersistenceWarning, StoreOperation};

use crate::traits::DurableStore;

/// The result of a mutation whose durability is best-effort.
///
/// `value` always reflects the in-memory change. `warning` is set when the
/// change could not be written through to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted<T> {
    pub value: T,
    pub warning: Option<PersistenceWarning>,
}

impl<T> Persisted<T> {
    pub fn saved(value: T) -> Self {
        Self { value, warning: None }
    }

    pub fn is_saved(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Read `key`, treating any store failure as absence.
pub(crate) fn read_key(store: &dyn DurableStore, key: &str) -> Option<String> {
    match store.read(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "store read failed; using default");
            None
        }
    }
}

/// Write `value` under `key`, returning a warning instead of an error.
pub(crate) fn write_key(
    store: &dyn DurableStore,
    key: &str,
    value: &str,
) -> Option<PersistenceWarning> {
    match store.write(key, value) {
        Ok(()) => None,
        Err(e) => {
            warn!(key = %key, error = %e, "store write failed");
            Some(PersistenceWarning {
                key: key.to_string(),
                operation: StoreOperation::Write,
                reason: e.to_string(),
            })
        }
    }
}
