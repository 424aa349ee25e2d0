//! In-memory implementation of `DurableStore`.
//!
//! `InMemoryStore` keeps every key in a `HashMap` behind a `Mutex`, so it can
//! be shared across threads the same way the file store can. Nothing
//! survives the process; use it for tests and `--ephemeral` sessions.
//!
//! `snapshot()` exposes the stored values for inspection, and
//! `set_unavailable()` makes every subsequent call fail, which is how a full
//! or disabled browser-style storage area is simulated.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::debug;

use dishdose_contracts::error::{DishDoseError, DishDoseResult};
use dishdose_core::traits::DurableStore;

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    pub(crate) values: HashMap<String, String>,

    /// When true, every read and write fails.
    pub(crate) unavailable: bool,

    /// Number of successful writes, for tests that assert persistence
    /// happened (or did not).
    pub(crate) writes: u64,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// A process-local key/value store.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct InMemoryStore {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let state = InMemoryState {
            values: HashMap::new(),
            unavailable: false,
            writes: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A copy of every stored key and value.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().map(|s| s.values.clone()).unwrap_or_default()
    }

    /// Make every subsequent read and write fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.lock() {
            state.unavailable = unavailable;
        }
    }

    pub fn write_count(&self) -> u64 {
        self.lock().map(|s| s.writes).unwrap_or_default()
    }

    fn lock(&self) -> DishDoseResult<std::sync::MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| DishDoseError::Persistence {
            reason: format!("store lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── DurableStore impl ─────────────────────────────────────────────────────────

impl DurableStore for InMemoryStore {
    fn read(&self, key: &str) -> DishDoseResult<Option<String>> {
        let state = self.lock()?;
        if state.unavailable {
            return Err(DishDoseError::Persistence {
                reason: "storage unavailable".to_string(),
            });
        }
        Ok(state.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> DishDoseResult<()> {
        let mut state = self.lock()?;
        if state.unavailable {
            return Err(DishDoseError::Persistence {
                reason: "storage unavailable".to_string(),
            });
        }
        state.values.insert(key.to_string(), value.to_string());
        state.writes += 1;
        debug!(key = %key, bytes = value.len(), "in-memory store write");
        Ok(())
    }
}
