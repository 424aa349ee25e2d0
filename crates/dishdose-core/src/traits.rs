//! The three seams between the core and the outside world.
//!
//! - `DurableStore` — best-effort key/value persistence
//! - `Oracle`       — the external advisor that assesses a pair
//! - `Clock`        — wall-clock time in epoch milliseconds
//!
//! The core owns no I/O of its own. Every component receives its
//! collaborators through these traits, so each can be driven from a test
//! with a hand-written fake.

use async_trait::async_trait;

use dishdose_contracts::{
    assessment::AssessmentResult,
    error::{DishDoseResult, OracleError},
};

/// A minimal persistence capability over opaque string keys.
///
/// Implementations report failures through `Err`; the callers in this crate
/// turn every such failure into a logged `PersistenceWarning` and carry on.
pub trait DurableStore: Send + Sync {
    /// Return the value stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> DishDoseResult<Option<String>>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> DishDoseResult<()>;
}

/// The external advisory service.
///
/// Given the raw medication and food strings (both non-empty after trim),
/// returns a structured assessment or one of the four `OracleError` modes.
/// Implementations must not retry on the core's behalf.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn assess(&self, medications: &str, food: &str) -> Result<AssessmentResult, OracleError>;
}

/// Source of timestamps for history entries.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// `Clock` backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
