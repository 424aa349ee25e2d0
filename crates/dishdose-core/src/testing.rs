//! Hand-written fakes shared by the unit tests in this crate.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
        Mutex,
    },
};

use dishdose_contracts::{
    assessment::{AssessmentResult, InteractionStatus, SeverityLevel},
    error::{DishDoseError, DishDoseResult},
};

use crate::traits::{Clock, DurableStore};

/// A store that keeps values in a map and can be told to fail.
#[derive(Default)]
pub(crate) struct FakeStore {
    values: Mutex<HashMap<String, String>>,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_writes: AtomicBool,
    pub(crate) writes: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn with(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.values.lock().unwrap().insert(key.to_string(), value.to_string());
        store
    }

    pub(crate) fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DurableStore for FakeStore {
    fn read(&self, key: &str) -> DishDoseResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DishDoseError::Persistence { reason: "read refused".to_string() });
        }
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> DishDoseResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DishDoseError::Persistence { reason: "quota exceeded".to_string() });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A clock that only moves when told to.
pub(crate) struct ManualClock(AtomicI64);

impl ManualClock {
    pub(crate) fn at(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }

    pub(crate) fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub(crate) fn assessment(status: InteractionStatus, details: &str) -> AssessmentResult {
    AssessmentResult {
        status,
        severity: SeverityLevel::Moderate,
        details: details.to_string(),
        recommendations: "Talk to your pharmacist.".to_string(),
        notes: "None".to_string(),
    }
}
