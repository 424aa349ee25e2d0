//! History entry types and the persisted collection format.
//!
//! A `HistoryEntry` is a snapshot of one successful check. The persisted
//! collection is a JSON array of these records:
//!
//! ```json
//! [{ "id": "...", "timestamp": 1718000000000, "medications": "Warfarin",
//!    "food": "Spinach", "result": { "interactionStatus": "Caution", ... },
//!    "isFavorite": false }]
//! ```
//!
//! There is no schema version field. `isFavorite` may be absent in payloads
//! written by older clients and then reads as `false`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assessment::AssessmentResult;

/// Opaque, stable identifier of a history entry.
///
/// New entries get a UUID v4 string. Existing payloads may carry any other
/// string (older clients used an ISO-8601 timestamp); it is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create a new, unique entry ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One persisted interaction check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Assigned once when the pair is first recorded; never reassigned.
    pub id: EntryId,

    /// Epoch milliseconds of the most recent upsert of this pair.
    pub timestamp: i64,

    /// Medication text exactly as last submitted.
    pub medications: String,

    /// Food text exactly as last submitted.
    pub food: String,

    pub result: AssessmentResult,

    #[serde(rename = "isFavorite", default)]
    pub favorite: bool,
}

impl HistoryEntry {
    /// True if this entry records the same pair as `(medications, food)`
    /// after trim + case-fold normalization of both sides.
    pub fn matches_pair(&self, medications: &str, food: &str) -> bool {
        normalize(&self.medications) == normalize(medications)
            && normalize(&self.food) == normalize(food)
    }

    /// True if `needle` (already lowercased) occurs in either field,
    /// ignoring case.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        self.medications.to_lowercase().contains(needle)
            || self.food.to_lowercase().contains(needle)
    }
}

/// Trim and case-fold a field for equality matching.
///
/// Normalized text is used only to compare pairs; it is never stored.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
