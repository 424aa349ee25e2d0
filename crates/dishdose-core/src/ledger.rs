//! The history ledger: deduplicated, favorite-aware record of past checks.
//!
//! Entries are kept in recency order (most recently upserted first) and the
//! whole collection is written through to the store after every mutation.
//! At most one entry exists per normalized `(medications, food)` pair.

use std::sync::Arc;

use tracing::{debug, info, warn};

use dishdose_contracts::{
    assessment::AssessmentResult,
    error::{DishDoseError, DishDoseResult, PersistenceWarning, StoreOperation},
    history::{normalize, EntryId, HistoryEntry},
    storage::HISTORY_KEY,
};

use crate::{
    notice::Notice,
    persist::{read_key, write_key, Persisted},
    traits::{Clock, DurableStore},
};

/// Which way a favorite toggle went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteToggle {
    pub id: EntryId,
    /// The entry's favorite flag after the toggle.
    pub favorite: bool,
}

impl Persisted<FavoriteToggle> {
    /// The notice a presentation layer should show for this toggle.
    pub fn notice(&self) -> Notice {
        match (&self.warning, self.value.favorite) {
            (Some(_), _) => Notice::FavoriteSaveFailed,
            (None, true) => Notice::AddedToFavorites,
            (None, false) => Notice::RemovedFromFavorites,
        }
    }
}

impl Persisted<()> {
    /// The notice for a `clear()`.
    pub fn clear_notice(&self) -> Notice {
        if self.is_saved() {
            Notice::HistoryCleared
        } else {
            Notice::HistoryClearFailed
        }
    }
}

/// The ordered, deduplicated collection of past assessments.
pub struct HistoryLedger {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    /// Most recently upserted first.
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    /// Load the ledger from `store`.
    ///
    /// A read failure, a missing key, or a payload that does not parse all
    /// produce an empty ledger. History is recoverable state, so none of
    /// these is reported as an error. Duplicate pairs in a stored payload
    /// are collapsed, keeping the first (most recent) occurrence.
    pub fn load(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        let entries = match read_key(store.as_ref(), HISTORY_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => dedupe(entries),
                Err(e) => {
                    warn!(key = HISTORY_KEY, error = %e, "stored history is malformed; starting empty");
                    Vec::new()
                }
            },
        };

        debug!(entries = entries.len(), "history ledger loaded");
        Self { store, clock, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in recency order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &EntryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Record a successful check.
    ///
    /// If an entry already exists for the normalized pair it keeps its `id`
    /// and `favorite` flag; its text, result, and timestamp are replaced and
    /// it moves to the front. Otherwise a new entry is created at the front.
    pub fn upsert(
        &mut self,
        medications: &str,
        food: &str,
        result: AssessmentResult,
    ) -> Persisted<HistoryEntry> {
        let existing = self
            .entries
            .iter()
            .position(|e| e.matches_pair(medications, food))
            .map(|idx| self.entries.remove(idx));

        let (id, favorite) = match existing {
            Some(prev) => {
                debug!(id = %prev.id, "refreshing existing history entry");
                (prev.id, prev.favorite)
            }
            None => (EntryId::new(), false),
        };

        let entry = HistoryEntry {
            id,
            timestamp: self.clock.now_millis(),
            medications: medications.to_string(),
            food: food.to_string(),
            result,
            favorite,
        };
        self.entries.insert(0, entry.clone());

        let warning = self.persist();
        Persisted { value: entry, warning }
    }

    /// Flip the favorite flag of the entry with `id`.
    ///
    /// Returns `EntryNotFound` without touching the store when no entry
    /// matches. The entry's timestamp is not changed by a toggle.
    pub fn toggle_favorite(&mut self, id: &EntryId) -> DishDoseResult<Persisted<FavoriteToggle>> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| DishDoseError::EntryNotFound { id: id.to_string() })?;

        entry.favorite = !entry.favorite;
        let toggle = FavoriteToggle {
            id: entry.id.clone(),
            favorite: entry.favorite,
        };
        debug!(id = %toggle.id, favorite = toggle.favorite, "favorite toggled");

        let warning = self.persist();
        Ok(Persisted { value: toggle, warning })
    }

    /// Remove every entry and persist the empty collection.
    pub fn clear(&mut self) -> Persisted<()> {
        let removed = self.entries.len();
        self.entries.clear();
        info!(removed, "history cleared");

        let warning = self.persist();
        Persisted { value: (), warning }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// The entries matching `query`, favorites first, newest first within
    /// each group.
    ///
    /// `query` is matched as a case-insensitive substring of either field;
    /// an empty query matches everything. Recomputed on every call.
    pub fn view(&self, query: &str) -> Vec<&HistoryEntry> {
        let needle = query.to_lowercase();
        let mut matched: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| needle.is_empty() || e.contains_lowercase(&needle))
            .collect();

        // Stable: equal keys keep recency order.
        matched.sort_by(|a, b| {
            b.favorite
                .cmp(&a.favorite)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        matched
    }

    fn persist(&self) -> Option<PersistenceWarning> {
        match serde_json::to_string(&self.entries) {
            Ok(payload) => write_key(self.store.as_ref(), HISTORY_KEY, &payload),
            Err(e) => {
                warn!(error = %e, "failed to serialize history");
                Some(PersistenceWarning {
                    key: HISTORY_KEY.to_string(),
                    operation: StoreOperation::Write,
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn dedupe(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut seen = std::collections::HashSet::new();
    let before = entries.len();
    let kept: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|e| seen.insert((normalize(&e.medications), normalize(&e.food))))
        .collect();
    if kept.len() != before {
        warn!(dropped = before - kept.len(), "stored history contained duplicate pairs");
    }
    kept
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{atomic::Ordering, Arc};

    use dishdose_contracts::{
        assessment::InteractionStatus,
        error::DishDoseError,
        history::{EntryId, HistoryEntry},
        storage::HISTORY_KEY,
    };

    use crate::{
        notice::Notice,
        testing::{assessment, FakeStore, ManualClock},
    };

    use super::HistoryLedger;

    fn ledger() -> (HistoryLedger, Arc<FakeStore>, Arc<ManualClock>) {
        let store = Arc::new(FakeStore::default());
        let clock = Arc::new(ManualClock::at(1_000));
        let ledger = HistoryLedger::load(store.clone(), clock.clone());
        (ledger, store, clock)
    }

    fn stored(store: &FakeStore) -> Vec<HistoryEntry> {
        serde_json::from_str(&store.get(HISTORY_KEY).unwrap()).unwrap()
    }

    // ── Loading ──────────────────────────────────────────────────────────────

    #[test]
    fn missing_key_loads_empty() {
        let (ledger, _, _) = ledger();
        assert!(ledger.is_empty());
    }

    #[test]
    fn malformed_payload_loads_empty() {
        let store = Arc::new(FakeStore::with(HISTORY_KEY, "{not json"));
        let ledger = HistoryLedger::load(store, Arc::new(ManualClock::at(0)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn read_failure_loads_empty() {
        let store = Arc::new(FakeStore::with(HISTORY_KEY, "[]"));
        store.fail_reads.store(true, Ordering::SeqCst);
        let ledger = HistoryLedger::load(store, Arc::new(ManualClock::at(0)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn load_round_trips_what_upsert_wrote() {
        let (mut ledger, store, clock) = ledger();
        ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"));
        clock.set(2_000);
        ledger.upsert("Atorvastatin", "Grapefruit", assessment(InteractionStatus::Warning, "b"));

        let reloaded = HistoryLedger::load(store, clock);
        assert_eq!(reloaded.entries(), ledger.entries());
    }

    #[test]
    fn load_collapses_duplicate_pairs() {
        let (mut first, store, clock) = ledger();
        first.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "new"));
        let mut entries = stored(&store);
        let mut older = entries[0].clone();
        older.id = EntryId::from("older");
        older.medications = "WARFARIN ".to_string();
        entries.push(older);
        let raw = serde_json::to_string(&entries).unwrap();

        let store = Arc::new(FakeStore::with(HISTORY_KEY, &raw));
        let ledger = HistoryLedger::load(store, clock);
        assert_eq!(ledger.len(), 1);
        assert_ne!(ledger.entries()[0].id.as_str(), "older");
    }

    // ── Upsert ───────────────────────────────────────────────────────────────

    #[test]
    fn resubmitting_same_pair_keeps_identity() {
        let (mut ledger, _, clock) = ledger();
        let first = ledger
            .upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "first"))
            .into_value();
        ledger.toggle_favorite(&first.id).unwrap();

        clock.set(5_000);
        let second = ledger
            .upsert("  warfarin ", "SPINACH", assessment(InteractionStatus::Warning, "second"))
            .into_value();

        assert_eq!(ledger.len(), 1);
        assert_eq!(second.id, first.id);
        assert!(second.favorite, "favorite flag must survive re-submission");
        assert_eq!(second.result.details, "second");
        assert_eq!(second.timestamp, 5_000);
        // Raw text of the latest submission is what gets stored.
        assert_eq!(second.medications, "  warfarin ");
        assert_eq!(second.food, "SPINACH");
    }

    #[test]
    fn upsert_moves_entry_to_front() {
        let (mut ledger, _, clock) = ledger();
        ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"));
        clock.set(2_000);
        ledger.upsert("Lisinopril", "Bananas", assessment(InteractionStatus::Warning, "b"));
        clock.set(3_000);
        ledger.upsert("warfarin", "spinach", assessment(InteractionStatus::Caution, "c"));

        let order: Vec<&str> = ledger.entries().iter().map(|e| e.food.as_str()).collect();
        assert_eq!(order, vec!["spinach", "Bananas"]);
    }

    #[test]
    fn different_pairs_get_distinct_entries() {
        let (mut ledger, _, _) = ledger();
        let a = ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"));
        let b = ledger.upsert("Warfarin", "Kale", assessment(InteractionStatus::Caution, "b"));
        assert_eq!(ledger.len(), 2);
        assert_ne!(a.value.id, b.value.id);
        assert!(!b.value.favorite);
    }

    #[test]
    fn upsert_persists_full_collection() {
        let (mut ledger, store, _) = ledger();
        let saved = ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Safe, "a"));
        assert!(saved.is_saved());
        assert_eq!(stored(&store), ledger.entries().to_vec());
    }

    #[test]
    fn write_failure_keeps_in_memory_entry_and_warns() {
        let (mut ledger, store, _) = ledger();
        store.fail_writes.store(true, Ordering::SeqCst);

        let saved = ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Safe, "a"));
        assert!(!saved.is_saved());
        assert_eq!(saved.warning.as_ref().unwrap().key, HISTORY_KEY);
        assert_eq!(ledger.len(), 1);
    }

    // ── Favorites ────────────────────────────────────────────────────────────

    #[test]
    fn favorite_toggle_round_trip() {
        let (mut ledger, _, clock) = ledger();
        let entry = ledger
            .upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"))
            .into_value();
        clock.set(9_000);

        let on = ledger.toggle_favorite(&entry.id).unwrap();
        assert!(on.value.favorite);
        assert_eq!(on.notice(), Notice::AddedToFavorites);

        let off = ledger.toggle_favorite(&entry.id).unwrap();
        assert!(!off.value.favorite);
        assert_eq!(off.notice(), Notice::RemovedFromFavorites);

        // Toggling never touches the timestamp or anything else.
        assert_eq!(ledger.entries()[0], entry);
    }

    #[test]
    fn toggle_unknown_id_is_not_found_and_skips_persistence() {
        let (mut ledger, store, _) = ledger();
        ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"));
        let writes_before = store.write_count();

        let err = ledger.toggle_favorite(&EntryId::from("nope")).unwrap_err();
        assert!(matches!(err, DishDoseError::EntryNotFound { .. }));
        assert_eq!(store.write_count(), writes_before);
        assert!(!ledger.entries()[0].favorite);
    }

    #[test]
    fn toggle_save_failure_reports_error_notice() {
        let (mut ledger, store, _) = ledger();
        let entry = ledger
            .upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"))
            .into_value();
        store.fail_writes.store(true, Ordering::SeqCst);

        let toggled = ledger.toggle_favorite(&entry.id).unwrap();
        assert_eq!(toggled.notice(), Notice::FavoriteSaveFailed);
        assert!(ledger.entries()[0].favorite);
    }

    // ── Clear ────────────────────────────────────────────────────────────────

    #[test]
    fn clear_is_total() {
        let (mut ledger, store, _) = ledger();
        ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"));
        ledger.upsert("Atorvastatin", "Grapefruit", assessment(InteractionStatus::Warning, "b"));

        let cleared = ledger.clear();
        assert_eq!(cleared.clear_notice(), Notice::HistoryCleared);
        assert!(ledger.view("").is_empty());
        assert_eq!(store.get(HISTORY_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn toggle_then_clear_apply_in_order() {
        let (mut ledger, store, _) = ledger();
        let entry = ledger
            .upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"))
            .into_value();
        ledger.toggle_favorite(&entry.id).unwrap();
        ledger.clear();
        assert!(stored(&store).is_empty());
    }

    // ── View ─────────────────────────────────────────────────────────────────

    #[test]
    fn view_puts_favorites_first_then_newest() {
        let (mut ledger, _, clock) = ledger();
        clock.set(1);
        ledger.upsert("Drug1", "Food1", assessment(InteractionStatus::Safe, "t1"));
        clock.set(2);
        let t2 = ledger
            .upsert("Drug2", "Food2", assessment(InteractionStatus::Safe, "t2"))
            .into_value();
        clock.set(3);
        ledger.upsert("Drug3", "Food3", assessment(InteractionStatus::Safe, "t3"));
        ledger.toggle_favorite(&t2.id).unwrap();

        let order: Vec<i64> = ledger.view("").iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn view_filters_case_insensitively_on_either_field() {
        let (mut ledger, _, clock) = ledger();
        ledger.upsert("Atorvastatin", "Grapefruit juice", assessment(InteractionStatus::Warning, "a"));
        clock.set(2_000);
        ledger.upsert("GRAPEFRUIT extract", "Water", assessment(InteractionStatus::Safe, "b"));
        clock.set(3_000);
        ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "c"));

        let hits = ledger.view("grapefruit");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|e| e.medications.to_lowercase().contains("grapefruit")
            || e.food.to_lowercase().contains("grapefruit")));

        assert_eq!(ledger.view("").len(), 3);
        assert!(ledger.view("insulin").is_empty());
    }

    #[test]
    fn view_is_recomputed_after_mutation() {
        let (mut ledger, _, _) = ledger();
        assert!(ledger.view("").is_empty());
        ledger.upsert("Warfarin", "Spinach", assessment(InteractionStatus::Caution, "a"));
        assert_eq!(ledger.view("").len(), 1);
    }
}
