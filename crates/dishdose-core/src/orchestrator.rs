//! The submission orchestrator: one oracle call, wired between the
//! lifecycle machine and the history ledger.
//!
//! The orchestrator enforces the submission pipeline:
//!
//!   Validate → Checking → Oracle::assess → complete(ticket) → Ledger::upsert
//!
//! The ledger is written if and only if the oracle succeeded AND the call
//! was still current when it returned. A superseded call's answer is
//! dropped on the floor: no phase change, no fields, no history.
//!
//! No lock is held across the oracle `.await`, so edits, history browsing,
//! and new submits all proceed while a check is in flight.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use dishdose_contracts::{
    assessment::AssessmentResult,
    error::{CheckFailure, DishDoseError, DishDoseResult},
    history::{EntryId, HistoryEntry},
};

use crate::{
    ledger::{FavoriteToggle, HistoryLedger},
    lifecycle::{CheckTicket, Completion, Field, LifecycleMachine, LifecycleState},
    notice::Notice,
    persist::Persisted,
    traits::Oracle,
};

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input. The oracle was not contacted.
    Rejected(CheckFailure),

    /// The oracle answered and the answer is now displayed.
    Succeeded {
        result: AssessmentResult,
        /// The ledger entry the answer was recorded under.
        entry: HistoryEntry,
        /// Secondary notices, e.g. a failed history write.
        notices: Vec<Notice>,
    },

    /// The oracle failed; the machine now shows `failure.user_message()`.
    Failed(CheckFailure),

    /// A newer submit, reset, or history load happened while this call was
    /// in flight. Its outcome was discarded.
    Superseded,
}

/// Coordinates a `LifecycleMachine` and a `HistoryLedger` around an `Oracle`.
///
/// One orchestrator per interactive session. Share it behind an `Arc` to
/// run submissions from spawned tasks.
pub struct Orchestrator {
    oracle: Box<dyn Oracle>,
    machine: Mutex<LifecycleMachine>,
    ledger: Mutex<HistoryLedger>,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh `Idle` machine over `ledger`.
    pub fn new(oracle: Box<dyn Oracle>, ledger: HistoryLedger) -> Self {
        Self {
            oracle,
            machine: Mutex::new(LifecycleMachine::new()),
            ledger: Mutex::new(ledger),
        }
    }

    // ── Submission ────────────────────────────────────────────────────────────

    /// Submit whatever is currently in the form fields.
    pub async fn submit(&self) -> DishDoseResult<SubmitOutcome> {
        let ticket = self.machine()?.submit();
        self.drive(ticket).await
    }

    /// Check an explicit pair, e.g. one of the example queries.
    ///
    /// The raw strings go to the oracle unchanged. The form fields take
    /// these values once the check succeeds.
    pub async fn run(&self, medications: &str, food: &str) -> DishDoseResult<SubmitOutcome> {
        let ticket = self.machine()?.submit_pair(medications, food);
        self.drive(ticket).await
    }

    async fn drive(
        &self,
        ticket: Result<CheckTicket, CheckFailure>,
    ) -> DishDoseResult<SubmitOutcome> {
        let ticket = match ticket {
            Ok(ticket) => ticket,
            Err(failure) => return Ok(SubmitOutcome::Rejected(failure)),
        };

        debug!(seq = ticket.seq(), "calling oracle");
        let outcome = self
            .oracle
            .assess(ticket.medications(), ticket.food())
            .await
            .map_err(|e| {
                // The technical reason stays in the log; the machine only
                // ever sees the variant.
                warn!(seq = ticket.seq(), error = %e, "oracle call failed");
                CheckFailure::from(e)
            });

        if self.machine()?.complete(&ticket, &outcome) == Completion::Stale {
            info!(seq = ticket.seq(), "oracle answered after being superseded; discarded");
            return Ok(SubmitOutcome::Superseded);
        }

        match outcome {
            Ok(result) => {
                let saved = self
                    .ledger()?
                    .upsert(ticket.medications(), ticket.food(), result.clone());
                let notices = if saved.is_saved() {
                    Vec::new()
                } else {
                    vec![Notice::HistorySaveFailed]
                };
                Ok(SubmitOutcome::Succeeded {
                    result,
                    entry: saved.value,
                    notices,
                })
            }
            Err(failure) => Ok(SubmitOutcome::Failed(failure)),
        }
    }

    // ── Form ──────────────────────────────────────────────────────────────────

    pub fn set_field(&self, field: Field, value: impl Into<String>) -> DishDoseResult<()> {
        self.machine()?.set_field(field, value);
        Ok(())
    }

    pub fn reset(&self) -> DishDoseResult<()> {
        self.machine()?.reset();
        Ok(())
    }

    /// A copy of the current lifecycle state.
    pub fn snapshot(&self) -> DishDoseResult<LifecycleState> {
        Ok(self.machine()?.state().clone())
    }

    // ── History ───────────────────────────────────────────────────────────────

    /// Display a past entry without calling the oracle.
    pub fn load_from_history(&self, id: &EntryId) -> DishDoseResult<HistoryEntry> {
        let entry = self
            .ledger()?
            .get(id)
            .cloned()
            .ok_or_else(|| DishDoseError::EntryNotFound { id: id.to_string() })?;
        self.machine()?.load_from(&entry);
        Ok(entry)
    }

    /// The ordered, filtered history view, cloned out of the ledger.
    pub fn history(&self, query: &str) -> DishDoseResult<Vec<HistoryEntry>> {
        Ok(self.ledger()?.view(query).into_iter().cloned().collect())
    }

    pub fn toggle_favorite(&self, id: &EntryId) -> DishDoseResult<Persisted<FavoriteToggle>> {
        self.ledger()?.toggle_favorite(id)
    }

    pub fn clear_history(&self) -> DishDoseResult<Persisted<()>> {
        Ok(self.ledger()?.clear())
    }

    // ── Locks ─────────────────────────────────────────────────────────────────

    fn machine(&self) -> DishDoseResult<MutexGuard<'_, LifecycleMachine>> {
        self.machine.lock().map_err(|e| DishDoseError::StateMachine {
            reason: format!("lifecycle lock poisoned: {}", e),
        })
    }

    fn ledger(&self) -> DishDoseResult<MutexGuard<'_, HistoryLedger>> {
        self.ledger.lock().map_err(|e| DishDoseError::StateMachine {
            reason: format!("ledger lock poisoned: {}", e),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use dishdose_contracts::{
        assessment::{AssessmentResult, InteractionStatus},
        error::{CheckFailure, OracleError},
        history::EntryId,
        storage::HISTORY_KEY,
    };

    use crate::{
        ledger::HistoryLedger,
        lifecycle::{Field, Phase},
        notice::Notice,
        testing::{assessment, FakeStore, ManualClock},
        traits::Oracle,
    };

    use super::{Orchestrator, SubmitOutcome};

    type Answer = Result<AssessmentResult, OracleError>;

    // ── Mock oracles ─────────────────────────────────────────────────────────

    /// Answers immediately with a fixed outcome and counts calls.
    struct ScriptedOracle {
        answer: Answer,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn assess(&self, medications: &str, food: &str) -> Answer {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((medications.to_string(), food.to_string()));
            self.answer.clone()
        }
    }

    /// Blocks each call until the test releases it through a oneshot,
    /// keyed by the medications string.
    struct GatedOracle {
        gates: Mutex<HashMap<String, oneshot::Receiver<Answer>>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Oracle for GatedOracle {
        async fn assess(&self, medications: &str, _food: &str) -> Answer {
            let gate = self.gates.lock().unwrap().remove(medications);
            self.calls.fetch_add(1, Ordering::SeqCst);
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| {
                    Err(OracleError::Transport { reason: "gate dropped".to_string() })
                }),
                None => Err(OracleError::Transport { reason: "no gate".to_string() }),
            }
        }
    }

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        store: Arc<FakeStore>,
        calls: Arc<AtomicUsize>,
    }

    fn scripted(answer: Answer) -> (Harness, Arc<Mutex<Vec<(String, String)>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let oracle = ScriptedOracle {
            answer,
            calls: calls.clone(),
            seen: seen.clone(),
        };
        (harness(Box::new(oracle), calls), seen)
    }

    fn gated(gates: Vec<(&str, oneshot::Receiver<Answer>)>) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle = GatedOracle {
            gates: Mutex::new(gates.into_iter().map(|(k, v)| (k.to_string(), v)).collect()),
            calls: calls.clone(),
        };
        harness(Box::new(oracle), calls)
    }

    fn harness(oracle: Box<dyn Oracle>, calls: Arc<AtomicUsize>) -> Harness {
        let store = Arc::new(FakeStore::default());
        let ledger = HistoryLedger::load(store.clone(), Arc::new(ManualClock::at(1_000)));
        Harness {
            orchestrator: Arc::new(Orchestrator::new(oracle, ledger)),
            store,
            calls,
        }
    }

    async fn wait_for_calls(calls: &AtomicUsize, n: usize) {
        while calls.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }

    // ── Validation gate ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn blank_medications_never_reach_oracle() {
        let (h, _) = scripted(Ok(assessment(InteractionStatus::Safe, "x")));
        h.orchestrator.set_field(Field::Food, "kale").unwrap();

        let outcome = h.orchestrator.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected(CheckFailure::Validation));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(
            state.error_message(),
            Some("Please enter both medication(s) and a food/beverage.")
        );
        assert!(h.store.get(HISTORY_KEY).is_none());
    }

    // ── Success / failure ────────────────────────────────────────────────────

    #[tokio::test]
    async fn success_updates_machine_and_ledger() {
        let (h, seen) = scripted(Ok(assessment(InteractionStatus::Caution, "vitamin K")));
        h.orchestrator.set_field(Field::Medications, " Warfarin ").unwrap();
        h.orchestrator.set_field(Field::Food, "Spinach").unwrap();

        let outcome = h.orchestrator.submit().await.unwrap();
        let entry = match outcome {
            SubmitOutcome::Succeeded { entry, notices, .. } => {
                assert!(notices.is_empty());
                entry
            }
            other => panic!("expected Succeeded, got {:?}", other),
        };

        // The oracle saw the raw strings, untrimmed.
        assert_eq!(seen.lock().unwrap()[0], (" Warfarin ".to_string(), "Spinach".to_string()));

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.last_result.unwrap().details, "vitamin K");

        let history = h.orchestrator.history("").unwrap();
        assert_eq!(history, vec![entry]);
        assert!(h.store.get(HISTORY_KEY).is_some());
    }

    #[tokio::test]
    async fn oracle_failure_leaves_ledger_untouched() {
        let (h, _) = scripted(Err(OracleError::NotConfigured {
            reason: "API_KEY environment variable is not set".to_string(),
        }));

        let outcome = h.orchestrator.run("Warfarin", "Spinach").await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(CheckFailure::Oracle(OracleError::NotConfigured { .. }))
        ));

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.phase, Phase::Failed);
        let msg = state.error_message().unwrap();
        assert!(msg.contains("not configured correctly"));
        assert!(!msg.contains("API_KEY"));
        assert!(h.orchestrator.history("").unwrap().is_empty());
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_undo_success() {
        let (h, _) = scripted(Ok(assessment(InteractionStatus::Safe, "fine")));
        h.store.fail_writes.store(true, Ordering::SeqCst);

        let outcome = h.orchestrator.run("Metformin", "Rice").await.unwrap();
        match outcome {
            SubmitOutcome::Succeeded { notices, .. } => {
                assert_eq!(notices, vec![Notice::HistorySaveFailed]);
            }
            other => panic!("expected Succeeded, got {:?}", other),
        }
        assert_eq!(h.orchestrator.snapshot().unwrap().phase, Phase::Succeeded);
        assert_eq!(h.orchestrator.history("").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_sets_fields_only_on_success() {
        let (h, _) = scripted(Ok(assessment(InteractionStatus::Warning, "statins")));
        h.orchestrator.run("Atorvastatin", "Grapefruit juice").await.unwrap();

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.medications, "Atorvastatin");
        assert_eq!(state.food, "Grapefruit juice");
    }

    #[tokio::test]
    async fn same_pair_twice_yields_one_entry() {
        let (h, _) = scripted(Ok(assessment(InteractionStatus::Caution, "a")));
        h.orchestrator.run("Warfarin", "Spinach").await.unwrap();
        h.orchestrator.run("  warfarin ", "SPINACH").await.unwrap();
        assert_eq!(h.orchestrator.history("").unwrap().len(), 1);
    }

    // ── Ordering hazard ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn late_answer_from_superseded_call_is_discarded() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let h = gated(vec![("Warfarin", rx_a), ("Atorvastatin", rx_b)]);

        let a = tokio::spawn({
            let o = h.orchestrator.clone();
            async move { o.run("Warfarin", "Spinach").await }
        });
        wait_for_calls(&h.calls, 1).await;

        let b = tokio::spawn({
            let o = h.orchestrator.clone();
            async move { o.run("Atorvastatin", "Grapefruit").await }
        });
        wait_for_calls(&h.calls, 2).await;

        // B resolves first, then A arrives late.
        tx_b.send(Ok(assessment(InteractionStatus::Warning, "B"))).unwrap();
        let b_outcome = b.await.unwrap().unwrap();
        assert!(matches!(b_outcome, SubmitOutcome::Succeeded { .. }));

        tx_a.send(Ok(assessment(InteractionStatus::Dangerous, "A"))).unwrap();
        let a_outcome = a.await.unwrap().unwrap();
        assert_eq!(a_outcome, SubmitOutcome::Superseded);

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.medications, "Atorvastatin");
        assert_eq!(state.food, "Grapefruit");
        assert_eq!(state.last_result.unwrap().details, "B");

        let history = h.orchestrator.history("").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].medications, "Atorvastatin");
    }

    #[tokio::test]
    async fn earlier_call_finishing_first_is_still_discarded() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let h = gated(vec![("Warfarin", rx_a), ("Atorvastatin", rx_b)]);

        let a = tokio::spawn({
            let o = h.orchestrator.clone();
            async move { o.run("Warfarin", "Spinach").await }
        });
        wait_for_calls(&h.calls, 1).await;
        let b = tokio::spawn({
            let o = h.orchestrator.clone();
            async move { o.run("Atorvastatin", "Grapefruit").await }
        });
        wait_for_calls(&h.calls, 2).await;

        tx_a.send(Ok(assessment(InteractionStatus::Safe, "A"))).unwrap();
        assert_eq!(a.await.unwrap().unwrap(), SubmitOutcome::Superseded);
        assert_eq!(h.orchestrator.snapshot().unwrap().phase, Phase::Checking);

        tx_b.send(Err(OracleError::EmptyResponse)).unwrap();
        assert!(matches!(b.await.unwrap().unwrap(), SubmitOutcome::Failed(_)));
        assert_eq!(h.orchestrator.snapshot().unwrap().phase, Phase::Failed);
        assert!(h.orchestrator.history("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_during_check_discards_answer() {
        let (tx, rx) = oneshot::channel();
        let h = gated(vec![("Warfarin", rx)]);

        let a = tokio::spawn({
            let o = h.orchestrator.clone();
            async move { o.run("Warfarin", "Spinach").await }
        });
        wait_for_calls(&h.calls, 1).await;

        // The session stays responsive while the call is pending.
        h.orchestrator.set_field(Field::Food, "Kale").unwrap();
        h.orchestrator.reset().unwrap();

        tx.send(Ok(assessment(InteractionStatus::Safe, "late"))).unwrap();
        assert_eq!(a.await.unwrap().unwrap(), SubmitOutcome::Superseded);

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.last_result.is_none());
    }

    // ── History passthroughs ─────────────────────────────────────────────────

    #[tokio::test]
    async fn load_from_history_skips_oracle() {
        let (h, _) = scripted(Ok(assessment(InteractionStatus::Caution, "a")));
        let entry = match h.orchestrator.run("Warfarin", "Spinach").await.unwrap() {
            SubmitOutcome::Succeeded { entry, .. } => entry,
            other => panic!("expected Succeeded, got {:?}", other),
        };
        h.orchestrator.reset().unwrap();

        let loaded = h.orchestrator.load_from_history(&entry.id).unwrap();
        assert_eq!(loaded, entry);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let state = h.orchestrator.snapshot().unwrap();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.medications, "Warfarin");

        assert!(h.orchestrator.load_from_history(&EntryId::from("missing")).is_err());
    }

    #[tokio::test]
    async fn favorite_and_clear_through_orchestrator() {
        let (h, _) = scripted(Ok(assessment(InteractionStatus::Caution, "a")));
        let entry = match h.orchestrator.run("Warfarin", "Spinach").await.unwrap() {
            SubmitOutcome::Succeeded { entry, .. } => entry,
            other => panic!("expected Succeeded, got {:?}", other),
        };

        let toggled = h.orchestrator.toggle_favorite(&entry.id).unwrap();
        assert_eq!(toggled.notice(), Notice::AddedToFavorites);

        let cleared = h.orchestrator.clear_history().unwrap();
        assert_eq!(cleared.clear_notice(), Notice::HistoryCleared);
        assert!(h.orchestrator.history("").unwrap().is_empty());
    }
}
