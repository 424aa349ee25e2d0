//! The request lifecycle machine: one interactive check at a time.
//!
//! ```text
//!            submit (valid)                 complete(Ok)
//!   Idle ───────────────────► Checking ─────────────────► Succeeded
//!    ▲                          │  ▲                          │
//!    │ reset                    │  │ submit (supersedes)      │ submit
//!    │                          ▼  │                          ▼
//!    └──────────────────────── Failed ◄──────────────── Checking ...
//!                      complete(Err) / submit (invalid)
//! ```
//!
//! Every accepted submit issues a `CheckTicket` carrying a sequence number.
//! Only the ticket issued last is current; completing any other ticket is a
//! no-op. This is how a late answer from a superseded call is kept from
//! overwriting newer state.
//!
//! The machine owns no I/O and never calls the oracle. The orchestrator
//! drives it from outside.

use tracing::debug;

use dishdose_contracts::{
    assessment::AssessmentResult,
    error::CheckFailure,
    history::HistoryEntry,
};

/// One of the two editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Medications,
    Food,
}

/// Where the current request stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Succeeded,
    Failed,
}

/// The live, unpersisted form and request state.
///
/// `last_result` is only ever set while `phase == Succeeded`, and
/// `last_error` only while `phase == Failed`. Field edits may clear either
/// without moving `phase`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LifecycleState {
    pub medications: String,
    pub food: String,
    pub phase: Phase,
    pub last_result: Option<AssessmentResult>,
    pub last_error: Option<CheckFailure>,
}

impl LifecycleState {
    /// The message to show for the current failure, if any.
    pub fn error_message(&self) -> Option<&'static str> {
        self.last_error.as_ref().map(CheckFailure::user_message)
    }

    pub fn is_checking(&self) -> bool {
        self.phase == Phase::Checking
    }
}

/// Proof that a submit was accepted, and the inputs it was accepted with.
///
/// Hand it back to `LifecycleMachine::complete` together with the oracle's
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    seq: u64,
    medications: String,
    food: String,
}

impl CheckTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Medication text exactly as submitted.
    pub fn medications(&self) -> &str {
        &self.medications
    }

    /// Food text exactly as submitted.
    pub fn food(&self) -> &str {
        &self.food
    }
}

/// What `complete` did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The ticket was current; the outcome is now displayed.
    Applied,
    /// A newer submit, a reset, or a history load superseded the ticket.
    /// State was left untouched.
    Stale,
}

/// The lifecycle state machine.
#[derive(Debug, Default)]
pub struct LifecycleMachine {
    state: LifecycleState,
    /// Last sequence number handed out. Strictly increasing.
    issued: u64,
    /// Sequence number of the ticket whose outcome may still be applied.
    current: Option<u64>,
}

impl LifecycleMachine {
    /// A machine in the initial empty `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Sequence number of the in-flight check, if one is current.
    pub fn in_flight(&self) -> Option<u64> {
        self.current
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Replace one field's text. Legal in any phase.
    ///
    /// Clears any displayed result or error but leaves `phase` alone, and
    /// does not cancel a check already in flight.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Medications => self.state.medications = value,
            Field::Food => self.state.food = value,
        }
        self.state.last_result = None;
        self.state.last_error = None;
    }

    /// Submit the current field values.
    pub fn submit(&mut self) -> Result<CheckTicket, CheckFailure> {
        let medications = self.state.medications.clone();
        let food = self.state.food.clone();
        self.submit_pair(medications, food)
    }

    /// Submit an explicit pair without first copying it into the fields.
    ///
    /// The fields take the submitted values only once the check succeeds.
    /// A blank medication or food moves straight to `Failed` with a
    /// validation error and returns `Err`; no ticket is issued, and any
    /// check still in flight is invalidated.
    pub fn submit_pair(
        &mut self,
        medications: impl Into<String>,
        food: impl Into<String>,
    ) -> Result<CheckTicket, CheckFailure> {
        let medications = medications.into();
        let food = food.into();

        if medications.trim().is_empty() || food.trim().is_empty() {
            self.invalidate_in_flight();
            self.state.phase = Phase::Failed;
            self.state.last_result = None;
            self.state.last_error = Some(CheckFailure::Validation);
            debug!("submit rejected: blank medications or food");
            return Err(CheckFailure::Validation);
        }

        self.issued += 1;
        let seq = self.issued;
        if let Some(previous) = self.current.replace(seq) {
            debug!(previous, seq, "new submit supersedes in-flight check");
        }

        self.state.phase = Phase::Checking;
        self.state.last_result = None;
        self.state.last_error = None;
        debug!(seq, "check started");

        Ok(CheckTicket { seq, medications, food })
    }

    /// Apply the oracle's outcome for `ticket`.
    ///
    /// Returns `Completion::Stale` and changes nothing unless `ticket` is
    /// the current one.
    pub fn complete(
        &mut self,
        ticket: &CheckTicket,
        outcome: &Result<AssessmentResult, CheckFailure>,
    ) -> Completion {
        if self.current != Some(ticket.seq) {
            debug!(
                seq = ticket.seq,
                current = ?self.current,
                "discarding outcome of superseded check"
            );
            return Completion::Stale;
        }
        self.current = None;

        match outcome {
            Ok(result) => {
                self.state.medications = ticket.medications.clone();
                self.state.food = ticket.food.clone();
                self.state.phase = Phase::Succeeded;
                self.state.last_result = Some(result.clone());
                self.state.last_error = None;
                debug!(seq = ticket.seq, status = %result.status, "check succeeded");
            }
            Err(failure) => {
                self.state.phase = Phase::Failed;
                self.state.last_result = None;
                self.state.last_error = Some(failure.clone());
                debug!(seq = ticket.seq, error = %failure, "check failed");
            }
        }
        Completion::Applied
    }

    /// Return to the initial empty state, discarding edits, any displayed
    /// outcome, and any check in flight.
    pub fn reset(&mut self) {
        self.invalidate_in_flight();
        self.state = LifecycleState::default();
    }

    /// Show a past entry as if it had just been checked.
    ///
    /// Never calls the oracle and never modifies `entry`. Invalidates any
    /// check in flight so its late answer cannot replace what was loaded.
    pub fn load_from(&mut self, entry: &HistoryEntry) {
        self.invalidate_in_flight();
        self.state.medications = entry.medications.clone();
        self.state.food = entry.food.clone();
        self.state.phase = Phase::Succeeded;
        self.state.last_result = Some(entry.result.clone());
        self.state.last_error = None;
    }

    fn invalidate_in_flight(&mut self) {
        if let Some(seq) = self.current.take() {
            debug!(seq, "in-flight check invalidated");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
