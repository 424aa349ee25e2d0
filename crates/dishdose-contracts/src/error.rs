//! Error types for Dish & Dose.
//!
//! Two audiences read these errors. The `Display` text of every variant is
//! the technical form and goes to the log. Anything shown to the user comes
//! from `user_message()`, which never includes oracle or storage detail.

use thiserror::Error;

// ── Oracle failures ───────────────────────────────────────────────────────────

/// The ways an oracle call can fail, as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Credentials or other required configuration are missing.
    #[error("oracle not configured: {reason}")]
    NotConfigured { reason: String },

    /// The oracle answered with no content.
    #[error("oracle returned an empty response")]
    EmptyResponse,

    /// The content was not JSON, or was JSON of the wrong shape
    /// (missing field, unrecognized status or severity).
    #[error("oracle response malformed: {reason}")]
    MalformedResponse { reason: String },

    /// Network failure, rate limit, server fault, or anything else.
    #[error("oracle transport failure: {reason}")]
    Transport { reason: String },
}

impl OracleError {
    /// The single message the user sees for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            OracleError::NotConfigured { .. } => {
                "The application is not configured correctly. Please contact support."
            }
            OracleError::EmptyResponse => {
                "The AI advisor returned an empty response. This might happen if the query is unclear. Please try rephrasing."
            }
            OracleError::MalformedResponse { .. } => {
                "The AI advisor returned a response in an unexpected format. Please try rephrasing your query."
            }
            OracleError::Transport { .. } => {
                "Could not connect to the AI advisor. Please check your internet connection and try again."
            }
        }
    }
}

// ── Check failures ────────────────────────────────────────────────────────────

/// Why a check ended in the `Failed` phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckFailure {
    /// Medications or food was blank at submit time. Never reaches the oracle.
    #[error("validation failed: medications and food are both required")]
    Validation,

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl CheckFailure {
    pub const VALIDATION_MESSAGE: &'static str =
        "Please enter both medication(s) and a food/beverage.";

    pub fn user_message(&self) -> &'static str {
        match self {
            CheckFailure::Validation => Self::VALIDATION_MESSAGE,
            CheckFailure::Oracle(e) => e.user_message(),
        }
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

/// Which store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Read,
    Write,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreOperation::Read => f.write_str("read"),
            StoreOperation::Write => f.write_str("write"),
        }
    }
}

/// A store read or write that did not succeed.
///
/// Returned next to a successful result, never in place of one: the
/// in-memory state has already changed by the time this is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store {operation} of '{key}' failed: {reason}")]
pub struct PersistenceWarning {
    pub key: String,
    pub operation: StoreOperation,
    pub reason: String,
}

// ── Unified error ─────────────────────────────────────────────────────────────

/// The unified error type for fallible Dish & Dose operations.
#[derive(Debug, Error)]
pub enum DishDoseError {
    /// No history entry carries the requested ID.
    #[error("history entry '{id}' not found")]
    EntryNotFound { id: String },

    /// A durable store could not complete a read or write.
    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Session state is unusable, e.g. a poisoned lock.
    #[error("state machine error: {reason}")]
    StateMachine { reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the Dish & Dose crates.
pub type DishDoseResult<T> = Result<T, DishDoseError>;
