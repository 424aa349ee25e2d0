//! # dishdose-contracts
//!
//! Shared types, persisted formats, and error contracts for Dish & Dose.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod assessment;
pub mod error;
pub mod history;
pub mod storage;

pub use assessment::{AssessmentResult, InteractionStatus, SeverityLevel};
pub use error::{
    CheckFailure, DishDoseError, DishDoseResult, OracleError, PersistenceWarning, StoreOperation,
};
pub use history::{normalize, EntryId, HistoryEntry};
pub use storage::{Theme, HISTORY_KEY, THEME_KEY, WELCOMED_KEY};
