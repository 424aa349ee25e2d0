//! # dishdose-core
//!
//! The request lifecycle and history core of Dish & Dose.
//!
//! This crate provides:
//! - The three seams (`DurableStore`, `Oracle`, `Clock`)
//! - `LifecycleMachine`: idle → checking → succeeded / failed, with
//!   sequence-numbered tickets so late answers cannot clobber newer state
//! - `HistoryLedger`: the deduplicated, persisted record of past checks
//! - `Orchestrator`: runs one oracle call between the two
//! - `Preferences`: theme and welcome flag
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dishdose_core::{HistoryLedger, Orchestrator, SystemClock};
//!
//! let ledger = HistoryLedger::load(store.clone(), Arc::new(SystemClock));
//! let orchestrator = Orchestrator::new(Box::new(oracle), ledger);
//! let outcome = orchestrator.run("Warfarin", "Spinach").await?;
//! ```

pub mod ledger;
pub mod lifecycle;
pub mod notice;
pub mod orchestrator;
pub mod persist;
pub mod preferences;
pub mod traits;

#[cfg(test)]
mod testing;

pub use ledger::{FavoriteToggle, HistoryLedger};
pub use lifecycle::{CheckTicket, Completion, Field, LifecycleMachine, LifecycleState, Phase};
pub use notice::{Notice, NoticeLevel};
pub use orchestrator::{Orchestrator, SubmitOutcome};
pub use persist::Persisted;
pub use preferences::Preferences;
pub use traits::{Clock, DurableStore, Oracle, SystemClock};
