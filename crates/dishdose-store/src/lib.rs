//! # dishdose-store
//!
//! Durable store adapters for Dish & Dose.
//!
//! ## Overview
//!
//! Two implementations of [`DurableStore`](dishdose_core::traits::DurableStore):
//!
//! - [`InMemoryStore`]: a shared `HashMap`, for tests and throwaway sessions.
//! - [`FileStore`]: one file per key under a data directory, written with
//!   an atomic temp-file-and-rename.
//!
//! Both report failures as `DishDoseError::Persistence`. Deciding what a
//! failure means is left to the core, which degrades rather than aborts.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dishdose_store::FileStore;
//!
//! let store = Arc::new(FileStore::open(data_dir)?);
//! let ledger = HistoryLedger::load(store.clone(), Arc::new(SystemClock));
//! ```

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
