//! # dishdose-oracle
//!
//! Implementations of the [`Oracle`](dishdose_core::traits::Oracle) contract.
//!
//! ## Overview
//!
//! - [`GeminiOracle`]: calls the Gemini `generateContent` API with a
//!   structured-output schema and validates the answer before handing it on.
//! - [`MockOracle`]: a fixed offline table for demos and tests.
//!
//! Whatever the backend, a caller only ever sees an
//! [`AssessmentResult`](dishdose_contracts::assessment::AssessmentResult) or
//! an [`OracleError`](dishdose_contracts::error::OracleError). Raw model text
//! never leaves this crate.
//!
//! ## Configuration
//!
//! [`OracleConfig`] is loaded from TOML. See [`config`] for the fields and
//! their defaults.

pub mod config;
pub mod decode;
pub mod examples;
pub mod gemini;
pub mod mock;
pub mod prompt;

pub use config::OracleConfig;
pub use decode::decode_assessment;
pub use examples::{ExampleQuery, EXAMPLE_QUERIES};
pub use gemini::GeminiOracle;
pub use mock::MockOracle;

// ── Tests ─────────────────────────────────────────────────────────────────────
