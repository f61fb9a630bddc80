//! Shared types and models for the InventoryPro stock ledger
//!
//! This crate contains the ledger rules, product metrics and validation
//! shared between the backend, the browser front end (via WASM) and tests.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
