//! `lexgrid-core` — grid records, validation rulesets, and the seeding engine.
//!
//! Pure engine crate: receives pre-loaded raw records and a store capability,
//! returns a structured report. No CLI or file IO dependencies.

pub mod key;
pub mod model;
pub mod schema;
pub mod seed;
pub mod store;
pub mod validate;

pub use key::derive_grid_id;
pub use model::{
    GridRecord, RecordOutcome, SchemaVersion, SeedOptions, SeedReport, SeedSummary,
    ValidationIssue,
};
pub use schema::{schema_for, GridSchema};
pub use seed::run;
pub use store::{GridStore, InsertOutcome, MemoryGridStore, StoreError};
pub use validate::validate_batch;
