//! `lexgrid-io` — dataset files and the SQLite grid store.

pub mod dataset;
pub mod sqlite;

pub use dataset::{load_records, DatasetError};
pub use sqlite::SqliteGridStore;

/// Store format version, recorded in the `meta` table when a store file is
/// created. Increment when the schema changes in a way old builds can't read.
pub const STORE_FORMAT_VERSION: u32 = 1;
