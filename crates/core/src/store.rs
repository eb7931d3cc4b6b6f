//! Store contract for grid records, plus an in-memory implementation.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use uuid::Uuid;

use crate::model::GridRecord;

/// Outcome of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with this grid id already exists. Under concurrent seeding a
    /// writer can land between our lookup and our insert; the store's
    /// uniqueness constraint is the backstop, and the engine counts this as
    /// a skip.
    DuplicateId,
}

/// Store-level failures.
#[derive(Debug)]
pub enum StoreError {
    /// The cells are already stored under a different grid id. The store and
    /// the content-derived key scheme disagree; validated input cannot cause
    /// this.
    CellsConflict { grid_id: Uuid, cells: String },
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::CellsConflict { grid_id, cells } => write!(
                f,
                "cells {} already stored under a different grid id (incoming {})",
                cells, grid_id
            ),
            StoreError::Backend(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl Error for StoreError {}

/// The two operations the seeding engine needs from a store.
///
/// Lookups must be fresh reads of current store state, never a cached view.
/// Inserts must enforce uniqueness of both the grid id and the cells.
pub trait GridStore {
    fn find_by_grid_id(&self, grid_id: &Uuid) -> Result<Option<GridRecord>, StoreError>;
    fn insert(&mut self, record: &GridRecord) -> Result<InsertOutcome, StoreError>;
}

/// Map-backed store for tests and embedders that have no SQLite file.
#[derive(Debug, Default)]
pub struct MemoryGridStore {
    grids: BTreeMap<Uuid, GridRecord>,
}

impl MemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl GridStore for MemoryGridStore {
    fn find_by_grid_id(&self, grid_id: &Uuid) -> Result<Option<GridRecord>, StoreError> {
        Ok(self.grids.get(grid_id).cloned())
    }

    fn insert(&mut self, record: &GridRecord) -> Result<InsertOutcome, StoreError> {
        if self.grids.contains_key(&record.grid_id) {
            return Ok(InsertOutcome::DuplicateId);
        }
        if self.grids.values().any(|g| g.cells == record.cells) {
            return Err(StoreError::CellsConflict {
                grid_id: record.grid_id,
                cells: record.cells.clone(),
            });
        }
        self.grids.insert(record.grid_id, record.clone());
        Ok(InsertOutcome::Inserted)
    }
}
