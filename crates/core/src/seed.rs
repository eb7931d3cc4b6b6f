//! The seeding engine: validate a loaded batch, reconcile valid records
//! against the store, commit the missing ones, and report.
//!
//! Every per-record failure mode is data in the returned report; the caller
//! maps the summary onto an exit status. Only the loader, which runs before
//! this engine, can fail the run without producing a report.

use std::collections::HashSet;

use serde_json::Value;

use crate::model::{
    GridRecord, ReconciliationDecision, RecordOutcome, SeedMeta, SeedOptions, SeedReport,
    SeedSummary, ValidationIssue, WriteFailure,
};
use crate::schema::GridSchema;
use crate::store::{GridStore, InsertOutcome, StoreError};
use crate::validate::validate_batch;

/// Decide whether one valid record needs inserting. Always a fresh lookup:
/// the store is the single source of truth for "already exists".
pub fn reconcile(
    store: &dyn GridStore,
    record: &GridRecord,
) -> Result<ReconciliationDecision, StoreError> {
    Ok(match store.find_by_grid_id(&record.grid_id)? {
        Some(_) => ReconciliationDecision::SkipExisting,
        None => ReconciliationDecision::Insert,
    })
}

enum CommitOutcome {
    Inserted,
    Skipped,
}

/// Reconcile-then-commit for one record. In dry-run mode an `Insert`
/// decision counts as if the write would succeed; nothing touches the store
/// beyond the lookup.
fn commit_one(
    store: &mut dyn GridStore,
    record: &GridRecord,
    dry_run: bool,
) -> Result<CommitOutcome, StoreError> {
    match reconcile(store, record)? {
        ReconciliationDecision::SkipExisting => Ok(CommitOutcome::Skipped),
        ReconciliationDecision::Insert if dry_run => Ok(CommitOutcome::Inserted),
        ReconciliationDecision::Insert => match store.insert(record)? {
            InsertOutcome::Inserted => Ok(CommitOutcome::Inserted),
            InsertOutcome::DuplicateId => Ok(CommitOutcome::Skipped),
        },
    }
}

/// Run the pipeline over an already-loaded batch.
///
/// Validation always covers the whole batch, so the validation counters
/// describe the full input. Without `continue_on_error` the commit walk stops
/// at the first invalid or write-failed record: earlier inserts stand, and
/// valid records never attempted count as skipped. Writes are per-record;
/// there is no cross-record transaction and no rollback.
pub fn run(
    store: &mut dyn GridStore,
    records: &[Value],
    schema: &dyn GridSchema,
    options: &SeedOptions,
) -> SeedReport {
    let outcomes = validate_batch(records, schema);

    let total_records = outcomes.len();
    let valid_count = outcomes.iter().filter(|o| o.is_valid()).count();
    let invalid_count = total_records - valid_count;
    let issues: Vec<ValidationIssue> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RecordOutcome::Invalid(issue) => Some(issue.clone()),
            RecordOutcome::Valid(_) => None,
        })
        .collect();

    let mut inserted_count = 0;
    let mut skipped_count = 0;
    let mut write_failures: Vec<WriteFailure> = Vec::new();
    let mut aborted = false;

    // The duplicate pass guarantees no two valid records share an id.
    let mut walked_ids: HashSet<uuid::Uuid> = HashSet::new();

    for (position, outcome) in outcomes.iter().enumerate() {
        match outcome {
            RecordOutcome::Invalid(_) => {
                if !options.continue_on_error {
                    aborted = true;
                    skipped_count += remaining_valid(&outcomes[position + 1..]);
                    break;
                }
            }
            RecordOutcome::Valid(record) => {
                debug_assert!(
                    walked_ids.insert(record.grid_id),
                    "duplicate grid id reached the commit walk"
                );
                match commit_one(store, record, options.dry_run) {
                    Ok(CommitOutcome::Inserted) => inserted_count += 1,
                    Ok(CommitOutcome::Skipped) => skipped_count += 1,
                    Err(err) => {
                        skipped_count += 1;
                        write_failures.push(WriteFailure {
                            index: position,
                            grid_id: record.grid_id,
                            message: err.to_string(),
                        });
                        if !options.continue_on_error {
                            aborted = true;
                            skipped_count += remaining_valid(&outcomes[position + 1..]);
                            break;
                        }
                    }
                }
            }
        }
    }

    let summary = SeedSummary {
        total_records,
        valid_count,
        invalid_count,
        inserted_count,
        skipped_count,
        write_error_count: write_failures.len(),
        dry_run: options.dry_run,
        limit: options.limit,
        continue_on_error: options.continue_on_error,
        aborted,
    };

    SeedReport {
        meta: SeedMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            schema_version: schema.version(),
        },
        summary,
        issues,
        write_failures,
    }
}

fn remaining_valid(outcomes: &[RecordOutcome]) -> usize {
    outcomes.iter().filter(|o| o.is_valid()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaVersion;
    use crate::schema::schema_for;
    use crate::store::MemoryGridStore;
    use serde_json::json;
    use uuid::Uuid;

    fn v1() -> &'static dyn GridSchema {
        schema_for(SchemaVersion(1)).unwrap()
    }

    fn grid_from_cells(cells: &str) -> Value {
        let bytes = cells.as_bytes();
        let across: Vec<String> = (0..5)
            .map(|row| String::from_utf8_lossy(&bytes[row * 5..(row + 1) * 5]).to_string())
            .collect();
        let down: Vec<String> = (0..5)
            .map(|col| (0..5).map(|row| bytes[row * 5 + col] as char).collect())
            .collect();
        json!({ "cells": cells, "words_across": across, "words_down": down })
    }

    fn uniform(letter: char) -> String {
        letter.to_string().repeat(25)
    }

    /// Batch of n distinct valid records.
    fn batch(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| grid_from_cells(&uniform((b'A' + i as u8) as char)))
            .collect()
    }

    fn defaults() -> SeedOptions {
        SeedOptions::default()
    }

    fn tolerant() -> SeedOptions {
        SeedOptions {
            continue_on_error: true,
            ..SeedOptions::default()
        }
    }

    fn check_invariants(summary: &SeedSummary) {
        assert_eq!(
            summary.total_records,
            summary.valid_count + summary.invalid_count
        );
        assert_eq!(
            summary.valid_count,
            summary.inserted_count + summary.skipped_count
        );
    }

    #[test]
    fn first_run_inserts_second_run_skips() {
        let mut store = MemoryGridStore::new();
        let records = batch(3);

        let first = run(&mut store, &records, v1(), &defaults());
        assert_eq!(first.summary.inserted_count, 3);
        assert_eq!(first.summary.skipped_count, 0);
        assert!(first.summary.is_clean());
        check_invariants(&first.summary);
        assert_eq!(store.len(), 3);

        let second = run(&mut store, &records, v1(), &defaults());
        assert_eq!(second.summary.inserted_count, 0);
        assert_eq!(second.summary.skipped_count, 3);
        assert!(second.summary.is_clean());
        check_invariants(&second.summary);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn dry_run_counts_would_be_inserts_but_writes_nothing() {
        let mut store = MemoryGridStore::new();
        let records = batch(2);
        run(
            &mut store,
            &records[..1],
            v1(),
            &defaults(),
        );
        assert_eq!(store.len(), 1);

        let options = SeedOptions {
            dry_run: true,
            ..SeedOptions::default()
        };
        let report = run(&mut store, &records, v1(), &options);
        assert_eq!(report.summary.inserted_count, 1);
        assert_eq!(report.summary.skipped_count, 1);
        assert!(report.summary.dry_run);
        check_invariants(&report.summary);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn default_mode_aborts_at_first_invalid_record() {
        // Ten records; the third and seventh are missing a required key.
        let mut records = batch(10);
        records[2].as_object_mut().unwrap().remove("cells");
        records[6].as_object_mut().unwrap().remove("cells");

        let mut store = MemoryGridStore::new();
        let report = run(&mut store, &records, v1(), &defaults());

        assert_eq!(report.summary.total_records, 10);
        assert_eq!(report.summary.valid_count, 8);
        assert_eq!(report.summary.invalid_count, 2);
        assert_eq!(report.summary.inserted_count, 2);
        assert_eq!(report.summary.skipped_count, 6);
        assert!(report.summary.aborted);
        assert!(!report.summary.is_clean());
        check_invariants(&report.summary);
        assert_eq!(store.len(), 2);

        // Validation still described the whole batch.
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].index, 2);
        assert_eq!(report.issues[1].index, 6);
    }

    #[test]
    fn continue_on_error_attempts_every_record() {
        let mut records = batch(10);
        records[2].as_object_mut().unwrap().remove("cells");
        records[6].as_object_mut().unwrap().remove("cells");

        let mut store = MemoryGridStore::new();
        let report = run(&mut store, &records, v1(), &tolerant());

        assert_eq!(report.summary.invalid_count, 2);
        assert_eq!(report.summary.inserted_count, 8);
        assert_eq!(report.summary.skipped_count, 0);
        assert!(!report.summary.aborted);
        assert!(!report.summary.is_clean());
        check_invariants(&report.summary);
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn batch_duplicates_insert_nothing_for_the_group() {
        let records = vec![
            grid_from_cells(&uniform('A')),
            grid_from_cells(&uniform('B')),
            grid_from_cells(&uniform('A')),
        ];
        let mut store = MemoryGridStore::new();
        let report = run(&mut store, &records, v1(), &tolerant());

        assert_eq!(report.summary.invalid_count, 2);
        assert_eq!(report.summary.inserted_count, 1);
        check_invariants(&report.summary);
        assert_eq!(store.len(), 1);
        assert!(report
            .issues
            .iter()
            .all(|i| i.reason == "duplicate_cells_in_file"));
    }

    #[test]
    fn empty_batch_reports_zero_everything_and_is_clean() {
        let mut store = MemoryGridStore::new();
        let report = run(&mut store, &[], v1(), &defaults());
        assert_eq!(report.summary.total_records, 0);
        assert_eq!(report.summary.inserted_count, 0);
        assert!(report.summary.is_clean());
        assert!(!report.summary.aborted);
        check_invariants(&report.summary);
    }

    #[test]
    fn report_meta_names_engine_and_schema() {
        let mut store = MemoryGridStore::new();
        let report = run(&mut store, &[], v1(), &defaults());
        assert_eq!(report.meta.schema_version, SchemaVersion(1));
        assert_eq!(report.meta.engine_version, env!("CARGO_PKG_VERSION"));
        assert!(!report.meta.run_at.is_empty());
    }

    // -----------------------------------------------------------------------
    // Store doubles for the failure paths
    // -----------------------------------------------------------------------

    /// Fails every insert whose cells match, with a backend error.
    struct FlakyStore {
        inner: MemoryGridStore,
        poison_cells: String,
    }

    impl GridStore for FlakyStore {
        fn find_by_grid_id(&self, grid_id: &Uuid) -> Result<Option<GridRecord>, StoreError> {
            self.inner.find_by_grid_id(grid_id)
        }

        fn insert(&mut self, record: &GridRecord) -> Result<InsertOutcome, StoreError> {
            if record.cells == self.poison_cells {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.inner.insert(record)
        }
    }

    /// Never sees existing rows on lookup, simulating a concurrent writer
    /// landing between reconcile and insert.
    struct StaleReadStore {
        inner: MemoryGridStore,
    }

    impl GridStore for StaleReadStore {
        fn find_by_grid_id(&self, _grid_id: &Uuid) -> Result<Option<GridRecord>, StoreError> {
            Ok(None)
        }

        fn insert(&mut self, record: &GridRecord) -> Result<InsertOutcome, StoreError> {
            self.inner.insert(record)
        }
    }

    #[test]
    fn write_failure_aborts_by_default_and_is_counted() {
        let mut store = FlakyStore {
            inner: MemoryGridStore::new(),
            poison_cells: uniform('B'),
        };
        let report = run(&mut store, &batch(3), v1(), &defaults());

        assert_eq!(report.summary.inserted_count, 1);
        assert_eq!(report.summary.skipped_count, 2);
        assert_eq!(report.summary.write_error_count, 1);
        assert!(report.summary.aborted);
        assert!(!report.summary.is_clean());
        check_invariants(&report.summary);

        assert_eq!(report.write_failures.len(), 1);
        assert_eq!(report.write_failures[0].index, 1);
        assert!(report.write_failures[0].message.contains("disk full"));
    }

    #[test]
    fn write_failure_with_continue_on_error_keeps_going() {
        let mut store = FlakyStore {
            inner: MemoryGridStore::new(),
            poison_cells: uniform('B'),
        };
        let report = run(&mut store, &batch(3), v1(), &tolerant());

        assert_eq!(report.summary.inserted_count, 2);
        assert_eq!(report.summary.skipped_count, 1);
        assert_eq!(report.summary.write_error_count, 1);
        assert!(!report.summary.aborted);
        check_invariants(&report.summary);
        assert_eq!(store.inner.len(), 2);
    }

    #[test]
    fn losing_an_insert_race_counts_as_a_skip() {
        let mut store = StaleReadStore {
            inner: MemoryGridStore::new(),
        };
        let records = batch(1);
        run(&mut store, &records, v1(), &defaults());

        // Second run: the stale lookup says absent, the insert collides.
        let report = run(&mut store, &records, v1(), &defaults());
        assert_eq!(report.summary.inserted_count, 0);
        assert_eq!(report.summary.skipped_count, 1);
        assert_eq!(report.summary.write_error_count, 0);
        assert!(report.summary.is_clean());
        check_invariants(&report.summary);
    }

    #[test]
    fn cells_stored_under_another_id_is_a_write_error() {
        let mut store = MemoryGridStore::new();
        let foreign = GridRecord {
            grid_id: Uuid::from_u128(0xDEAD),
            cells: uniform('A'),
            words_across: vec!["AAAAA".to_string(); 5],
            words_down: vec!["AAAAA".to_string(); 5],
            schema_version: SchemaVersion(1),
        };
        store.insert(&foreign).unwrap();

        let report = run(&mut store, &batch(1), v1(), &tolerant());
        assert_eq!(report.summary.inserted_count, 0);
        assert_eq!(report.summary.skipped_count, 1);
        assert_eq!(report.summary.write_error_count, 1);
        assert!(!report.summary.is_clean());
        check_invariants(&report.summary);
        assert!(report.write_failures[0]
            .message
            .contains("different grid id"));
    }

    #[test]
    fn dry_run_aborts_on_invalid_records_like_a_real_run() {
        let mut records = batch(3);
        records[1].as_object_mut().unwrap().remove("cells");

        let mut store = MemoryGridStore::new();
        let options = SeedOptions {
            dry_run: true,
            ..SeedOptions::default()
        };
        let report = run(&mut store, &records, v1(), &options);

        assert_eq!(report.summary.inserted_count, 1);
        assert_eq!(report.summary.skipped_count, 1);
        assert_eq!(report.summary.invalid_count, 1);
        assert!(report.summary.aborted);
        check_invariants(&report.summary);
        assert_eq!(store.len(), 0);
    }
}
