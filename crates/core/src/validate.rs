//! Batch validation: per-record rule checks plus intra-batch duplicate
//! detection.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::key::derive_grid_id;
use crate::model::{excerpt, GridRecord, RecordOutcome, ValidationIssue};
use crate::schema::GridSchema;

/// Validate a loaded batch in source order, one outcome per candidate.
///
/// Duplicate detection runs after the per-record checks and marks every
/// member of a duplicate group invalid, neither occurrence preferred: the
/// batch that reaches the store must carry no internal collisions. Cells
/// duplicates are detected first; derived-id duplicates second (for records
/// whose words match the matrix, distinct cells imply distinct ids barring a
/// hash collision, so the second check is a backstop).
pub fn validate_batch(records: &[Value], schema: &dyn GridSchema) -> Vec<RecordOutcome> {
    let mut outcomes: Vec<RecordOutcome> = Vec::with_capacity(records.len());
    for (index, raw) in records.iter().enumerate() {
        match schema.check_record(index, raw) {
            Ok(draft) => {
                let grid_id = derive_grid_id(&draft.cells, &draft.words_across, &draft.words_down);
                outcomes.push(RecordOutcome::Valid(GridRecord {
                    grid_id,
                    cells: draft.cells,
                    words_across: draft.words_across,
                    words_down: draft.words_down,
                    schema_version: schema.version(),
                }));
            }
            Err(issue) => outcomes.push(RecordOutcome::Invalid(issue)),
        }
    }

    let mut cells_counts: HashMap<&str, usize> = HashMap::new();
    for outcome in &outcomes {
        if let RecordOutcome::Valid(record) = outcome {
            *cells_counts.entry(record.cells.as_str()).or_insert(0) += 1;
        }
    }
    let duplicate_cells: Vec<String> = cells_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(cells, _)| cells.to_string())
        .collect();
    for (index, outcome) in outcomes.iter_mut().enumerate() {
        let dup = match outcome {
            RecordOutcome::Valid(record) if duplicate_cells.contains(&record.cells) => {
                Some(ValidationIssue {
                    index,
                    reason: "duplicate_cells_in_file".to_string(),
                    value: Some(excerpt(&record.cells)),
                })
            }
            _ => None,
        };
        if let Some(issue) = dup {
            *outcome = RecordOutcome::Invalid(issue);
        }
    }

    let mut id_counts: HashMap<Uuid, usize> = HashMap::new();
    for outcome in &outcomes {
        if let RecordOutcome::Valid(record) = outcome {
            *id_counts.entry(record.grid_id).or_insert(0) += 1;
        }
    }
    for (index, outcome) in outcomes.iter_mut().enumerate() {
        let dup = match outcome {
            RecordOutcome::Valid(record) if id_counts[&record.grid_id] > 1 => {
                Some(ValidationIssue {
                    index,
                    reason: "duplicate_grid_id_in_file".to_string(),
                    value: Some(record.grid_id.to_string()),
                })
            }
            _ => None,
        };
        if let Some(issue) = dup {
            *outcome = RecordOutcome::Invalid(issue);
        }
    }

    outcomes
}
