use serde::Serialize;
use uuid::Uuid;

/// Side length of a grid. Rows, columns, and words all share it.
pub const GRID_SIZE: usize = 5;

/// Number of cells in the row-major `cells` string.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Tag naming the validation ruleset a record was checked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaVersion(pub u32);

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable puzzle definition.
///
/// `grid_id` is the natural key, derived from the normalized content; there
/// is no server-generated identifier anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRecord {
    pub grid_id: Uuid,
    /// 25 uppercase ASCII letters, row-major.
    pub cells: String,
    /// One five-letter word per row, top to bottom.
    pub words_across: Vec<String>,
    /// One five-letter word per column, left to right.
    pub words_down: Vec<String>,
    pub schema_version: SchemaVersion,
}

// ---------------------------------------------------------------------------
// Validation outcomes
// ---------------------------------------------------------------------------

/// A single violated rule for one candidate record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// 0-based position of the record in source order.
    pub index: usize,
    /// Reason code (see the table in `schema`).
    pub reason: String,
    /// Offending value excerpt, capped at 40 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Validation result per candidate, in source order. An `Invalid` outcome is
/// data, never a raised failure.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Valid(GridRecord),
    Invalid(ValidationIssue),
}

impl RecordOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, RecordOutcome::Valid(_))
    }
}

/// Cap an issue value at 40 characters, ellipsized.
pub(crate) fn excerpt(value: &str) -> String {
    const MAX: usize = 40;
    if value.chars().count() <= MAX {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX - 3).collect();
        format!("{head}...")
    }
}

// ---------------------------------------------------------------------------
// Reconciliation & commit
// ---------------------------------------------------------------------------

/// Decision for one valid record against the current store state. Content is
/// immutable, so there is no update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationDecision {
    Insert,
    SkipExisting,
}

/// A store failure while committing one record.
#[derive(Debug, Clone, Serialize)]
pub struct WriteFailure {
    /// 0-based position of the record in source order.
    pub index: usize,
    pub grid_id: Uuid,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Mode flags for one run.
#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    /// Validate and reconcile, but write nothing.
    pub dry_run: bool,
    /// Cap applied by the loader; carried here for reporting.
    pub limit: Option<usize>,
    /// Keep going past invalid records and write failures.
    pub continue_on_error: bool,
}

/// Aggregate counters for one run.
///
/// Invariants, in every run: `total_records == valid_count + invalid_count`
/// and `valid_count == inserted_count + skipped_count`. `skipped_count`
/// covers every valid record that was not inserted: already present, lost a
/// uniqueness race, failed to write, or never attempted because the run
/// aborted. Write failures are additionally counted in `write_error_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedSummary {
    pub total_records: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub write_error_count: usize,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub continue_on_error: bool,
    pub aborted: bool,
}

impl SeedSummary {
    /// A clean run: nothing invalid, nothing failed to write. Only a clean
    /// run exits with status 0.
    pub fn is_clean(&self) -> bool {
        self.invalid_count == 0 && self.write_error_count == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedMeta {
    pub engine_version: String,
    pub run_at: String,
    pub schema_version: SchemaVersion,
}

/// The single structured output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub meta: SeedMeta,
    pub summary: SeedSummary,
    pub issues: Vec<ValidationIssue>,
    pub write_failures: Vec<WriteFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_passes_short_values_through() {
        assert_eq!(excerpt("HELLO"), "HELLO");
        assert_eq!(excerpt(&"A".repeat(40)), "A".repeat(40));
    }

    #[test]
    fn excerpt_ellipsizes_long_values() {
        let long = "B".repeat(41);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), 40);
        assert!(cut.ends_with("..."));
        assert!(cut.starts_with("BBB"));
    }

    #[test]
    fn clean_summary_requires_no_invalid_and_no_write_errors() {
        let mut summary = SeedSummary {
            total_records: 2,
            valid_count: 2,
            invalid_count: 0,
            inserted_count: 2,
            skipped_count: 0,
            write_error_count: 0,
            dry_run: false,
            limit: None,
            continue_on_error: false,
            aborted: false,
        };
        assert!(summary.is_clean());

        summary.invalid_count = 1;
        assert!(!summary.is_clean());

        summary.invalid_count = 0;
        summary.write_error_count = 1;
        assert!(!summary.is_clean());
    }
}
