//! `lexgrid seed` / `validate` / `stats` — dataset seeding commands.

use std::path::PathBuf;

use lexgrid_core::{schema_for, validate_batch, RecordOutcome, SchemaVersion, SeedOptions, ValidationIssue};
use lexgrid_io::{load_records, SqliteGridStore};

use crate::exit_codes::{
    seed_exit_code, EXIT_ERROR, EXIT_SEED_INVALID, EXIT_SEED_LOAD, EXIT_SEED_STORE,
    EXIT_SEED_WRITE, EXIT_SUCCESS,
};
use crate::CliError;

fn seed_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn resolve_schema(version: u32) -> Result<&'static dyn lexgrid_core::GridSchema, CliError> {
    schema_for(SchemaVersion(version)).ok_or_else(|| {
        CliError::usage(format!("unknown schema version: {version}"))
            .with_hint("version 1 is the only published ruleset")
    })
}

fn print_issue(issue: &ValidationIssue) {
    match &issue.value {
        Some(value) => eprintln!("record {}: {} ({})", issue.index, issue.reason, value),
        None => eprintln!("record {}: {}", issue.index, issue.reason),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_seed(
    data: PathBuf,
    store_path: PathBuf,
    schema_version: u32,
    dry_run: bool,
    limit: Option<usize>,
    continue_on_error: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let schema = resolve_schema(schema_version)?;

    let records = load_records(&data, limit)
        .map_err(|e| seed_err(EXIT_SEED_LOAD, e.to_string()))?;

    let mut store = SqliteGridStore::open(&store_path)
        .map_err(|e| seed_err(EXIT_SEED_STORE, format!("cannot open store {}: {}", store_path.display(), e)))?;

    let options = SeedOptions { dry_run, limit, continue_on_error };
    let report = lexgrid_core::seed::run(&mut store, &records, schema, &options);

    if !quiet {
        for issue in &report.issues {
            print_issue(issue);
        }
        for failure in &report.write_failures {
            eprintln!("record {}: write failed for {}: {}", failure.index, failure.grid_id, failure.message);
        }
    }

    // Output
    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| seed_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| seed_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "seeded {}: {} records — {} valid, {} invalid, {} inserted, {} skipped, {} write errors{}{}",
        data.display(),
        s.total_records,
        s.valid_count,
        s.invalid_count,
        s.inserted_count,
        s.skipped_count,
        s.write_error_count,
        if s.dry_run { " (dry run)" } else { "" },
        if s.aborted { " (aborted)" } else { "" },
    );

    match seed_exit_code(s) {
        EXIT_SUCCESS => Ok(()),
        EXIT_SEED_WRITE => Err(seed_err(EXIT_SEED_WRITE, "write errors during commit")),
        code => {
            let err = seed_err(code, "invalid records in batch");
            if continue_on_error {
                Err(err)
            } else {
                Err(err.with_hint("fix the records or pass --continue-on-error to seed past them"))
            }
        }
    }
}

pub fn cmd_validate(
    data: PathBuf,
    schema_version: u32,
    limit: Option<usize>,
    json_output: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let schema = resolve_schema(schema_version)?;

    let records = load_records(&data, limit)
        .map_err(|e| seed_err(EXIT_SEED_LOAD, e.to_string()))?;

    let outcomes = validate_batch(&records, schema);
    let issues: Vec<ValidationIssue> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RecordOutcome::Valid(_) => None,
            RecordOutcome::Invalid(issue) => Some(issue.clone()),
        })
        .collect();

    let total = outcomes.len();
    let invalid = issues.len();

    if !quiet {
        for issue in &issues {
            print_issue(issue);
        }
    }

    if json_output {
        #[derive(serde::Serialize)]
        struct ValidateReport {
            total_records: usize,
            valid_count: usize,
            invalid_count: usize,
            issues: Vec<ValidationIssue>,
        }
        let report = ValidateReport {
            total_records: total,
            valid_count: total - invalid,
            invalid_count: invalid,
            issues,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| seed_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "validated {}: {} records — {} valid, {} invalid",
        data.display(),
        total,
        total - invalid,
        invalid,
    );

    if invalid > 0 {
        return Err(seed_err(EXIT_SEED_INVALID, "invalid records in batch"));
    }
    Ok(())
}

pub fn cmd_stats(store_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let store = SqliteGridStore::open(&store_path)
        .map_err(|e| seed_err(EXIT_SEED_STORE, format!("cannot open store {}: {}", store_path.display(), e)))?;

    let grids = store
        .count()
        .map_err(|e| seed_err(EXIT_SEED_STORE, e.to_string()))?;

    if json_output {
        #[derive(serde::Serialize)]
        struct StatsReport {
            store: String,
            grids: usize,
        }
        let report = StatsReport { store: store_path.display().to_string(), grids };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| seed_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        println!("{} grids in {}", grids, store_path.display());
    }

    Ok(())
}
