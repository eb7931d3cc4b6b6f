// lexgrid CLI - word grid dataset seeding, headless

mod exit_codes;
mod seed;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "lexgrid")]
#[command(about = "Validate word grid datasets and seed them into a store")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset, validate it, and commit new grids to the store
    #[command(after_help = "\
Examples:
  lexgrid seed
  lexgrid seed --data data/grids.json --store lexgrid.db
  lexgrid seed --dry-run --json
  lexgrid seed --limit 100 --continue-on-error --output report.json")]
    Seed {
        /// Dataset file (.json array or .jsonl lines)
        #[arg(long, env = "LEXGRID_DATA", default_value = "data/grids.json")]
        data: PathBuf,

        /// SQLite store path
        #[arg(long, env = "LEXGRID_STORE", default_value = "lexgrid.db")]
        store: PathBuf,

        /// Validation ruleset version
        #[arg(long, default_value_t = 1)]
        schema_version: u32,

        /// Validate and reconcile without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Load at most N records from the dataset
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Keep going past invalid records and write failures
        #[arg(long)]
        continue_on_error: bool,

        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Suppress per-record issue lines on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a dataset without touching any store
    #[command(after_help = "\
Examples:
  lexgrid validate --data data/grids.json
  lexgrid validate --data batch.jsonl --json")]
    Validate {
        /// Dataset file (.json array or .jsonl lines)
        #[arg(long, env = "LEXGRID_DATA", default_value = "data/grids.json")]
        data: PathBuf,

        /// Validation ruleset version
        #[arg(long, default_value_t = 1)]
        schema_version: u32,

        /// Load at most N records from the dataset
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Print the validation report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Suppress per-record issue lines on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Report how many grids a store holds
    #[command(after_help = "\
Examples:
  lexgrid stats
  lexgrid stats --store lexgrid.db --json")]
    Stats {
        /// SQLite store path
        #[arg(long, env = "LEXGRID_STORE", default_value = "lexgrid.db")]
        store: PathBuf,

        /// Print stats as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  lexgrid-core ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
            "\nstore_format: 1",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  lexgrid-core ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
            "\nstore_format: 1",
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: lexgrid <command> [options]");
            eprintln!("       lexgrid --help for more information");
            Ok(())
        }
        Some(Commands::Seed {
            data,
            store,
            schema_version,
            dry_run,
            limit,
            continue_on_error,
            json,
            output,
            quiet,
        }) => seed::cmd_seed(
            data,
            store,
            schema_version,
            dry_run,
            limit.map(|n| n as usize),
            continue_on_error,
            json,
            output,
            quiet,
        ),
        Some(Commands::Validate { data, schema_version, limit, json, quiet }) => {
            seed::cmd_validate(data, schema_version, limit.map(|n| n as usize), json, quiet)
        }
        Some(Commands::Stats { store, json }) => seed::cmd_stats(store, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// CLI error with exit code and optional hint for the user.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
