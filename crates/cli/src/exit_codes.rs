//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3-9     | seed             | Seeding pipeline codes                   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use lexgrid_core::SeedSummary;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown schema version.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Seed (3-9)
// =============================================================================

/// Run completed but the batch contained invalid records.
/// Like `grep(1)` exit 1, this is an outcome, not a crash.
pub const EXIT_SEED_INVALID: u8 = 3;

/// Run completed but at least one valid record failed to write.
pub const EXIT_SEED_WRITE: u8 = 4;

/// Dataset could not be read or parsed as a container.
pub const EXIT_SEED_LOAD: u8 = 5;

/// Store could not be opened.
pub const EXIT_SEED_STORE: u8 = 6;

/// Map a finished run's summary to its exit code.
///
/// Invalid records outrank write failures: a batch that is both dirty and
/// partially unwritten reports the dirtiness, since that is what the operator
/// has to fix first.
pub fn seed_exit_code(summary: &SeedSummary) -> u8 {
    if summary.invalid_count > 0 {
        EXIT_SEED_INVALID
    } else if summary.write_error_count > 0 {
        EXIT_SEED_WRITE
    } else {
        EXIT_SUCCESS
    }
}
