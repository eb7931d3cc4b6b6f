//! Versioned validation rulesets.
//!
//! A ruleset decides whether one raw candidate is a well-formed grid record.
//! Checks run in a fixed order and stop at the first violation, so an invalid
//! record reports exactly one reason.
//!
//! Reason codes emitted by v1 (N is 1-based):
//!
//! | code                          | meaning                                   |
//! |-------------------------------|-------------------------------------------|
//! | `record_type`                 | candidate is not a JSON object            |
//! | `missing_keys`                | required keys absent (listed in value)    |
//! | `unexpected_keys`             | unknown keys present (listed in value)    |
//! | `cells_type`                  | `cells` is not a string                   |
//! | `cells_length`                | normalized `cells` is not 25 characters   |
//! | `invalid_charset`             | `cells` contains non `A-Z` characters     |
//! | `words_across_type`           | `words_across` is not a list              |
//! | `words_across_length`         | list does not hold exactly 5 words        |
//! | `words_across_item_type_N`    | word N is not a string                    |
//! | `words_across_invalid_word_N` | word N is not five `A-Z` letters          |
//! | `words_down_*`                | same checks for `words_down`              |
//! | `across_mismatch_row_N`       | word N differs from row N of the matrix   |
//! | `down_mismatch_col_N`         | word N differs from column N of the matrix|
//!
//! The batch layer in `validate` adds `duplicate_cells_in_file` and
//! `duplicate_grid_id_in_file` on top of these.

use serde_json::Value;

use crate::model::{excerpt, SchemaVersion, ValidationIssue, CELL_COUNT, GRID_SIZE};

const EXPECTED_KEYS: [&str; 3] = ["cells", "words_across", "words_down"];

/// Normalized record content, prior to key derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDraft {
    pub cells: String,
    pub words_across: Vec<String>,
    pub words_down: Vec<String>,
}

/// One version of the grid validation contract.
pub trait GridSchema {
    /// The version tag records validated by this ruleset carry.
    fn version(&self) -> SchemaVersion;

    /// Check one raw candidate. Returns the normalized draft, or the first
    /// violated rule.
    fn check_record(&self, index: usize, raw: &Value) -> Result<GridDraft, ValidationIssue>;
}

/// Look up the ruleset for a version. `None` means the version is unknown
/// and must be rejected before any loading starts.
pub fn schema_for(version: SchemaVersion) -> Option<&'static dyn GridSchema> {
    match version.0 {
        1 => Some(&SchemaV1),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// v1: the 5x5 word-square ruleset
// ---------------------------------------------------------------------------

/// Exact key set, 25 uppercase cells, five five-letter words per axis, words
/// consistent with the cell matrix. Input strings are trimmed and uppercased
/// before any content check, so casing and padding never affect identity.
pub struct SchemaV1;

impl GridSchema for SchemaV1 {
    fn version(&self) -> SchemaVersion {
        SchemaVersion(1)
    }

    fn check_record(&self, index: usize, raw: &Value) -> Result<GridDraft, ValidationIssue> {
        let obj = match raw.as_object() {
            Some(obj) => obj,
            None => return Err(issue(index, "record_type", Some(json_type_name(raw).to_string()))),
        };

        let missing: Vec<&str> = EXPECTED_KEYS
            .iter()
            .filter(|key| !obj.contains_key(**key))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(issue(index, "missing_keys", Some(missing.join(","))));
        }

        let mut unexpected: Vec<&str> = obj
            .keys()
            .map(|key| key.as_str())
            .filter(|key| !EXPECTED_KEYS.contains(key))
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort_unstable();
            return Err(issue(index, "unexpected_keys", Some(unexpected.join(","))));
        }

        let cells_value = &obj["cells"];
        let cells_raw = match cells_value.as_str() {
            Some(s) => s,
            None => {
                return Err(issue(
                    index,
                    "cells_type",
                    Some(json_type_name(cells_value).to_string()),
                ))
            }
        };
        let cells = cells_raw.trim().to_uppercase();
        if cells.chars().count() != CELL_COUNT {
            return Err(issue(
                index,
                "cells_length",
                Some(cells.chars().count().to_string()),
            ));
        }
        if !cells.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(issue(index, "invalid_charset", Some(excerpt(&cells))));
        }

        let words_across = check_words(index, &obj["words_across"], "words_across")?;
        let words_down = check_words(index, &obj["words_down"], "words_down")?;

        // All-ASCII by the charset check above, so byte slicing is safe.
        for row in 0..GRID_SIZE {
            let expected = &cells[row * GRID_SIZE..(row + 1) * GRID_SIZE];
            if words_across[row] != expected {
                return Err(issue(
                    index,
                    &format!("across_mismatch_row_{}", row + 1),
                    Some(words_across[row].clone()),
                ));
            }
        }
        for col in 0..GRID_SIZE {
            let expected: String = (0..GRID_SIZE)
                .map(|row| cells.as_bytes()[row * GRID_SIZE + col] as char)
                .collect();
            if words_down[col] != expected {
                return Err(issue(
                    index,
                    &format!("down_mismatch_col_{}", col + 1),
                    Some(words_down[col].clone()),
                ));
            }
        }

        Ok(GridDraft {
            cells,
            words_across,
            words_down,
        })
    }
}

fn check_words(index: usize, raw: &Value, field: &str) -> Result<Vec<String>, ValidationIssue> {
    let items = match raw.as_array() {
        Some(items) => items,
        None => {
            return Err(issue(
                index,
                &format!("{field}_type"),
                Some(json_type_name(raw).to_string()),
            ))
        }
    };
    if items.len() != GRID_SIZE {
        return Err(issue(
            index,
            &format!("{field}_length"),
            Some(items.len().to_string()),
        ));
    }

    let mut words = Vec::with_capacity(GRID_SIZE);
    for (slot, item) in items.iter().enumerate() {
        let word = match item.as_str() {
            Some(word) => word,
            None => {
                return Err(issue(
                    index,
                    &format!("{field}_item_type_{}", slot + 1),
                    Some(json_type_name(item).to_string()),
                ))
            }
        };
        let word = word.trim().to_uppercase();
        if word.chars().count() != GRID_SIZE || !word.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(issue(
                index,
                &format!("{field}_invalid_word_{}", slot + 1),
                Some(excerpt(&word)),
            ));
        }
        words.push(word);
    }
    Ok(words)
}

fn issue(index: usize, reason: &str, value: Option<String>) -> ValidationIssue {
    ValidationIssue {
        index,
        reason: reason.to_string(),
        value,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
