//! Dataset file loading.
//!
//! Two container formats, selected by extension: a JSON array (the default)
//! and JSON Lines. Container problems are fatal before any record-level
//! processing starts; deciding whether an individual value is a well-formed
//! grid record is the validator's job, so records come back as raw JSON.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

/// Container-level dataset failures.
#[derive(Debug)]
pub enum DatasetError {
    Read { path: String, detail: String },
    Parse { path: String, detail: String },
    /// The JSON top level is not an array of records.
    TopLevel { path: String, found: &'static str },
    /// One line of a JSONL file is not a JSON value.
    Line { path: String, line: usize, detail: String },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Read { path, detail } => {
                write!(f, "cannot read {}: {}", path, detail)
            }
            DatasetError::Parse { path, detail } => {
                write!(f, "{}: not valid JSON: {}", path, detail)
            }
            DatasetError::TopLevel { path, found } => {
                write!(f, "{}: expected a JSON array of records, found {}", path, found)
            }
            DatasetError::Line { path, line, detail } => {
                write!(f, "{}:{}: not valid JSON: {}", path, line, detail)
            }
        }
    }
}

impl Error for DatasetError {}

/// Load raw candidate records in source order, at most `limit` of them.
///
/// JSONL reading stops once `limit` records have been taken; the rest of the
/// file is never read. An array file is parsed whole (the container has to
/// be) and truncated afterwards.
pub fn load_records(path: &Path, limit: Option<usize>) -> Result<Vec<Value>, DatasetError> {
    let jsonl = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
        .unwrap_or(false);
    if jsonl {
        load_jsonl(path, limit)
    } else {
        load_array(path, limit)
    }
}

fn load_array(path: &Path, limit: Option<usize>) -> Result<Vec<Value>, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|e| DatasetError::Read {
        path: display(path),
        detail: e.to_string(),
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| DatasetError::Parse {
        path: display(path),
        detail: e.to_string(),
    })?;
    match value {
        Value::Array(mut records) => {
            if let Some(cap) = limit {
                records.truncate(cap);
            }
            Ok(records)
        }
        other => Err(DatasetError::TopLevel {
            path: display(path),
            found: json_type_name(&other),
        }),
    }
}

fn load_jsonl(path: &Path, limit: Option<usize>) -> Result<Vec<Value>, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::Read {
        path: display(path),
        detail: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut lines = reader.lines().enumerate();
    loop {
        if limit.map_or(false, |cap| records.len() >= cap) {
            break;
        }
        let (number, line) = match lines.next() {
            Some(pair) => pair,
            None => break,
        };
        let line = line.map_err(|e| DatasetError::Read {
            path: display(path),
            detail: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = serde_json::from_str(trimmed).map_err(|e| DatasetError::Line {
            path: display(path),
            line: number + 1,
            detail: e.to_string(),
        })?;
        records.push(value);
    }
    Ok(records)
}

fn display(path: &Path) -> String {
    path.display().to_string()
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
