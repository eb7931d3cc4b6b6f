//! SQLite-backed grid store.
//!
//! Uniqueness is enforced twice: the grid id primary key and the cells
//! unique index. Both back up the engine's reconcile-then-insert walk
//! against concurrent seeding.

use std::path::Path;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

use lexgrid_core::model::{GridRecord, SchemaVersion};
use lexgrid_core::store::{GridStore, InsertOutcome, StoreError};

use crate::STORE_FORMAT_VERSION;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS grids (
    grid_id TEXT PRIMARY KEY,            -- content-derived UUID
    cells TEXT NOT NULL UNIQUE,
    words_across TEXT NOT NULL,          -- JSON array of five words
    words_down TEXT NOT NULL,            -- JSON array of five words
    schema_version INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    CHECK (length(cells) = 25),
    CHECK (cells NOT GLOB '*[^A-Z]*'),
    CHECK (json_array_length(words_across) = 5),
    CHECK (json_array_length(words_down) = 5)
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// A grid store in a single SQLite file.
pub struct SqliteGridStore {
    conn: Connection,
}

impl SqliteGridStore {
    /// Open a store, creating the file and schema when absent.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('format_version', ?1)",
            params![STORE_FORMAT_VERSION.to_string()],
        )
        .map_err(backend)?;
        Ok(Self { conn })
    }

    /// Number of stored grids.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM grids", [], |row| row.get(0))
            .map_err(backend)?;
        Ok(n as usize)
    }
}

impl GridStore for SqliteGridStore {
    fn find_by_grid_id(&self, grid_id: &Uuid) -> Result<Option<GridRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT cells, words_across, words_down, schema_version
                 FROM grids WHERE grid_id = ?1",
                params![grid_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(backend)?;

        match row {
            None => Ok(None),
            Some((cells, across, down, version)) => Ok(Some(GridRecord {
                grid_id: *grid_id,
                cells,
                words_across: decode_words(&across)?,
                words_down: decode_words(&down)?,
                schema_version: SchemaVersion(version as u32),
            })),
        }
    }

    fn insert(&mut self, record: &GridRecord) -> Result<InsertOutcome, StoreError> {
        let across = encode_words(&record.words_across)?;
        let down = encode_words(&record.words_down)?;
        let result = self.conn.execute(
            "INSERT INTO grids (grid_id, cells, words_across, words_down, schema_version)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.grid_id.to_string(),
                record.cells,
                across,
                down,
                record.schema_version.0 as i64,
            ],
        );
        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, message))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                // The extended message names the violated index.
                let detail = message.unwrap_or_else(|| err.to_string());
                if detail.contains("grids.grid_id") {
                    Ok(InsertOutcome::DuplicateId)
                } else if detail.contains("grids.cells") {
                    Err(StoreError::CellsConflict {
                        grid_id: record.grid_id,
                        cells: record.cells.clone(),
                    })
                } else {
                    Err(StoreError::Backend(detail))
                }
            }
            Err(err) => Err(backend(err)),
        }
    }
}

fn encode_words(words: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(words).map_err(|e| StoreError::Backend(e.to_string()))
}

fn decode_words(json: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::Backend(format!("corrupt word list: {e}")))
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}
