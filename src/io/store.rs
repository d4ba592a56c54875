use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction, params};
use tracing::debug;

use crate::model::cell::Cell;
use crate::model::day::Day;

const SCHEMA_VERSION: &str = "1";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cells (
  day TEXT NOT NULL,
  row_idx INTEGER NOT NULL,
  col_idx INTEGER NOT NULL,
  content TEXT NOT NULL DEFAULT '',
  PRIMARY KEY (day, row_idx, col_idx)
);
"#;

/// Error type for cell storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported schema version {found} (expected {expected})")]
    SchemaVersion {
        found: String,
        expected: &'static str,
    },
    #[error("row shift by {delta} below row {from} would leave negative row numbers")]
    NegativeShift { from: usize, delta: i64 },
}

/// SQLite-backed mapping of (day, row, column) to cell text.
///
/// Methods on the store run as their own statement or transaction. The free
/// functions in this module take a `&Connection` so callers can compose them
/// inside one `Transaction` obtained from [`CellStore::transaction`].
pub struct CellStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CellStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        let found: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        if found != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(CellStore { conn, path })
    }

    /// Database file, or `None` for an in-memory store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self.conn.transaction()?)
    }

    pub fn upsert(&self, day: &Day, row: usize, col: usize, content: &str) -> Result<(), StoreError> {
        upsert_cell(&self.conn, day, row, col, content)
    }

    pub fn delete_day(&self, day: &Day) -> Result<usize, StoreError> {
        delete_day(&self.conn, day)
    }

    pub fn delete_row(&self, day: &Day, row: usize) -> Result<usize, StoreError> {
        delete_row(&self.conn, day, row)
    }

    /// Renumber every row after `from` by `delta`, atomically.
    pub fn shift_rows(&mut self, day: &Day, from: usize, delta: i64) -> Result<usize, StoreError> {
        let tx = self.transaction()?;
        let moved = shift_rows(&tx, day, from, delta)?;
        tx.commit()?;
        Ok(moved)
    }

    pub fn read_day(&self, day: &Day) -> Result<Vec<Cell>, StoreError> {
        read_day(&self.conn, day)
    }

    /// One past the highest persisted row index (0 for an empty day)
    pub fn row_count(&self, day: &Day) -> Result<usize, StoreError> {
        row_count(&self.conn, day)
    }

    /// Every day that has at least one persisted cell, ascending
    pub fn days(&self) -> Result<Vec<Day>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT day FROM cells ORDER BY day")?;
        let days = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days.into_iter().map(Day::new).collect())
    }
}

// ---------------------------------------------------------------------------
// Connection-level operations (usable inside a caller's transaction)
// ---------------------------------------------------------------------------

/// Insert a cell or replace the content already stored under its key
pub fn upsert_cell(
    conn: &Connection,
    day: &Day,
    row: usize,
    col: usize,
    content: &str,
) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO cells(day, row_idx, col_idx, content)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(day, row_idx, col_idx) DO UPDATE SET content = excluded.content
        "#,
        params![day.as_str(), row as i64, col as i64, content],
    )?;
    Ok(())
}

pub fn delete_day(conn: &Connection, day: &Day) -> Result<usize, StoreError> {
    let deleted = conn.execute("DELETE FROM cells WHERE day = ?1", params![day.as_str()])?;
    debug!(day = %day, deleted, "deleted day");
    Ok(deleted)
}

pub fn delete_row(conn: &Connection, day: &Day, row: usize) -> Result<usize, StoreError> {
    let deleted = conn.execute(
        "DELETE FROM cells WHERE day = ?1 AND row_idx = ?2",
        params![day.as_str(), row as i64],
    )?;
    Ok(deleted)
}

/// Add `delta` to the row index of every cell with `row > from`.
///
/// Runs in two passes through a negative scratch range so the primary key
/// never sees two cells at the same index mid-update. Returns the number of
/// cells moved. Must be called inside a transaction.
pub fn shift_rows(conn: &Connection, day: &Day, from: usize, delta: i64) -> Result<usize, StoreError> {
    if delta == 0 {
        return Ok(0);
    }
    if from as i64 + 1 + delta < 0 {
        return Err(StoreError::NegativeShift { from, delta });
    }
    let moved = conn.execute(
        "UPDATE cells SET row_idx = -(row_idx + ?3) - 1 WHERE day = ?1 AND row_idx > ?2",
        params![day.as_str(), from as i64, delta],
    )?;
    conn.execute(
        "UPDATE cells SET row_idx = -row_idx - 1 WHERE day = ?1 AND row_idx < 0",
        params![day.as_str()],
    )?;
    debug!(day = %day, from, delta, moved, "shifted rows");
    Ok(moved)
}

/// Move every cell of row `from` to row `to`. The target must be free.
pub fn renumber_row(conn: &Connection, day: &Day, from: usize, to: usize) -> Result<usize, StoreError> {
    let moved = conn.execute(
        "UPDATE cells SET row_idx = ?3 WHERE day = ?1 AND row_idx = ?2",
        params![day.as_str(), from as i64, to as i64],
    )?;
    Ok(moved)
}

/// Cells of a day ordered by (row, column)
pub fn read_day(conn: &Connection, day: &Day) -> Result<Vec<Cell>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT row_idx, col_idx, content FROM cells WHERE day = ?1 ORDER BY row_idx, col_idx",
    )?;
    let cells = stmt
        .query_map(params![day.as_str()], |row| {
            Ok(Cell::new(
                row.get::<_, i64>(0)? as usize,
                row.get::<_, i64>(1)? as usize,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cells)
}

/// Distinct persisted row indices of a day, ascending
pub fn row_indices(conn: &Connection, day: &Day) -> Result<Vec<usize>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT row_idx FROM cells WHERE day = ?1 ORDER BY row_idx")?;
    let rows = stmt
        .query_map(params![day.as_str()], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(|r| r as usize).collect())
}

pub fn row_count(conn: &Connection, day: &Day) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COALESCE(MAX(row_idx) + 1, 0) FROM cells WHERE day = ?1",
        params![day.as_str()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}
