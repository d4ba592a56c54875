use rusqlite::Connection;
use tracing::{debug, warn};

use crate::io::store::{self, CellStore, StoreError};
use crate::model::cell::COLUMN_COUNT;
use crate::model::day::Day;
use crate::model::grid::{InvariantViolation, check_row};

/// Error type for row insert/delete
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Insert an empty row directly below `row`.
///
/// `rows` is the caller's current row count for the day. Later rows move up
/// by one and ten empty cells are written at `row + 1`, all in one
/// transaction. Returns the index of the new row.
///
/// Rows the caller holds beyond the persisted ones are written as blank rows
/// first, so the stored numbering stays `0..N-1`.
pub fn insert_below(
    store: &mut CellStore,
    day: &Day,
    row: usize,
    rows: usize,
) -> Result<usize, RowError> {
    check_row(row, rows)?;
    let new_row = row + 1;

    let tx = store.transaction()?;
    materialize_rows(&tx, day, rows)?;
    store::shift_rows(&tx, day, row, 1)?;
    for col in 0..COLUMN_COUNT {
        store::upsert_cell(&tx, day, new_row, col, "")?;
    }
    tx.commit().map_err(StoreError::from)?;

    debug!(day = %day, row = new_row, "inserted row");
    Ok(new_row)
}

/// Delete `row` and move later rows down by one to close the gap.
///
/// A day always keeps at least one row, so deleting from a one-row day is
/// rejected. Unpersisted rows are materialized as in [`insert_below`].
pub fn delete_row(
    store: &mut CellStore,
    day: &Day,
    row: usize,
    rows: usize,
) -> Result<(), RowError> {
    if rows <= 1 {
        return Err(InvariantViolation::LastRow {
            day: day.to_string(),
        }
        .into());
    }
    check_row(row, rows)?;

    let tx = store.transaction()?;
    materialize_rows(&tx, day, rows)?;
    store::delete_row(&tx, day, row)?;
    store::shift_rows(&tx, day, row, -1)?;
    tx.commit().map_err(StoreError::from)?;

    debug!(day = %day, row, "deleted row");
    Ok(())
}

/// Write blank rows from the persisted row count up to `rows`
fn materialize_rows(conn: &Connection, day: &Day, rows: usize) -> Result<(), StoreError> {
    let persisted = store::row_count(conn, day)?;
    for r in persisted..rows {
        for col in 0..COLUMN_COUNT {
            store::upsert_cell(conn, day, r, col, "")?;
        }
    }
    Ok(())
}

/// Renumber the persisted rows of a day to `0..N-1`, keeping their order.
/// Returns the number of rows that moved.
pub fn compact_day(store: &mut CellStore, day: &Day) -> Result<usize, StoreError> {
    let tx = store.transaction()?;
    let indices = store::row_indices(&tx, day)?;
    let mut moved = 0;
    for (target, current) in indices.into_iter().enumerate() {
        if target != current {
            store::renumber_row(&tx, day, current, target)?;
            moved += 1;
        }
    }
    tx.commit()?;

    if moved > 0 {
        warn!(day = %day, moved, "compacted gapped rows");
    }
    Ok(moved)
}

/// True when the persisted rows of a day are exactly `0..N-1`
pub fn is_contiguous(store: &CellStore, day: &Day) -> Result<bool, StoreError> {
    let cells = store.read_day(day)?;
    let mut expected = 0;
    for cell in &cells {
        if cell.row == expected {
            expected += 1;
        } else if cell.row + 1 != expected {
            return Ok(false);
        }
    }
    Ok(true)
}
