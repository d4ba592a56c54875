use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::io::store::{self, CellStore, StoreError};
use crate::model::cell::{Cell, Column};
use crate::model::day::{Day, DayError};
use crate::model::grid::is_done_token;

/// Error type for end-of-day rollover. Any failure leaves the target day
/// exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum RolloverError {
    #[error("cannot roll over {day}: {source}")]
    InvalidDay { day: Day, source: DayError },
    #[error("rollover from {from} to {to} failed: {source}")]
    Failed {
        from: Day,
        to: Day,
        source: StoreError,
    },
}

/// Outcome of one rollover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolloverReport {
    pub from: Day,
    pub to: Day,
    /// Incomplete rows written to the target day
    pub carried: usize,
    /// Rows left behind because they are done
    pub completed: usize,
    /// Cells the target day held before it was overwritten
    pub replaced_cells: usize,
}

/// Carry the unfinished rows of `day` into the following day.
///
/// The following day's previous content is discarded, not merged. Carried
/// rows keep their column contents and are renumbered `0..N-1` in their
/// original order. A blank row is incomplete like any other and is carried.
/// The whole operation is one transaction.
pub fn rollover<S: AsRef<str>>(
    store: &mut CellStore,
    day: &Day,
    done_tokens: &[S],
) -> Result<RolloverReport, RolloverError> {
    let to = day.next().map_err(|source| RolloverError::InvalidDay {
        day: day.clone(),
        source,
    })?;

    let (carried, completed, replaced_cells) = carry_rows(store, day, &to, done_tokens)
        .map_err(|source| RolloverError::Failed {
            from: day.clone(),
            to: to.clone(),
            source,
        })?;

    info!(from = %day, to = %to, carried, completed, "rolled over unfinished rows");
    Ok(RolloverReport {
        from: day.clone(),
        to,
        carried,
        completed,
        replaced_cells,
    })
}

fn carry_rows<S: AsRef<str>>(
    store: &mut CellStore,
    from: &Day,
    to: &Day,
    done_tokens: &[S],
) -> Result<(usize, usize, usize), StoreError> {
    let tx = store.transaction()?;

    let cells = store::read_day(&tx, from)?;
    let mut completed = 0;
    let mut pending = Vec::new();
    for (_, row_cells) in group_by_row(cells) {
        if is_complete(&row_cells, done_tokens) {
            completed += 1;
        } else {
            pending.push(row_cells);
        }
    }

    let replaced = store::delete_day(&tx, to)?;
    for (target, row_cells) in pending.iter().enumerate() {
        for cell in row_cells {
            store::upsert_cell(&tx, to, target, cell.col, &cell.content)?;
        }
    }
    tx.commit()?;

    Ok((pending.len(), completed, replaced))
}

fn group_by_row(cells: Vec<Cell>) -> BTreeMap<usize, Vec<Cell>> {
    let mut rows: BTreeMap<usize, Vec<Cell>> = BTreeMap::new();
    for cell in cells {
        rows.entry(cell.row).or_default().push(cell);
    }
    rows
}

fn is_complete<S: AsRef<str>>(cells: &[Cell], done_tokens: &[S]) -> bool {
    cells
        .iter()
        .find(|c| c.col == Column::Done.index())
        .is_some_and(|c| is_done_token(&c.content, done_tokens))
}
