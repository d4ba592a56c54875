pub mod repeat;

pub use repeat::RepeatMarkers;

use tracing::{debug, info};

use crate::io::store::{self, CellStore, StoreError};
use crate::model::cell::Column;
use crate::model::config::AppConfig;
use crate::model::day::Day;
use crate::model::grid::{
    InvariantViolation, Row, add_repeat_tag, cells_from_rows, check_column, check_row,
    has_repeat_tag, remove_repeat_tag, rows_from_cells,
};
use crate::ops::rollover::{self, RolloverError, RolloverReport};
use crate::ops::row_ops::{self, RowError};
use crate::ops::summary::{self, DaySummary};

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no day is open")]
    NotOpen,
    #[error("{day} has unsaved changes")]
    UnsavedChanges { day: Day },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rollover(#[from] RolloverError),
}

/// Lifecycle of the open day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    Dirty,
    Saved,
    Closed,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SessionState::Loaded | SessionState::Dirty | SessionState::Saved
        )
    }
}

/// Editable in-memory grid of one day, backed by a [`CellStore`].
///
/// Edits stay in memory until `save` or `close`. Row inserts and deletes are
/// written through [`row_ops`] first and mirrored in memory only once the
/// store accepted them, so a failed operation leaves both sides as they were.
pub struct GridSession {
    store: CellStore,
    config: AppConfig,
    day: Option<Day>,
    rows: Vec<Row>,
    state: SessionState,
    markers: RepeatMarkers,
    /// Set while a day is being populated from the store
    loading: bool,
}

impl GridSession {
    pub fn new(store: CellStore, config: AppConfig) -> Self {
        GridSession {
            store,
            config,
            day: None,
            rows: Vec::new(),
            state: SessionState::Unloaded,
            markers: RepeatMarkers::new(),
            loading: false,
        }
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn into_store(self) -> CellStore {
        self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn day(&self) -> Option<&Day> {
        self.day.as_ref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn open_day(&self) -> Result<Day, SessionError> {
        match (&self.day, self.state.is_open()) {
            (Some(day), true) => Ok(day.clone()),
            _ => Err(SessionError::NotOpen),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Load a day from the store.
    ///
    /// Persisted gaps in row numbering are compacted first. A day with no
    /// cells opens as one empty row. Refused while the current day is dirty.
    pub fn open(&mut self, day: Day) -> Result<(), SessionError> {
        if self.state == SessionState::Dirty
            && let Some(current) = &self.day
        {
            return Err(SessionError::UnsavedChanges {
                day: current.clone(),
            });
        }

        if !row_ops::is_contiguous(&self.store, &day)? {
            row_ops::compact_day(&mut self.store, &day)?;
        }
        let cells = self.store.read_day(&day)?;
        let loaded = rows_from_cells(&cells);

        self.day = Some(day.clone());
        self.rows = vec![Row::empty(); loaded.len().max(1)];
        self.loading = true;
        self.populate(&loaded);
        self.loading = false;

        self.markers
            .rebuild(&day, &self.rows, &self.config.grid.repeat_tag);
        self.state = SessionState::Loaded;
        debug!(day = %day, rows = self.rows.len(), "opened day");
        Ok(())
    }

    fn populate(&mut self, loaded: &[Row]) {
        for (r, row) in loaded.iter().enumerate() {
            for col in Column::ALL {
                let content = row.get(col);
                if !content.is_empty() {
                    self.apply_edit(r, col, content.to_string());
                }
            }
        }
    }

    /// Flush the whole day: delete its cells, then write every cell of every
    /// row, in one transaction.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let day = self.open_day()?;
        let cells = cells_from_rows(&self.rows);

        let tx = self.store.transaction()?;
        store::delete_day(&tx, &day)?;
        for cell in &cells {
            store::upsert_cell(&tx, &day, cell.row, cell.col, &cell.content)?;
        }
        tx.commit().map_err(StoreError::from)?;

        self.state = SessionState::Saved;
        debug!(day = %day, cells = cells.len(), "saved day");
        Ok(())
    }

    /// Delete the day's persisted cells and reset to one empty row
    pub fn clear(&mut self) -> Result<(), SessionError> {
        let day = self.open_day()?;
        self.store.delete_day(&day)?;
        self.rows = vec![Row::empty()];
        self.markers.clear_day(&day);
        self.state = SessionState::Saved;
        info!(day = %day, "cleared day");
        Ok(())
    }

    /// Close the day, saving first when there are unsaved edits
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.open_day()?;
        if self.state == SessionState::Dirty {
            self.save()?;
        }
        self.finish();
        Ok(())
    }

    /// Close the day and drop unsaved edits
    pub fn discard(&mut self) -> Result<(), SessionError> {
        let day = self.open_day()?;
        if self.state == SessionState::Dirty {
            info!(day = %day, "discarded unsaved edits");
        }
        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        self.rows.clear();
        self.day = None;
        self.state = SessionState::Closed;
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Set one cell.
    ///
    /// Writing non-empty content into the last row also appends a new empty
    /// row below it, so the grid always ends with a blank row. The appended
    /// row lives in memory until the next save.
    pub fn edit(&mut self, row: usize, col: usize, content: impl Into<String>) -> Result<(), SessionError> {
        self.open_day()?;
        check_row(row, self.rows.len())?;
        let col = check_column(col)?;
        self.apply_edit(row, col, content.into());
        self.state = SessionState::Dirty;
        Ok(())
    }

    fn apply_edit(&mut self, row: usize, col: Column, content: String) {
        if !self.loading && row + 1 == self.rows.len() && !content.is_empty() {
            self.rows.push(Row::empty());
        }
        if !self.loading
            && col == Column::Name
            && let Some(day) = &self.day
        {
            let marked = has_repeat_tag(&content, &self.config.grid.repeat_tag);
            self.markers.set(day, row, marked);
        }
        self.rows[row].set(col, content);
    }

    /// Insert an empty row below `row`; returns the new row's index
    pub fn insert_row(&mut self, row: usize) -> Result<usize, SessionError> {
        let day = self.open_day()?;
        let new_row = row_ops::insert_below(&mut self.store, &day, row, self.rows.len())?;
        self.rows.insert(new_row, Row::empty());
        self.markers.row_inserted(&day, new_row);
        Ok(new_row)
    }

    /// Delete `row`. The last remaining row cannot be deleted.
    pub fn delete_row(&mut self, row: usize) -> Result<(), SessionError> {
        let day = self.open_day()?;
        row_ops::delete_row(&mut self.store, &day, row, self.rows.len())?;
        self.rows.remove(row);
        self.markers.row_deleted(&day, row);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Repeat markers
    // -----------------------------------------------------------------------

    /// Add or remove the repeat tag on a row's name
    pub fn set_repeating(&mut self, row: usize, repeating: bool) -> Result<(), SessionError> {
        self.open_day()?;
        check_row(row, self.rows.len())?;
        let tag = &self.config.grid.repeat_tag;
        let name = self.rows[row].get(Column::Name);
        let updated = if repeating {
            add_repeat_tag(name, tag)
        } else {
            remove_repeat_tag(name, tag)
        };
        if updated != name {
            self.edit(row, Column::Name.index(), updated)?;
        }
        Ok(())
    }

    pub fn is_repeating(&self, row: usize) -> bool {
        self.day
            .as_ref()
            .is_some_and(|day| self.markers.contains(day, row))
    }

    /// Marked rows of the open day, ascending
    pub fn repeat_rows(&self) -> Vec<usize> {
        self.day
            .as_ref()
            .map(|day| self.markers.rows(day))
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Derived
    // -----------------------------------------------------------------------

    /// Roll the open day's unfinished rows into the next day.
    /// Unsaved edits are saved first so they are part of what rolls over.
    pub fn rollover(&mut self) -> Result<RolloverReport, SessionError> {
        let day = self.open_day()?;
        if self.state == SessionState::Dirty {
            self.save()?;
        }
        let report = rollover::rollover(&mut self.store, &day, &self.config.rollover.done_tokens)?;
        Ok(report)
    }

    pub fn summary(&self) -> DaySummary {
        summary::summarize(&self.rows, &self.config.rollover.done_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> Day {
        Day::new("2025-05-14")
    }

    fn session() -> GridSession {
        GridSession::new(CellStore::open_in_memory().unwrap(), AppConfig::default())
    }

    fn name(s: &GridSession, row: usize) -> &str {
        s.rows()[row].get(Column::Name)
    }

    #[test]
    fn operations_require_an_open_day() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Unloaded);
        assert!(matches!(s.edit(0, 1, "x"), Err(SessionError::NotOpen)));
        assert!(matches!(s.save(), Err(SessionError::NotOpen)));
        assert!(matches!(s.close(), Err(SessionError::NotOpen)));
    }

    #[test]
    fn empty_day_opens_with_one_blank_row() {
        let mut s = session();
        s.open(day()).unwrap();
        assert_eq!(s.state(), SessionState::Loaded);
        assert_eq!(s.row_count(), 1);
        assert!(s.rows()[0].is_blank());
        assert!(s.store().read_day(&day()).unwrap().is_empty());
    }

    #[test]
    fn state_machine_walk() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "Write").unwrap();
        assert_eq!(s.state(), SessionState::Dirty);
        s.save().unwrap();
        assert_eq!(s.state(), SessionState::Saved);
        s.edit(0, 2, "draft").unwrap();
        assert_eq!(s.state(), SessionState::Dirty);
        s.close().unwrap();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.day().is_none());

        s.open(day()).unwrap();
        assert_eq!(s.rows()[0].get(Column::Product), "draft");
    }

    #[test]
    fn editing_last_row_grows_the_grid() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 0, "X").unwrap();
        assert_eq!(s.row_count(), 2);
        assert!(s.rows()[1].is_blank());

        // Editing a non-last row does not grow
        s.edit(0, 1, "again").unwrap();
        assert_eq!(s.row_count(), 2);

        // Clearing the last row does not grow
        s.edit(1, 1, "").unwrap();
        assert_eq!(s.row_count(), 2);
    }

    #[test]
    fn auto_growth_stays_in_memory_until_save() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, Column::Name.index(), "X").unwrap();
        assert_eq!(s.row_count(), 2);
        assert!(s.store().read_day(&day()).unwrap().is_empty());
        assert!(row_ops::is_contiguous(s.store(), &day()).unwrap());

        s.discard().unwrap();
        assert!(s.store().days().unwrap().is_empty());
    }

    #[test]
    fn insert_on_unsaved_day_keeps_store_contiguous() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, Column::Name.index(), "a").unwrap();
        let new_row = s.insert_row(1).unwrap();
        assert_eq!(new_row, 2);
        assert_eq!(s.row_count(), 3);
        assert_eq!(s.store().row_count(&day()).unwrap(), 3);
        assert!(row_ops::is_contiguous(s.store(), &day()).unwrap());
    }

    #[test]
    fn loading_does_not_grow_the_grid() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "a").unwrap();
        s.edit(1, 1, "b").unwrap();
        assert_eq!(s.row_count(), 3);
        s.close().unwrap();

        // Persisted grid ends in a filled row
        let store = s.into_store();
        store.upsert(&day(), 3, 1, "d").unwrap();
        let mut s = GridSession::new(store, AppConfig::default());
        s.open(day()).unwrap();
        assert_eq!(s.row_count(), 4);
        assert_eq!(name(&s, 3), "d");
    }

    #[test]
    fn out_of_bounds_edit_is_rejected_without_change() {
        let mut s = session();
        s.open(day()).unwrap();
        assert!(matches!(
            s.edit(1, 1, "x"),
            Err(SessionError::Invariant(InvariantViolation::RowOutOfBounds { .. }))
        ));
        assert!(matches!(
            s.edit(0, 10, "x"),
            Err(SessionError::Invariant(InvariantViolation::ColumnOutOfBounds(10)))
        ));
        assert_eq!(s.state(), SessionState::Loaded);
        assert_eq!(s.row_count(), 1);
    }

    #[test]
    fn save_twice_is_idempotent() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "a").unwrap();
        s.edit(0, 5, "1").unwrap();
        s.save().unwrap();
        let first = s.store().read_day(&day()).unwrap();
        s.save().unwrap();
        let second = s.store().read_day(&day()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2 * crate::model::cell::COLUMN_COUNT);
    }

    #[test]
    fn save_drops_stale_cells() {
        let mut s = session();
        s.store().upsert(&day(), 0, 1, "old").unwrap();
        s.store().upsert(&day(), 0, 7, "3").unwrap();
        s.open(day()).unwrap();
        s.edit(0, 1, "new").unwrap();
        s.edit(0, 7, "").unwrap();
        s.delete_row(1).unwrap();
        s.save().unwrap();

        let cells = s.store().read_day(&day()).unwrap();
        assert!(cells.iter().all(|c| c.row == 0));
        assert!(cells.iter().any(|c| c.col == 1 && c.content == "new"));
        assert!(cells.iter().any(|c| c.col == 7 && c.content.is_empty()));
    }

    #[test]
    fn open_refuses_to_drop_unsaved_edits() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "unsaved").unwrap();
        assert!(matches!(
            s.open(Day::new("2025-05-15")),
            Err(SessionError::UnsavedChanges { .. })
        ));
        assert_eq!(s.day(), Some(&day()));
        s.save().unwrap();
        s.open(Day::new("2025-05-15")).unwrap();
        assert_eq!(s.row_count(), 1);
    }

    #[test]
    fn discard_keeps_persisted_content() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "kept").unwrap();
        s.save().unwrap();
        s.edit(0, 1, "dropped").unwrap();
        s.discard().unwrap();
        assert_eq!(s.state(), SessionState::Closed);

        s.open(day()).unwrap();
        assert_eq!(name(&s, 0), "kept");
    }

    #[test]
    fn clear_resets_to_one_row() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "a #repeat").unwrap();
        s.edit(1, 1, "b").unwrap();
        s.save().unwrap();
        s.clear().unwrap();

        assert_eq!(s.row_count(), 1);
        assert!(s.rows()[0].is_blank());
        assert!(s.repeat_rows().is_empty());
        assert!(s.store().read_day(&day()).unwrap().is_empty());
        assert_eq!(s.state(), SessionState::Saved);
    }

    #[test]
    fn insert_and_delete_keep_memory_and_store_aligned() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "a").unwrap();
        s.edit(1, 1, "c").unwrap();
        s.save().unwrap();

        let new_row = s.insert_row(0).unwrap();
        assert_eq!(new_row, 1);
        assert_eq!(name(&s, 2), "c");
        let stored = rows_from_cells(&s.store().read_day(&day()).unwrap());
        assert_eq!(stored.len(), s.row_count());
        assert_eq!(stored[2].get(Column::Name), "c");

        s.delete_row(1).unwrap();
        assert_eq!(name(&s, 1), "c");
        let stored = rows_from_cells(&s.store().read_day(&day()).unwrap());
        assert_eq!(stored[1].get(Column::Name), "c");
    }

    #[test]
    fn deleting_the_only_row_fails() {
        let mut s = session();
        s.open(day()).unwrap();
        let err = s.delete_row(0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Row(RowError::Invariant(InvariantViolation::LastRow { .. }))
        ));
        assert_eq!(s.row_count(), 1);
    }

    #[test]
    fn repeat_marker_survives_save_and_reopen() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "stretch").unwrap();
        s.edit(1, 1, "write").unwrap();
        s.set_repeating(0, true).unwrap();
        assert!(s.is_repeating(0));
        assert_eq!(name(&s, 0), "stretch #repeat");
        s.close().unwrap();

        s.open(day()).unwrap();
        assert_eq!(s.repeat_rows(), vec![0]);
        assert!(!s.is_repeating(1));

        s.set_repeating(0, false).unwrap();
        assert_eq!(name(&s, 0), "stretch");
        assert!(s.repeat_rows().is_empty());
    }

    #[test]
    fn repeat_markers_follow_row_moves() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "a").unwrap();
        s.edit(1, 1, "b #repeat").unwrap();
        assert_eq!(s.repeat_rows(), vec![1]);
        s.insert_row(0).unwrap();
        assert_eq!(s.repeat_rows(), vec![2]);
        s.delete_row(0).unwrap();
        assert_eq!(s.repeat_rows(), vec![1]);
    }

    #[test]
    fn open_compacts_gapped_days() {
        let store = CellStore::open_in_memory().unwrap();
        store.upsert(&day(), 2, 1, "two").unwrap();
        store.upsert(&day(), 5, 1, "five").unwrap();
        let mut s = GridSession::new(store, AppConfig::default());
        s.open(day()).unwrap();
        assert_eq!(s.row_count(), 2);
        assert_eq!(name(&s, 0), "two");
        assert_eq!(name(&s, 1), "five");
        assert!(row_ops::is_contiguous(s.store(), &day()).unwrap());
    }

    #[test]
    fn rollover_saves_pending_edits_first() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "finished").unwrap();
        s.edit(0, 5, "1").unwrap();
        s.edit(1, 1, "unfinished").unwrap();

        let report = s.rollover().unwrap();
        assert_eq!(s.state(), SessionState::Saved);
        // The unfinished row and the trailing blank row
        assert_eq!(report.carried, 2);
        assert_eq!(report.completed, 1);

        s.open(Day::new("2025-05-15")).unwrap();
        assert_eq!(name(&s, 0), "unfinished");
    }

    #[test]
    fn failed_save_stays_dirty() {
        let mut store = CellStore::open_in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            tx.execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON cells
                 WHEN NEW.content = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
            tx.commit().unwrap();
        }
        store.upsert(&day(), 0, 1, "before").unwrap();
        let mut s = GridSession::new(store, AppConfig::default());
        s.open(day()).unwrap();
        s.edit(0, 1, "boom").unwrap();

        assert!(matches!(s.save(), Err(SessionError::Store(_))));
        assert_eq!(s.state(), SessionState::Dirty);
        assert_eq!(name(&s, 0), "boom");
        let stored = rows_from_cells(&s.store().read_day(&day()).unwrap());
        assert_eq!(stored[0].get(Column::Name), "before");
    }

    #[test]
    fn summary_reflects_in_memory_rows() {
        let mut s = session();
        s.open(day()).unwrap();
        s.edit(0, 1, "work").unwrap();
        s.edit(0, Column::Actual.index(), "8").unwrap();
        s.edit(0, Column::Done.index(), "1").unwrap();
        let summary = s.summary();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.done, 1);
        assert_eq!(summary.actual_hours, 8.0);
    }
}
