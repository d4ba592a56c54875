use serde::{Deserialize, Serialize};

use super::cell::{COLUMN_COUNT, Cell, Column};

/// Done-flag contents that count as complete (compared trimmed, lowercase)
pub const DEFAULT_DONE_TOKENS: [&str; 6] = ["1", "true", "yes", "да", "✔", "✓"];

/// Name-cell token that marks a row as repeating
pub const DEFAULT_REPEAT_TAG: &str = "#repeat";

/// Structural rule a grid operation would break. Always raised before any
/// mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("cannot delete the last remaining row of {day}")]
    LastRow { day: String },
    #[error("row {row} is out of bounds (day has {rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },
    #[error("column {0} is out of bounds (rows have 10 columns)")]
    ColumnOutOfBounds(usize),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

/// Check `row` against a day with `rows` rows
pub fn check_row(row: usize, rows: usize) -> Result<(), InvariantViolation> {
    if row >= rows {
        return Err(InvariantViolation::RowOutOfBounds { row, rows });
    }
    Ok(())
}

pub fn check_column(col: usize) -> Result<Column, InvariantViolation> {
    Column::from_index(col).ok_or(InvariantViolation::ColumnOutOfBounds(col))
}

/// One task row: ten text cells, empty when absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: [String; COLUMN_COUNT],
}

impl Row {
    pub fn empty() -> Self {
        Row::default()
    }

    pub fn get(&self, col: Column) -> &str {
        &self.cells[col.index()]
    }

    pub fn set(&mut self, col: Column, content: impl Into<String>) {
        self.cells[col.index()] = content.into();
    }

    /// True when every cell is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }

    pub fn is_done<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        is_done_token(self.get(Column::Done), tokens)
    }

    pub fn is_repeating(&self, tag: &str) -> bool {
        has_repeat_tag(self.get(Column::Name), tag)
    }
}

/// Whether a done-flag cell holds one of the accepted tokens
pub fn is_done_token<S: AsRef<str>>(content: &str, tokens: &[S]) -> bool {
    let normalized = content.trim().to_lowercase();
    !normalized.is_empty()
        && tokens
            .iter()
            .any(|t| t.as_ref().trim().to_lowercase() == normalized)
}

pub fn has_repeat_tag(name: &str, tag: &str) -> bool {
    name.split_whitespace().any(|token| token == tag)
}

/// Append `tag` to a name unless it is already present
pub fn add_repeat_tag(name: &str, tag: &str) -> String {
    if has_repeat_tag(name, tag) {
        return name.to_string();
    }
    let trimmed = name.trim_end();
    if trimmed.is_empty() {
        tag.to_string()
    } else {
        format!("{} {}", trimmed, tag)
    }
}

/// Remove every `tag` token from a name. The rest of the text, including
/// its spacing, is left as written.
pub fn remove_repeat_tag(name: &str, tag: &str) -> String {
    if !has_repeat_tag(name, tag) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    let mut last = 0;
    // Set when a tag opened the name, so the whitespace after it goes too
    let mut strip_next = false;
    for (start, _) in name.match_indices(tag) {
        let end = start + tag.len();
        let bounded = name[..start].chars().next_back().is_none_or(char::is_whitespace)
            && name[end..].chars().next().is_none_or(char::is_whitespace);
        if !bounded {
            continue;
        }
        let before = name[last..start].trim_end();
        out.push_str(if strip_next { before.trim_start() } else { before });
        strip_next = out.is_empty();
        last = end;
    }
    let rest = &name[last..];
    out.push_str(if strip_next { rest.trim_start() } else { rest });
    out
}

/// Materialize rows from a day's cells.
///
/// Row `i` of the result holds the cells stored at row index `i`; indices
/// with no cells become empty rows. Cells outside the column range are
/// ignored.
pub fn rows_from_cells(cells: &[Cell]) -> Vec<Row> {
    let len = cells.iter().map(|c| c.row + 1).max().unwrap_or(0);
    let mut rows = vec![Row::empty(); len];
    for cell in cells {
        if let Some(col) = Column::from_index(cell.col) {
            rows[cell.row].set(col, cell.content.clone());
        }
    }
    rows
}

/// Flatten rows into cells, one per (row, column)
pub fn cells_from_rows(rows: &[Row]) -> Vec<Cell> {
    rows.iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.cells
                .iter()
                .enumerate()
                .map(move |(c, content)| Cell::new(r, c, content.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_tokens_are_trimmed_and_case_insensitive() {
        assert!(is_done_token("1", &DEFAULT_DONE_TOKENS));
        assert!(is_done_token(" TRUE ", &DEFAULT_DONE_TOKENS));
        assert!(is_done_token("Да", &DEFAULT_DONE_TOKENS));
        assert!(is_done_token("✓", &DEFAULT_DONE_TOKENS));
        assert!(!is_done_token("0", &DEFAULT_DONE_TOKENS));
        assert!(!is_done_token("", &DEFAULT_DONE_TOKENS));
        assert!(!is_done_token("done", &DEFAULT_DONE_TOKENS));
    }

    #[test]
    fn empty_token_list_never_completes() {
        let none: [&str; 0] = [];
        assert!(!is_done_token("1", &none));
    }

    #[test]
    fn repeat_tag_add_and_remove() {
        let tagged = add_repeat_tag("Morning run", DEFAULT_REPEAT_TAG);
        assert_eq!(tagged, "Morning run #repeat");
        assert!(has_repeat_tag(&tagged, DEFAULT_REPEAT_TAG));
        assert_eq!(add_repeat_tag(&tagged, DEFAULT_REPEAT_TAG), tagged);
        assert_eq!(remove_repeat_tag(&tagged, DEFAULT_REPEAT_TAG), "Morning run");
        assert_eq!(add_repeat_tag("", DEFAULT_REPEAT_TAG), "#repeat");
    }

    #[test]
    fn removing_the_tag_keeps_the_name_spacing() {
        assert_eq!(remove_repeat_tag("Morning  run #repeat", DEFAULT_REPEAT_TAG), "Morning  run");
        assert_eq!(remove_repeat_tag("#repeat  a  b", DEFAULT_REPEAT_TAG), "a  b");
        assert_eq!(remove_repeat_tag("a  #repeat  b", DEFAULT_REPEAT_TAG), "a  b");
        assert_eq!(remove_repeat_tag("a #repeatx #repeat", DEFAULT_REPEAT_TAG), "a #repeatx");
        assert_eq!(remove_repeat_tag("#repeat x #repeat", DEFAULT_REPEAT_TAG), "x");
        assert_eq!(remove_repeat_tag("#repeat", DEFAULT_REPEAT_TAG), "");
    }

    #[test]
    fn repeat_tag_matches_whole_tokens_only() {
        assert!(!has_repeat_tag("#repeated chores", DEFAULT_REPEAT_TAG));
        assert!(has_repeat_tag("#repeat chores", DEFAULT_REPEAT_TAG));
    }

    #[test]
    fn rows_from_sparse_cells_fill_missing_columns() {
        let cells = vec![
            Cell::new(0, 1, "Write"),
            Cell::new(1, 5, "1"),
            Cell::new(1, 42, "ignored"),
        ];
        let rows = rows_from_cells(&cells);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Column::Name), "Write");
        assert_eq!(rows[0].get(Column::Done), "");
        assert!(rows[1].is_done(&DEFAULT_DONE_TOKENS));
    }

    #[test]
    fn cells_from_rows_emits_every_column() {
        let mut row = Row::empty();
        row.set(Column::Name, "Read");
        let cells = cells_from_rows(&[row, Row::empty()]);
        assert_eq!(cells.len(), 2 * COLUMN_COUNT);
        assert_eq!(cells[1], Cell::new(0, 1, "Read"));
        assert_eq!(cells[COLUMN_COUNT], Cell::new(1, 0, ""));
    }

    #[test]
    fn bounds_checks() {
        assert!(check_row(0, 1).is_ok());
        assert_eq!(
            check_row(1, 1),
            Err(InvariantViolation::RowOutOfBounds { row: 1, rows: 1 })
        );
        assert_eq!(check_column(5), Ok(Column::Done));
        assert_eq!(check_column(10), Err(InvariantViolation::ColumnOutOfBounds(10)));
    }
}
