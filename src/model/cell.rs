use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fixed columns in every row
pub const COLUMN_COUNT: usize = 10;

/// One of the ten fixed grid columns, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    /// Life sphere the task belongs to
    Sphere,
    /// Activity name (may carry the repeat tag)
    Name,
    /// Expected product / outcome
    Product,
    /// Planned hours
    Planned,
    /// Actual hours spent
    Actual,
    /// Completion flag
    Done,
    Creative,
    Mental,
    Physical,
    Replenishment,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Sphere,
        Column::Name,
        Column::Product,
        Column::Planned,
        Column::Actual,
        Column::Done,
        Column::Creative,
        Column::Mental,
        Column::Physical,
        Column::Replenishment,
    ];

    /// Storage index of this column
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Column> {
        Column::ALL.get(index).copied()
    }

    /// Lowercase key used in the CLI and JSON output
    pub fn key(self) -> &'static str {
        match self {
            Column::Sphere => "sphere",
            Column::Name => "name",
            Column::Product => "product",
            Column::Planned => "planned",
            Column::Actual => "actual",
            Column::Done => "done",
            Column::Creative => "creative",
            Column::Mental => "mental",
            Column::Physical => "physical",
            Column::Replenishment => "replenishment",
        }
    }

    /// Parse a column from its key (case-insensitive) or its numeric index
    pub fn parse_column(s: &str) -> Option<Column> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return Column::from_index(index);
        }
        let lower = s.to_lowercase();
        Column::ALL.iter().copied().find(|c| c.key() == lower)
    }

    /// Columns holding energy-category hours
    pub fn energy() -> [Column; 4] {
        [
            Column::Creative,
            Column::Mental,
            Column::Physical,
            Column::Replenishment,
        ]
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A single persisted grid cell within one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub content: String,
}

impl Cell {
    pub fn new(row: usize, col: usize, content: impl Into<String>) -> Self {
        Cell {
            row,
            col,
            content: content.into(),
        }
    }
}
