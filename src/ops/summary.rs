use serde::Serialize;

use crate::model::cell::Column;
use crate::model::grid::Row;

/// Hours in a day, for the advisory total check
pub const DAY_HOURS: f64 = 24.0;

/// Allowed distance of the actual-hours total from [`DAY_HOURS`]
pub const DAY_HOURS_TOLERANCE: f64 = 0.5;

/// Totals derived from one day's rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DaySummary {
    pub rows: usize,
    pub done: usize,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub creative_hours: f64,
    pub mental_hours: f64,
    pub physical_hours: f64,
    pub replenishment_hours: f64,
    /// Numeric cells that could not be parsed (counted as zero)
    pub invalid_cells: usize,
}

impl DaySummary {
    pub fn energy_hours(&self) -> f64 {
        self.creative_hours + self.mental_hours + self.physical_hours + self.replenishment_hours
    }

    /// Whether actual hours add up to roughly a full day. Advisory only.
    pub fn accounts_for_full_day(&self) -> bool {
        (self.actual_hours - DAY_HOURS).abs() <= DAY_HOURS_TOLERANCE
    }
}

/// Summarize rows. Blank rows are not counted.
pub fn summarize<S: AsRef<str>>(rows: &[Row], done_tokens: &[S]) -> DaySummary {
    let mut summary = DaySummary::default();
    for row in rows.iter().filter(|r| !r.is_blank()) {
        summary.rows += 1;
        if row.is_done(done_tokens) {
            summary.done += 1;
        }
        for col in [
            Column::Planned,
            Column::Actual,
            Column::Creative,
            Column::Mental,
            Column::Physical,
            Column::Replenishment,
        ] {
            let hours = match parse_hours(row.get(col)) {
                Some(h) => h,
                None => {
                    summary.invalid_cells += 1;
                    0.0
                }
            };
            let slot = match col {
                Column::Planned => &mut summary.planned_hours,
                Column::Actual => &mut summary.actual_hours,
                Column::Creative => &mut summary.creative_hours,
                Column::Mental => &mut summary.mental_hours,
                Column::Physical => &mut summary.physical_hours,
                _ => &mut summary.replenishment_hours,
            };
            *slot += hours;
        }
    }
    summary
}

/// Parse an hours cell. Blank is zero; a decimal comma is accepted.
/// Returns `None` for anything else that isn't a finite, non-negative number.
pub fn parse_hours(content: &str) -> Option<f64> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let value: f64 = trimmed.replace(',', ".").parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
