use serde::Serialize;

use crate::model::cell::Column;
use crate::model::day::Day;
use crate::model::grid::Row;
use crate::ops::rollover::RolloverReport;
use crate::ops::summary::DaySummary;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RowJson {
    pub index: usize,
    pub done: bool,
    pub repeating: bool,
    pub sphere: String,
    pub name: String,
    pub product: String,
    pub planned: String,
    pub actual: String,
    pub done_flag: String,
    pub creative: String,
    pub mental: String,
    pub physical: String,
    pub replenishment: String,
}

#[derive(Serialize)]
pub struct DayJson {
    pub day: Day,
    pub rows: Vec<RowJson>,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub day: Day,
    #[serde(flatten)]
    pub summary: DaySummary,
    pub energy_hours: f64,
    pub full_day: bool,
}

pub fn row_to_json(index: usize, row: &Row, done: bool, repeating: bool) -> RowJson {
    let cell = |c: Column| row.get(c).to_string();
    RowJson {
        index,
        done,
        repeating,
        sphere: cell(Column::Sphere),
        name: cell(Column::Name),
        product: cell(Column::Product),
        planned: cell(Column::Planned),
        actual: cell(Column::Actual),
        done_flag: cell(Column::Done),
        creative: cell(Column::Creative),
        mental: cell(Column::Mental),
        physical: cell(Column::Physical),
        replenishment: cell(Column::Replenishment),
    }
}

pub fn stats_to_json(day: &Day, summary: &DaySummary) -> StatsJson {
    StatsJson {
        day: day.clone(),
        summary: summary.clone(),
        energy_hours: summary.energy_hours(),
        full_day: summary.accounts_for_full_day(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format one row as a single line: `  3 [x] name  (sphere) -> product  2/1,5h`
pub fn format_row_line(index: usize, row: &Row, done: bool, repeating: bool) -> String {
    let mark = if done { 'x' } else { ' ' };
    let mut line = format!("{:>3} [{}] {}", index, mark, row.get(Column::Name));
    if repeating && !row.get(Column::Name).is_empty() {
        line.push_str(" ↻");
    }
    let sphere = row.get(Column::Sphere);
    if !sphere.is_empty() {
        line.push_str(&format!("  ({})", sphere));
    }
    let product = row.get(Column::Product);
    if !product.is_empty() {
        line.push_str(&format!(" -> {}", product));
    }
    let planned = row.get(Column::Planned);
    let actual = row.get(Column::Actual);
    if !planned.is_empty() || !actual.is_empty() {
        let show = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        line.push_str(&format!("  {}/{}h", show(planned), show(actual)));
    }
    let energy: Vec<String> = Column::energy()
        .into_iter()
        .filter(|c| !row.get(*c).is_empty())
        .map(|c| format!("{}={}", c.key(), row.get(c)))
        .collect();
    if !energy.is_empty() {
        line.push_str(&format!("  [{}]", energy.join(" ")));
    }
    line
}

pub fn format_day_header(day: &Day) -> String {
    format!("== {} ==", day)
}

pub fn format_summary(day: &Day, summary: &DaySummary) -> Vec<String> {
    let mut lines = vec![format_day_header(day)];
    lines.push(format!("rows: {} ({} done)", summary.rows, summary.done));
    lines.push(format!(
        "hours: planned {} / actual {}",
        format_hours(summary.planned_hours),
        format_hours(summary.actual_hours)
    ));
    lines.push(format!(
        "energy: creative {}  mental {}  physical {}  replenishment {}",
        format_hours(summary.creative_hours),
        format_hours(summary.mental_hours),
        format_hours(summary.physical_hours),
        format_hours(summary.replenishment_hours)
    ));
    if !summary.accounts_for_full_day() {
        lines.push(format!(
            "note: actual hours add up to {}, not 24",
            format_hours(summary.actual_hours)
        ));
    }
    if summary.invalid_cells > 0 {
        lines.push(format!(
            "note: {} cell(s) are not numbers and were counted as 0",
            summary.invalid_cells
        ));
    }
    lines
}

pub fn format_rollover(report: &RolloverReport) -> String {
    format!(
        "rolled over {} -> {}: {} carried, {} done",
        report.from, report.to, report.carried, report.completed
    )
}

/// Hours to two decimals, without trailing zeros
fn format_hours(hours: f64) -> String {
    format!("{:.2}", hours)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
