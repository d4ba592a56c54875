use std::collections::{BTreeSet, HashMap};

use crate::model::day::Day;
use crate::model::grid::Row;

/// Per-day cache of rows whose name carries the repeat tag.
///
/// Derived from cell content: rebuilt whenever a day is opened and kept in
/// step with row inserts and deletes while it stays open.
#[derive(Debug, Default)]
pub struct RepeatMarkers {
    by_day: HashMap<Day, BTreeSet<usize>>,
}

impl RepeatMarkers {
    pub fn new() -> Self {
        RepeatMarkers::default()
    }

    /// Replace the markers of `day` by scanning the name column of `rows`
    pub fn rebuild(&mut self, day: &Day, rows: &[Row], tag: &str) {
        let marked = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_repeating(tag))
            .map(|(i, _)| i)
            .collect();
        self.by_day.insert(day.clone(), marked);
    }

    pub fn contains(&self, day: &Day, row: usize) -> bool {
        self.by_day.get(day).is_some_and(|set| set.contains(&row))
    }

    /// Marked rows of a day, ascending
    pub fn rows(&self, day: &Day) -> Vec<usize> {
        self.by_day
            .get(day)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn set(&mut self, day: &Day, row: usize, marked: bool) {
        let set = self.by_day.entry(day.clone()).or_default();
        if marked {
            set.insert(row);
        } else {
            set.remove(&row);
        }
    }

    /// A row was inserted at `at`: markers at or after it move down by one
    pub fn row_inserted(&mut self, day: &Day, at: usize) {
        if let Some(set) = self.by_day.get_mut(day) {
            *set = set.iter().map(|&r| if r >= at { r + 1 } else { r }).collect();
        }
    }

    /// Row `at` was deleted: its marker goes, later markers move up by one
    pub fn row_deleted(&mut self, day: &Day, at: usize) {
        if let Some(set) = self.by_day.get_mut(day) {
            *set = set
                .iter()
                .filter(|&&r| r != at)
                .map(|&r| if r > at { r - 1 } else { r })
                .collect();
        }
    }

    pub fn clear_day(&mut self, day: &Day) {
        self.by_day.remove(day);
    }
}
