use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error type for day keys that need calendar arithmetic
#[derive(Debug, thiserror::Error)]
pub enum DayError {
    #[error("not an ISO date (YYYY-MM-DD): {0}")]
    NotADate(String),
    #[error("no calendar day follows {0}")]
    OutOfRange(String),
}

/// Partition key for one day's grid.
///
/// Stored and compared as an opaque string; only [`Day::next`] interprets it
/// as an ISO calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Day(String);

impl Day {
    pub fn new(key: impl Into<String>) -> Self {
        Day(key.into())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Day(date.format(DATE_FORMAT).to_string())
    }

    /// The local calendar date
    pub fn today() -> Self {
        Day::from_date(Local::now().date_naive())
    }

    /// Resolve `today`, `yesterday`, `tomorrow`, or an ISO date.
    pub fn resolve(input: &str) -> Result<Self, DayError> {
        let today = Local::now().date_naive();
        let date = match input.trim() {
            "today" => today,
            "yesterday" => today - Duration::days(1),
            "tomorrow" => today + Duration::days(1),
            other => NaiveDate::parse_from_str(other, DATE_FORMAT)
                .map_err(|_| DayError::NotADate(other.to_string()))?,
        };
        Ok(Day::from_date(date))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> Result<NaiveDate, DayError> {
        NaiveDate::parse_from_str(&self.0, DATE_FORMAT).map_err(|_| DayError::NotADate(self.0.clone()))
    }

    /// The following calendar day
    pub fn next(&self) -> Result<Day, DayError> {
        let next = self
            .date()?
            .succ_opt()
            .ok_or_else(|| DayError::OutOfRange(self.0.clone()))?;
        Ok(Day::from_date(next))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
