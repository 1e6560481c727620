// Task record and date/time parsing

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Formats accepted for a task's `dateTime`, most specific first.
///
/// `%.f` also matches an absent fractional part.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A single to-do item
///
/// Serialized with the field names `id`, `text`, `dateTime` and `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Creation timestamp in milliseconds, unique within a collection
    pub id: i64,
    pub text: String,
    /// Local due date/time as entered, e.g. `2025-01-01T09:30`
    pub date_time: String,
    pub completed: bool,
}

impl Task {
    pub fn new(id: i64, text: impl Into<String>, date_time: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            date_time: date_time.into(),
            completed: false,
        }
    }

    /// Parsed due date/time, `None` if the stored string is not a recognized format
    pub fn due(&self) -> Option<NaiveDateTime> {
        parse_date_time(&self.date_time)
    }
}

/// Parse an ISO-local date/time string
pub fn parse_date_time(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}

/// Trim user input and expand a bare `YYYY-MM-DD` to midnight.
///
/// Anything else is returned trimmed but otherwise untouched.
pub fn normalize_date_time(input: &str) -> String {
    let input = input.trim();
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => date.format("%Y-%m-%dT00:00").to_string(),
        Err(_) => input.to_string(),
    }
}

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
