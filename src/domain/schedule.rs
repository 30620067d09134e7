//! Schedule time base
//!
//! The scheduling algorithms count whole days from an implicit project start
//! of zero. Calendar dates only exist at the edges: task records carry them,
//! and callers convert offsets back with [`ScheduleOffset::to_calendar`].
//!
//! This module is also the one place where partial data is normalized:
//! - unparsable dates become `None` ([`parse_date`])
//! - tasks without both dates last [`DEFAULT_DURATION_DAYS`] ([`task_duration`])

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Task;

/// Duration assumed for tasks with a missing start or due date
pub const DEFAULT_DURATION_DAYS: i64 = 1;

/// A task is critical when its slack is within this many days of zero
pub const CRITICAL_SLACK_TOLERANCE: f64 = 0.01;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parses a task date: RFC 3339 timestamp or plain `YYYY-MM-DD` (midnight UTC)
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Whole days between two dates, rounded up, at least one day
///
/// Order does not matter. A missing date on either side yields the default.
pub fn span_days(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => {
            let seconds = (end - start).num_seconds().abs() as f64;
            let days = (seconds / SECONDS_PER_DAY).ceil() as i64;
            days.max(DEFAULT_DURATION_DAYS)
        }
        _ => DEFAULT_DURATION_DAYS,
    }
}

/// Scheduled duration of a task in days
pub fn task_duration(task: &Task) -> i64 {
    span_days(task.start_date, task.due_date)
}

/// Returns true if a slack value puts a task on the critical path
pub fn is_critical(slack: i64) -> bool {
    (slack as f64).abs() < CRITICAL_SLACK_TOLERANCE
}

/// Whole days from the project start (day 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleOffset(i64);

impl ScheduleOffset {
    /// The project start
    pub const ZERO: Self = Self(0);

    pub fn new(days: i64) -> Self {
        Self(days)
    }

    /// Number of days since the project start
    pub fn days(self) -> i64 {
        self.0
    }

    /// Converts the offset to a calendar timestamp given the project start
    pub fn to_calendar(self, project_start: DateTime<Utc>) -> DateTime<Utc> {
        project_start + Duration::days(self.0)
    }

    /// Converts the offset to a calendar date given the project start date
    pub fn to_calendar_date(self, project_start: NaiveDate) -> NaiveDate {
        project_start + Duration::days(self.0)
    }
}

impl fmt::Display for ScheduleOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {}", self.0)
    }
}

impl Add<i64> for ScheduleOffset {
    type Output = ScheduleOffset;

    fn add(self, days: i64) -> Self::Output {
        ScheduleOffset(self.0 + days)
    }
}

impl Sub<i64> for ScheduleOffset {
    type Output = ScheduleOffset;

    fn sub(self, days: i64) -> Self::Output {
        ScheduleOffset(self.0 - days)
    }
}

impl Sub for ScheduleOffset {
    type Output = i64;

    fn sub(self, other: ScheduleOffset) -> Self::Output {
        self.0 - other.0
    }
}
