//! Busy intervals supplied by the calendar provider adapter.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::interval::{TimeInterval, MINUTES_PER_DAY};
use crate::error::ValidationError;

/// An opaque busy interval on the planned day.
///
/// Minutes are kept signed so that bad upstream data can be reported as a
/// validation failure instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start_minute: i64,
    pub end_minute: i64,
    #[serde(default)]
    pub label: String,
}

impl CalendarEvent {
    /// Create a new calendar event
    pub fn new(start_minute: i64, end_minute: i64, label: impl Into<String>) -> Self {
        Self {
            start_minute,
            end_minute,
            label: label.into(),
        }
    }

    /// Build an event from provider datetimes, clipped to `day`.
    ///
    /// Events that end before or start after the day yield `None`; multi-day
    /// events are cut at the day's midnights.
    pub fn clip_to_day(
        label: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        day: NaiveDate,
    ) -> Option<Self> {
        let day_start = day.and_time(NaiveTime::MIN);
        let day_end = day_start + chrono::Duration::minutes(MINUTES_PER_DAY as i64);

        let start = start.max(day_start);
        let end = end.min(day_end);
        if start >= end {
            return None;
        }

        Some(Self::new(
            (start - day_start).num_minutes(),
            (end - day_start).num_minutes(),
            label,
        ))
    }

    /// Validate the event as a same-day interval.
    pub fn interval(&self) -> Result<TimeInterval, ValidationError> {
        TimeInterval::from_minutes(self.start_minute, self.end_minute)
    }
}
