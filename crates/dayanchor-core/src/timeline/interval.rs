//! Minute-of-day intervals and clock helpers.
//!
//! All times inside the engine are minutes since local midnight of a single
//! day. Intervals are half-open `[start, end)`; the end may be 1440 so that an
//! interval can run up to midnight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Width of one timeline slot in minutes.
pub const SLOT_MINUTES: u16 = 15;

/// Number of slots in a day.
pub const SLOTS_PER_DAY: usize = (MINUTES_PER_DAY / SLOT_MINUTES) as usize;

/// Format a minute-of-day as `HH:MM`. 1440 renders as `24:00`.
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Parse a 24-hour `HH:MM` clock value. `24:00` is accepted as end of day.
pub fn parse_clock(value: &str) -> Result<u16, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        field: "time".into(),
        message: format!("expected HH:MM, got '{value}'"),
    };

    let (h, m) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u16 = h.parse().map_err(|_| invalid())?;
    let minute: u16 = m.parse().map_err(|_| invalid())?;
    if hour > 24 || minute >= 60 || m.len() != 2 {
        return Err(invalid());
    }

    let total = hour * 60 + minute;
    if total > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(total)
}

/// A half-open `[start_minute, end_minute)` range within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    pub start_minute: u16,
    pub end_minute: u16,
}

#[derive(Deserialize)]
struct RawInterval {
    start_minute: i64,
    end_minute: i64,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = ValidationError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::from_minutes(raw.start_minute, raw.end_minute)
    }
}

impl TimeInterval {
    /// Create an interval, rejecting empty, reversed and overnight ranges.
    pub fn new(start_minute: u16, end_minute: u16) -> Result<Self, ValidationError> {
        Self::from_minutes(start_minute as i64, end_minute as i64)
    }

    /// Create an interval from untrusted signed minute values.
    pub fn from_minutes(start: i64, end: i64) -> Result<Self, ValidationError> {
        if !(0..MINUTES_PER_DAY as i64).contains(&start) {
            return Err(ValidationError::OutOfBounds {
                field: "start_minute".into(),
                value: start,
                min: 0,
                max: MINUTES_PER_DAY as i64 - 1,
            });
        }
        if !(1..=MINUTES_PER_DAY as i64).contains(&end) {
            return Err(ValidationError::OutOfBounds {
                field: "end_minute".into(),
                value: end,
                min: 1,
                max: MINUTES_PER_DAY as i64,
            });
        }
        if start >= end {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self {
            start_minute: start as u16,
            end_minute: end as u16,
        })
    }

    /// Length in minutes.
    pub fn duration_minutes(&self) -> u16 {
        self.end_minute - self.start_minute
    }

    /// Whether `minute` falls inside `[start, end)`.
    pub fn contains_minute(&self, minute: u16) -> bool {
        self.start_minute <= minute && minute < self.end_minute
    }

    /// Whether two intervals share at least one minute.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start_minute < other.end_minute && other.start_minute < self.end_minute
    }

    /// The shared sub-range of two intervals, if any.
    pub fn intersect(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start_minute.max(other.start_minute);
        let end = self.end_minute.min(other.end_minute);
        (start < end).then_some(TimeInterval {
            start_minute: start,
            end_minute: end,
        })
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minute(self.start_minute),
            format_minute(self.end_minute)
        )
    }
}

impl FromStr for TimeInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = split_range(s)?;
        Self::new(parse_clock(start)?, parse_clock(end)?)
    }
}

fn split_range(s: &str) -> Result<(&str, &str), ValidationError> {
    s.split_once('-').ok_or_else(|| ValidationError::InvalidValue {
        field: "interval".into(),
        message: format!("expected HH:MM-HH:MM, got '{s}'"),
    })
}

/// The nightly rest period excluded from gap detection.
///
/// Unlike [`TimeInterval`] this may wrap midnight: `22:00-06:00` excludes
/// `[22:00, 24:00)` and `[00:00, 06:00)`. Equal start and end means no
/// exclusion at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RestWindow {
    pub start_minute: u16,
    pub end_minute: u16,
}

impl Default for RestWindow {
    fn default() -> Self {
        Self {
            start_minute: 22 * 60,
            end_minute: 6 * 60,
        }
    }
}

impl RestWindow {
    pub fn new(start_minute: u16, end_minute: u16) -> Result<Self, ValidationError> {
        for (field, value) in [("rest_start", start_minute), ("rest_end", end_minute)] {
            if value > MINUTES_PER_DAY {
                return Err(ValidationError::OutOfBounds {
                    field: field.into(),
                    value: value as i64,
                    min: 0,
                    max: MINUTES_PER_DAY as i64,
                });
            }
        }
        Ok(Self {
            start_minute: start_minute % MINUTES_PER_DAY,
            end_minute: end_minute % MINUTES_PER_DAY,
        })
    }

    /// A rest window that excludes nothing.
    pub fn none() -> Self {
        Self {
            start_minute: 0,
            end_minute: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_minute == self.end_minute
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start_minute > self.end_minute
    }

    /// Whether `minute` is inside the rest period.
    pub fn excludes(&self, minute: u16) -> bool {
        if self.is_empty() {
            false
        } else if self.wraps_midnight() {
            minute >= self.start_minute || minute < self.end_minute
        } else {
            self.start_minute <= minute && minute < self.end_minute
        }
    }

    /// Portions of the day outside the rest period, in chronological order.
    pub fn active_spans(&self) -> Vec<TimeInterval> {
        let raw: Vec<(u16, u16)> = if self.is_empty() {
            vec![(0, MINUTES_PER_DAY)]
        } else if self.wraps_midnight() {
            vec![(self.end_minute, self.start_minute)]
        } else {
            vec![(0, self.start_minute), (self.end_minute, MINUTES_PER_DAY)]
        };

        raw.into_iter()
            .filter(|(s, e)| s < e)
            .map(|(s, e)| TimeInterval {
                start_minute: s,
                end_minute: e,
            })
            .collect()
    }

    /// Longest portion of `interval` outside the rest period.
    ///
    /// Ties go to the earlier portion.
    pub fn trim(&self, interval: &TimeInterval) -> Option<TimeInterval> {
        self.active_spans()
            .iter()
            .filter_map(|span| span.intersect(interval))
            .fold(None, |best: Option<TimeInterval>, piece| match best {
                Some(b) if b.duration_minutes() >= piece.duration_minutes() => Some(b),
                _ => Some(piece),
            })
    }
}

impl fmt::Display for RestWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minute(self.start_minute),
            format_minute(self.end_minute)
        )
    }
}

impl FromStr for RestWindow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = split_range(s)?;
        Self::new(parse_clock(start)?, parse_clock(end)?)
    }
}

impl TryFrom<String> for RestWindow {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RestWindow> for String {
    fn from(window: RestWindow) -> Self {
        window.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minute() {
        assert_eq!(format_minute(0), "00:00");
        assert_eq!(format_minute(485), "08:05");
        assert_eq!(format_minute(1425), "23:45");
        assert_eq!(format_minute(1440), "24:00");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("06:00").unwrap(), 360);
        assert_eq!(parse_clock(" 22:30 ").unwrap(), 1350);
        assert_eq!(parse_clock("24:00").unwrap(), 1440);
        assert!(parse_clock("24:01").is_err());
        assert!(parse_clock("7:5").is_err());
        assert!(parse_clock("10:60").is_err());
        assert!(parse_clock("noon").is_err());
    }

    #[test]
    fn test_interval_validation() {
        assert!(TimeInterval::new(480, 600).is_ok());
        assert!(TimeInterval::new(0, 1440).is_ok());
        assert_eq!(
            TimeInterval::new(600, 480),
            Err(ValidationError::InvalidTimeRange { start: 600, end: 480 })
        );
        assert!(TimeInterval::new(480, 480).is_err());
        assert!(TimeInterval::from_minutes(-15, 30).is_err());
        assert!(TimeInterval::from_minutes(0, 1441).is_err());
    }

    #[test]
    fn test_interval_ops() {
        let a = TimeInterval::new(480, 600).unwrap();
        let b = TimeInterval::new(570, 660).unwrap();
        let c = TimeInterval::new(600, 660).unwrap();

        assert_eq!(a.duration_minutes(), 120);
        assert!(a.contains_minute(480));
        assert!(!a.contains_minute(600));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.intersect(&b), Some(TimeInterval::new(570, 600).unwrap()));
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_interval_text_roundtrip() {
        let interval: TimeInterval = "08:00-10:30".parse().unwrap();
        assert_eq!(interval, TimeInterval::new(480, 630).unwrap());
        assert_eq!(interval.to_string(), "08:00-10:30");
        assert!("10:00-08:00".parse::<TimeInterval>().is_err());
    }

    #[test]
    fn test_interval_deserialize_validates() {
        let ok: TimeInterval =
            serde_json::from_str(r#"{"start_minute": 60, "end_minute": 120}"#).unwrap();
        assert_eq!(ok.duration_minutes(), 60);

        let bad = serde_json::from_str::<TimeInterval>(r#"{"start_minute": 120, "end_minute": 60}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_rest_window_wrapping() {
        let rest = RestWindow::default();
        assert!(rest.wraps_midnight());
        assert!(rest.excludes(23 * 60));
        assert!(rest.excludes(0));
        assert!(rest.excludes(359));
        assert!(!rest.excludes(360));
        assert_eq!(rest.active_spans(), vec![TimeInterval::new(360, 1320).unwrap()]);
        assert_eq!(rest.to_string(), "22:00-06:00");
    }

    #[test]
    fn test_rest_window_midday_trims_to_longest_piece() {
        let siesta: RestWindow = "13:00-14:00".parse().unwrap();
        let gap = TimeInterval::new(12 * 60 + 30, 16 * 60).unwrap();
        assert_eq!(siesta.trim(&gap), Some(TimeInterval::new(840, 960).unwrap()));
    }

    #[test]
    fn test_rest_window_none() {
        let none = RestWindow::none();
        assert!(none.is_empty());
        assert!(!none.excludes(0));
        let whole = TimeInterval::new(0, 1440).unwrap();
        assert_eq!(none.trim(&whole), Some(whole));
    }

    #[test]
    fn test_rest_window_trim_fully_inside() {
        let rest = RestWindow::default();
        let late = TimeInterval::new(22 * 60 + 15, 23 * 60).unwrap();
        assert_eq!(rest.trim(&late), None);
    }

    #[test]
    fn test_rest_window_serde_as_string() {
        let json = serde_json::to_string(&RestWindow::default()).unwrap();
        assert_eq!(json, "\"22:00-06:00\"");
        let parsed: RestWindow = serde_json::from_str("\"23:30-07:00\"").unwrap();
        assert_eq!(parsed.start_minute, 1410);
        assert_eq!(parsed.end_minute, 420);
    }
}
