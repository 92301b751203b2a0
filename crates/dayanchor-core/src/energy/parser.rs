//! Parsing of human-authored time window hints.
//!
//! Accepts strings like `"8:00 AM - 10:00 AM and 2:00 PM - 4:00 PM"`. Each
//! clause is matched on its own; clauses that do not match are dropped with a
//! warning so one bad window never discards the rest.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::timeline::TimeInterval;

fn clause_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([AP]M)\s*[-–]\s*(\d{1,2}):(\d{2})\s*([AP]M)$")
            .expect("clause pattern compiles")
    })
}

fn conjunction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\s+and\s+").expect("conjunction pattern compiles"))
}

/// Convert a 12-hour clock reading to minute-of-day.
///
/// `12 AM` is midnight and `12 PM` is noon.
fn to_minute_of_day(hour: &str, minute: &str, meridiem: &str) -> Option<u16> {
    let hour: u16 = hour.parse().ok()?;
    let minute: u16 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) || minute >= 60 {
        return None;
    }

    let hour = match (hour, meridiem.eq_ignore_ascii_case("PM")) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(hour * 60 + minute)
}

fn parse_clause(clause: &str) -> Option<TimeInterval> {
    let caps = clause_pattern().captures(clause)?;
    let start = to_minute_of_day(&caps[1], &caps[2], &caps[3])?;
    let end = to_minute_of_day(&caps[4], &caps[5], &caps[6])?;
    TimeInterval::new(start, end).ok()
}

/// Parse one compound window string into intervals.
///
/// Empty or missing input yields an empty list.
pub fn parse_time_windows(input: Option<&str>) -> Vec<TimeInterval> {
    let Some(text) = input.map(str::trim).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };

    conjunction_pattern()
        .split(text)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .filter_map(|clause| {
            let parsed = parse_clause(clause);
            if parsed.is_none() {
                warn!(clause, "dropping unparseable time window");
            }
            parsed
        })
        .collect()
}

/// Parse a list of window strings, concatenating the results in order.
pub fn parse_window_list<S: AsRef<str>>(inputs: &[S]) -> Vec<TimeInterval> {
    inputs
        .iter()
        .flat_map(|s| parse_time_windows(Some(s.as_ref())))
        .collect()
}
