//! Free-capacity detection between calendar events.
//!
//! Finds available time slots between existing events that can be used
//! for anchoring tasks. No energy awareness here, only busy/free structure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::event::CalendarEvent;
use super::interval::{RestWindow, TimeInterval, MINUTES_PER_DAY};
use crate::error::ValidationError;
use crate::storage::GapConfig;

/// Where a gap sits relative to the day's events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapKind {
    MorningStart,
    BetweenEvents,
    EveningEnd,
    FullDay,
}

/// Size category of a time gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapSize {
    Small,  // up to 29 minutes
    Medium, // 30-60 minutes
    Large,  // over 60 minutes
}

impl GapSize {
    /// Categorize a gap by its duration in minutes
    pub fn from_minutes(minutes: u16) -> Self {
        if minutes < 30 {
            Self::Small
        } else if minutes <= 60 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

/// A free window in the calendar, with capacity consumed during anchoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    /// The gap as detected.
    pub interval: TimeInterval,
    pub gap_kind: GapKind,
    pub size_class: GapSize,
    /// Current start; advances as tasks are placed.
    pub start_minute: u16,
    pub remaining_minutes: u16,
}

impl AvailableSlot {
    pub fn new(interval: TimeInterval, gap_kind: GapKind) -> Self {
        let duration = interval.duration_minutes();
        Self {
            interval,
            gap_kind,
            size_class: GapSize::from_minutes(duration),
            start_minute: interval.start_minute,
            remaining_minutes: duration,
        }
    }

    /// End of the gap; never moves.
    pub fn end_minute(&self) -> u16 {
        self.interval.end_minute
    }

    /// Check if this gap can still fit a task of given duration
    pub fn can_fit(&self, minutes: u16) -> bool {
        self.remaining_minutes >= minutes
    }
}

/// Detector for finding free windows in one day's calendar
#[derive(Debug, Clone)]
pub struct GapFinder {
    /// Minimum gap duration to report (in minutes)
    min_gap_minutes: u16,
    rest: RestWindow,
}

impl GapFinder {
    /// Create a finder with default settings (15 min minimum, 22:00-06:00 rest)
    pub fn new() -> Self {
        Self {
            min_gap_minutes: 15,
            rest: RestWindow::default(),
        }
    }

    pub fn from_config(config: &GapConfig) -> Self {
        Self {
            min_gap_minutes: config.min_gap_minutes,
            rest: config.rest_window(),
        }
    }

    /// Set the minimum gap duration
    pub fn with_min_gap(mut self, minutes: u16) -> Self {
        self.min_gap_minutes = minutes;
        self
    }

    /// Set the excluded rest period
    pub fn with_rest_window(mut self, rest: RestWindow) -> Self {
        self.rest = rest;
        self
    }

    /// Validate raw provider events and find gaps around them.
    pub fn find_gaps_for_events(
        &self,
        events: &[CalendarEvent],
    ) -> Result<Vec<AvailableSlot>, ValidationError> {
        let busy = events
            .iter()
            .map(CalendarEvent::interval)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.find_gaps(&busy))
    }

    /// Find gaps around busy intervals.
    ///
    /// Busy intervals are sorted and overlapping ones merged first. Each raw
    /// gap is trimmed to its longest portion outside the rest window and
    /// dropped if that leaves less than the minimum gap. Events wholly inside
    /// the rest window do not count when labelling morning and full-day gaps.
    ///
    /// # Returns
    /// Gaps sorted by start time
    pub fn find_gaps(&self, busy: &[TimeInterval]) -> Vec<AvailableSlot> {
        let mut sorted: Vec<TimeInterval> = busy.to_vec();
        sorted.sort();

        let mut raw = Vec::with_capacity(sorted.len() + 1);
        if sorted.is_empty() {
            raw.push((GapKind::FullDay, 0, MINUTES_PER_DAY));
        } else {
            // Events lying wholly inside the rest window do not end the morning.
            let mut awake_busy = false;
            let mut last_end = 0;
            for event in &sorted {
                if event.start_minute > last_end {
                    let kind = if awake_busy {
                        GapKind::BetweenEvents
                    } else {
                        GapKind::MorningStart
                    };
                    raw.push((kind, last_end, event.start_minute));
                }
                awake_busy |= self.rest.trim(event).is_some();
                last_end = last_end.max(event.end_minute);
            }
            if last_end < MINUTES_PER_DAY {
                raw.push((GapKind::EveningEnd, last_end, MINUTES_PER_DAY));
            }
            if !awake_busy {
                for gap in &mut raw {
                    gap.0 = GapKind::FullDay;
                }
            }
        }

        raw.into_iter()
            .filter_map(|(kind, start, end)| {
                let interval = TimeInterval { start_minute: start, end_minute: end };
                let trimmed = self.rest.trim(&interval)?;
                if trimmed.duration_minutes() < self.min_gap_minutes {
                    debug!(gap = %trimmed, ?kind, "discarding gap below minimum");
                    return None;
                }
                Some(AvailableSlot::new(trimmed, kind))
            })
            .collect()
    }
}

impl Default for GapFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to find gaps with default settings
pub fn detect_gaps(busy: &[TimeInterval]) -> Vec<AvailableSlot> {
    GapFinder::new().find_gaps(busy)
}
