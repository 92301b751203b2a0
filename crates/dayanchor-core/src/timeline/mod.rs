//! Day structure: minute intervals, calendar events and free gaps.
//!
//! This module provides:
//! - Minute-of-day intervals and the nightly rest window
//! - Calendar events as opaque busy intervals
//! - Gap detection between those events

mod event;
mod gap;
mod interval;

pub use event::CalendarEvent;
pub use gap::{detect_gaps, AvailableSlot, GapFinder, GapKind, GapSize};
pub use interval::{
    format_minute, parse_clock, RestWindow, TimeInterval, MINUTES_PER_DAY, SLOTS_PER_DAY,
    SLOT_MINUTES,
};
