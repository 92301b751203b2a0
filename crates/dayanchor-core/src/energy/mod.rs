//! Energy timeline synthesis.
//!
//! This module turns coarse, human-authored window hints into a
//! minute-accurate energy curve:
//! - Parsing of `"8:00 AM - 10:00 AM and ..."` window strings
//! - 96-slot timeline synthesis with interpolation and defaults
//! - Wake/sleep and zone-period summaries of a timeline

mod curve;
mod parser;
mod summary;

pub use curve::{
    synthesize_timeline, EnergyBlock, MAX_ENERGY_LEVEL, EnergySlot, EnergyTimeline, EnergyWindows, EnergyZone,
    TimelineSynthesizer,
};
pub use parser::{parse_time_windows, parse_window_list};
pub use summary::{sleep_window, wake_window, zone_periods, zone_totals, TimelineSummary};
