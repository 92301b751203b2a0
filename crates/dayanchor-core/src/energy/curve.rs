//! Energy timeline types and synthesizer.
//!
//! A timeline is a fixed 96-slot curve (one slot per 15 minutes) built from
//! categorized windows. Slots inside a window take its canonical level, slots
//! between two windows are linearly interpolated, and everything else falls
//! back to a time-of-day default.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::storage::EnergyConfig;
use crate::timeline::{format_minute, TimeInterval, SLOTS_PER_DAY, SLOT_MINUTES};

/// Highest energy level a slot may carry.
pub const MAX_ENERGY_LEVEL: u8 = 100;

/// Qualitative energy band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnergyZone {
    Peak,
    Maintenance,
    Recovery,
}

impl EnergyZone {
    pub const ALL: [EnergyZone; 3] = [EnergyZone::Peak, EnergyZone::Maintenance, EnergyZone::Recovery];

    /// Lowercase key used in config paths and CLI flags.
    pub fn key(&self) -> &'static str {
        match self {
            EnergyZone::Peak => "peak",
            EnergyZone::Maintenance => "maintenance",
            EnergyZone::Recovery => "recovery",
        }
    }
}

impl fmt::Display for EnergyZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyZone::Peak => write!(f, "Peak"),
            EnergyZone::Maintenance => write!(f, "Maintenance"),
            EnergyZone::Recovery => write!(f, "Recovery"),
        }
    }
}

/// A window tagged with its canonical energy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyBlock {
    pub interval: TimeInterval,
    pub energy_level: u8,
    pub zone: EnergyZone,
}

/// One 15-minute tick of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergySlot {
    pub slot_index: u8,
    /// `HH:MM` of the slot start
    pub time: String,
    pub energy_level: u8,
    pub zone: EnergyZone,
}

impl EnergySlot {
    /// Minute-of-day at which this slot starts.
    pub fn minute(&self) -> u16 {
        self.slot_index as u16 * SLOT_MINUTES
    }
}

/// Categorized windows feeding the synthesizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindows {
    #[serde(default)]
    pub peak: Vec<TimeInterval>,
    #[serde(default)]
    pub maintenance: Vec<TimeInterval>,
    #[serde(default)]
    pub recovery: Vec<TimeInterval>,
    /// Wake-up anchor.
    #[serde(default)]
    pub wake: Option<TimeInterval>,
    /// Wind-down anchor.
    #[serde(default)]
    pub sleep: Option<TimeInterval>,
}

/// The synthesized 96-slot energy curve. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EnergySlot>", into = "Vec<EnergySlot>")]
pub struct EnergyTimeline {
    slots: Vec<EnergySlot>,
}

impl TryFrom<Vec<EnergySlot>> for EnergyTimeline {
    type Error = ValidationError;

    fn try_from(slots: Vec<EnergySlot>) -> Result<Self, Self::Error> {
        if slots.len() != SLOTS_PER_DAY {
            return Err(ValidationError::InvalidValue {
                field: "timeline".into(),
                message: format!("expected {SLOTS_PER_DAY} slots, got {}", slots.len()),
            });
        }
        if let Some(bad) = slots.iter().enumerate().find(|(i, s)| s.slot_index as usize != *i) {
            return Err(ValidationError::InvalidValue {
                field: "timeline".into(),
                message: format!("slot {} carries index {}", bad.0, bad.1.slot_index),
            });
        }
        if let Some(bad) = slots.iter().find(|s| s.energy_level > MAX_ENERGY_LEVEL) {
            return Err(ValidationError::OutOfBounds {
                field: format!("timeline[{}].energy_level", bad.slot_index),
                value: bad.energy_level as i64,
                min: 0,
                max: MAX_ENERGY_LEVEL as i64,
            });
        }
        check_zone_order(&slots)?;
        Ok(Self { slots })
    }
}

/// Zones must be separable by level: every Peak slot above every
/// Maintenance slot, every Maintenance slot above every Recovery slot.
///
/// Thresholds are configurable, so only the ordering is checked.
fn check_zone_order(slots: &[EnergySlot]) -> Result<(), ValidationError> {
    let mut ranges: BTreeMap<EnergyZone, (u8, u8)> = BTreeMap::new();
    for slot in slots {
        let range = ranges
            .entry(slot.zone)
            .or_insert((slot.energy_level, slot.energy_level));
        range.0 = range.0.min(slot.energy_level);
        range.1 = range.1.max(slot.energy_level);
    }

    // BTreeMap order is Peak, Maintenance, Recovery.
    let present: Vec<(EnergyZone, (u8, u8))> = ranges.into_iter().collect();
    for pair in present.windows(2) {
        let (upper, (upper_min, _)) = pair[0];
        let (lower, (_, lower_max)) = pair[1];
        if upper_min <= lower_max {
            return Err(ValidationError::InvalidValue {
                field: "timeline".into(),
                message: format!(
                    "{upper} slot at level {upper_min} does not sit above {lower} slot at level {lower_max}"
                ),
            });
        }
    }
    Ok(())
}

impl From<EnergyTimeline> for Vec<EnergySlot> {
    fn from(timeline: EnergyTimeline) -> Self {
        timeline.slots
    }
}

impl EnergyTimeline {
    pub fn slots(&self) -> &[EnergySlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot covering `minute`; minutes past the day clamp to the last slot.
    pub fn slot_at_minute(&self, minute: u16) -> &EnergySlot {
        let index = (minute / SLOT_MINUTES) as usize;
        &self.slots[index.min(SLOTS_PER_DAY - 1)]
    }

    pub fn energy_at_minute(&self, minute: u16) -> u8 {
        self.slot_at_minute(minute).energy_level
    }

    /// Minute-weighted mean energy across `[start, end)`.
    pub fn average_energy(&self, interval: &TimeInterval) -> f64 {
        let total: u32 = (interval.start_minute..interval.end_minute)
            .map(|m| self.energy_at_minute(m) as u32)
            .sum();
        total as f64 / interval.duration_minutes() as f64
    }

    /// Render the curve as an hourly ASCII chart.
    pub fn render_ascii_chart(&self) -> String {
        let mut output = String::from("\nEnergy Timeline:\n");
        output.push_str(&"─".repeat(50));
        output.push('\n');

        for slot in self.slots.iter().step_by(4) {
            let bar_length = (slot.energy_level.min(MAX_ENERGY_LEVEL) as usize * 30) / 100;
            output.push_str(&format!(
                "{} {}{} {:>3} {}\n",
                slot.time,
                "█".repeat(bar_length),
                " ".repeat(30 - bar_length),
                slot.energy_level,
                slot.zone
            ));
        }

        output.push_str(&"─".repeat(50));
        output.push('\n');
        output
    }
}

/// Builds energy timelines from categorized windows.
#[derive(Debug, Clone, Default)]
pub struct TimelineSynthesizer {
    config: EnergyConfig,
}

impl TimelineSynthesizer {
    /// Create a synthesizer with the default constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom constants
    pub fn with_config(config: EnergyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnergyConfig {
        &self.config
    }

    /// Tag every window with its level and sort by start.
    ///
    /// Anchors come first so that a categorized window starting at the same
    /// minute takes precedence over them.
    pub fn build_blocks(&self, windows: &EnergyWindows) -> Vec<EnergyBlock> {
        let cfg = &self.config;
        let anchor = |interval: TimeInterval, level: u8| {
            let level = level.min(MAX_ENERGY_LEVEL);
            EnergyBlock {
                interval,
                energy_level: level,
                zone: cfg.zone_for(level),
            }
        };
        let tagged = |intervals: &[TimeInterval], zone: EnergyZone| {
            let level = cfg.canonical_level(zone).min(MAX_ENERGY_LEVEL);
            intervals
                .iter()
                .map(move |&interval| EnergyBlock {
                    interval,
                    energy_level: level,
                    zone: cfg.zone_for(level),
                })
                .collect::<Vec<_>>()
        };

        let mut blocks: Vec<EnergyBlock> = Vec::new();
        blocks.extend(windows.wake.map(|w| anchor(w, cfg.wake_anchor_level)));
        blocks.extend(windows.sleep.map(|s| anchor(s, cfg.sleep_anchor_level)));
        blocks.extend(tagged(&windows.peak, EnergyZone::Peak));
        blocks.extend(tagged(&windows.maintenance, EnergyZone::Maintenance));
        blocks.extend(tagged(&windows.recovery, EnergyZone::Recovery));

        // Stable: equal starts keep the order above.
        blocks.sort_by_key(|b| b.interval.start_minute);

        let mut reach: Option<&EnergyBlock> = None;
        for block in &blocks {
            if let Some(prev) = reach {
                if block.interval.start_minute < prev.interval.end_minute {
                    warn!(
                        earlier = %prev.interval,
                        later = %block.interval,
                        "overlapping energy windows, later start wins"
                    );
                }
            }
            if reach.map_or(true, |r| block.interval.end_minute > r.interval.end_minute) {
                reach = Some(block);
            }
        }

        blocks
    }

    /// Synthesize the 96-slot timeline. Never fails.
    pub fn synthesize(&self, windows: &EnergyWindows) -> EnergyTimeline {
        let blocks = self.build_blocks(windows);
        self.synthesize_blocks(&blocks)
    }

    /// Synthesize from blocks already sorted by start.
    pub fn synthesize_blocks(&self, blocks: &[EnergyBlock]) -> EnergyTimeline {
        let slots = (0..SLOTS_PER_DAY)
            .map(|index| {
                let minute = index as u16 * SLOT_MINUTES;
                let level = self.level_at(blocks, minute).min(MAX_ENERGY_LEVEL);
                EnergySlot {
                    slot_index: index as u8,
                    time: format_minute(minute),
                    energy_level: level,
                    zone: self.config.zone_for(level),
                }
            })
            .collect();

        EnergyTimeline { slots }
    }

    /// Level of the block owning `minute`: the last one in start order.
    fn covering_level(blocks: &[EnergyBlock], minute: u16) -> Option<u8> {
        blocks
            .iter()
            .rev()
            .find(|b| b.interval.contains_minute(minute))
            .map(|b| b.energy_level)
    }

    fn level_at(&self, blocks: &[EnergyBlock], minute: u16) -> u8 {
        if let Some(level) = Self::covering_level(blocks, minute) {
            return level;
        }

        let prev_end = blocks
            .iter()
            .map(|b| b.interval.end_minute)
            .filter(|&end| end <= minute)
            .max();
        let next_start = blocks
            .iter()
            .map(|b| b.interval.start_minute)
            .filter(|&start| start > minute)
            .min();

        let (Some(prev_end), Some(next_start)) = (prev_end, next_start) else {
            return self.config.time_of_day_level(minute);
        };

        let (Some(prev), Some(next)) = (
            Self::covering_level(blocks, prev_end - 1),
            Self::covering_level(blocks, next_start),
        ) else {
            return self.config.time_of_day_level(minute);
        };

        let prev = prev as f64;
        let next = next as f64;
        let t = (minute - prev_end) as f64 / (next_start - prev_end) as f64;
        (prev + (next - prev) * t).round().clamp(0.0, 100.0) as u8
    }
}

/// Convenience function to synthesize with default constants
pub fn synthesize_timeline(windows: &EnergyWindows) -> EnergyTimeline {
    TimelineSynthesizer::new().synthesize(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(s: &str) -> TimeInterval {
        s.parse().unwrap()
    }

    fn levels(timeline: &EnergyTimeline) -> Vec<u8> {
        timeline.slots().iter().map(|s| s.energy_level).collect()
    }

    #[test]
    fn test_empty_windows_use_time_of_day_defaults() {
        let timeline = synthesize_timeline(&EnergyWindows::default());
        assert_eq!(timeline.len(), 96);
        for slot in timeline.slots() {
            let hour = slot.minute() / 60;
            let expected = if hour < 6 {
                30
            } else if hour >= 22 {
                25
            } else {
                40
            };
            assert_eq!(slot.energy_level, expected, "slot {}", slot.time);
            assert_eq!(slot.zone, EnergyZone::Recovery);
        }
    }

    #[test]
    fn test_slot_times() {
        let timeline = synthesize_timeline(&EnergyWindows::default());
        assert_eq!(timeline.slots()[0].time, "00:00");
        assert_eq!(timeline.slots()[1].time, "00:15");
        assert_eq!(timeline.slots()[95].time, "23:45");
    }

    #[test]
    fn test_single_peak_window() {
        let windows = EnergyWindows {
            peak: vec![iv("08:00-10:00")],
            ..Default::default()
        };
        let timeline = synthesize_timeline(&windows);
        for slot in &timeline.slots()[32..40] {
            assert_eq!(slot.energy_level, 85);
            assert_eq!(slot.zone, EnergyZone::Peak);
        }
        // Only one side has a block: defaults apply.
        assert_eq!(timeline.slots()[31].energy_level, 40);
        assert_eq!(timeline.slots()[40].energy_level, 40);
    }

    #[test]
    fn test_interpolation_between_blocks() {
        let windows = EnergyWindows {
            peak: vec![iv("08:00-09:00")],
            recovery: vec![iv("10:00-11:00")],
            ..Default::default()
        };
        let timeline = synthesize_timeline(&windows);
        // 09:00 .. 09:45 from 85 toward 35 over 60 minutes.
        assert_eq!(&levels(&timeline)[36..40], &[85, 73, 60, 48]);
        assert_eq!(timeline.slots()[37].zone, EnergyZone::Maintenance);
        assert_eq!(timeline.slots()[39].zone, EnergyZone::Recovery);
        assert_eq!(timeline.slots()[40].energy_level, 35);
    }

    #[test]
    fn test_overlap_later_start_wins() {
        let windows = EnergyWindows {
            peak: vec![iv("08:00-11:00")],
            recovery: vec![iv("10:00-12:00")],
            ..Default::default()
        };
        let timeline = synthesize_timeline(&windows);
        assert_eq!(timeline.energy_at_minute(9 * 60), 85);
        assert_eq!(timeline.energy_at_minute(10 * 60), 35);
        assert_eq!(timeline.energy_at_minute(10 * 60 + 45), 35);
    }

    #[test]
    fn test_overlap_equal_start_later_category_wins() {
        let windows = EnergyWindows {
            peak: vec![iv("08:00-09:00")],
            maintenance: vec![iv("08:00-09:00")],
            ..Default::default()
        };
        let timeline = synthesize_timeline(&windows);
        assert_eq!(timeline.energy_at_minute(8 * 60), 60);
    }

    #[test]
    fn test_anchor_blocks() {
        let windows = EnergyWindows {
            wake: Some(iv("06:00-07:00")),
            peak: vec![iv("09:00-10:00")],
            ..Default::default()
        };
        let timeline = synthesize_timeline(&windows);
        assert_eq!(timeline.energy_at_minute(6 * 60), 35);
        assert_eq!(timeline.energy_at_minute(8 * 60), 60);
        assert_eq!(timeline.energy_at_minute(9 * 60), 85);
    }

    #[test]
    fn test_custom_config_levels() {
        let config = EnergyConfig {
            peak_level: 95,
            daytime_level: 45,
            ..Default::default()
        };
        let windows = EnergyWindows {
            peak: vec![iv("08:00-09:00")],
            ..Default::default()
        };
        let timeline = TimelineSynthesizer::with_config(config).synthesize(&windows);
        assert_eq!(timeline.energy_at_minute(8 * 60), 95);
        assert_eq!(timeline.energy_at_minute(12 * 60), 45);
    }

    #[test]
    fn test_average_energy_is_minute_weighted() {
        let windows = EnergyWindows {
            peak: vec![iv("08:00-08:15")],
            ..Default::default()
        };
        let timeline = synthesize_timeline(&windows);
        let avg = timeline.average_energy(&iv("08:00-08:30"));
        assert!((avg - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_timeline_serde_roundtrip_checks_length() {
        let timeline = synthesize_timeline(&EnergyWindows::default());
        let json = serde_json::to_string(&timeline).unwrap();
        let back: EnergyTimeline = serde_json::from_str(&json).unwrap();
        assert_eq!(back, timeline);

        let truncated: Vec<EnergySlot> = timeline.slots()[..10].to_vec();
        let json = serde_json::to_string(&truncated).unwrap();
        assert!(serde_json::from_str::<EnergyTimeline>(&json).is_err());
    }

    #[test]
    fn test_render_ascii_chart() {
        let chart = synthesize_timeline(&EnergyWindows::default()).render_ascii_chart();
        assert!(chart.contains("00:00"));
        assert!(chart.contains("23:00"));
        assert!(!chart.contains("23:45"));
    }

    fn tampered(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let timeline = synthesize_timeline(&EnergyWindows {
            peak: vec![iv("08:00-10:00")],
            ..Default::default()
        });
        let mut json = serde_json::to_value(&timeline).unwrap();
        edit(&mut json);
        json.to_string()
    }

    #[test]
    fn test_deserialize_rejects_level_above_100() {
        let json = tampered(|v| {
            v[8]["energy_level"] = 200.into();
            v[8]["zone"] = "Recovery".into();
        });
        assert!(serde_json::from_str::<EnergyTimeline>(&json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_zone_out_of_order() {
        // 08:00 is a Peak slot at 85; calling it Recovery puts Recovery above Peak.
        let json = tampered(|v| v[32]["zone"] = "Recovery".into());
        assert!(serde_json::from_str::<EnergyTimeline>(&json).is_err());

        // 03:00 sits at 30; calling it Peak puts Peak below Recovery.
        let json = tampered(|v| v[12]["zone"] = "Peak".into());
        assert!(serde_json::from_str::<EnergyTimeline>(&json).is_err());
    }

    #[test]
    fn test_custom_thresholds_roundtrip() {
        let config = EnergyConfig {
            peak_threshold: 90,
            maintenance_threshold: 80,
            peak_level: 95,
            maintenance_level: 85,
            ..Default::default()
        };
        let timeline = TimelineSynthesizer::with_config(config).synthesize(&EnergyWindows {
            peak: vec![iv("08:00-10:00")],
            maintenance: vec![iv("13:00-14:00")],
            ..Default::default()
        });
        let json = serde_json::to_string(&timeline).unwrap();
        let back: EnergyTimeline = serde_json::from_str(&json).unwrap();
        assert_eq!(back, timeline);
    }

    #[test]
    fn test_unvalidated_config_levels_are_capped() {
        let config = EnergyConfig {
            daytime_level: 180,
            peak_level: 250,
            ..Default::default()
        };
        let synthesizer = TimelineSynthesizer::with_config(config);
        let timeline = synthesizer.synthesize(&EnergyWindows {
            peak: vec![iv("08:00-10:00")],
            ..Default::default()
        });

        assert_eq!(timeline.energy_at_minute(12 * 60), MAX_ENERGY_LEVEL);
        assert_eq!(timeline.energy_at_minute(8 * 60), MAX_ENERGY_LEVEL);
        assert!(timeline.slots().iter().all(|s| s.energy_level <= MAX_ENERGY_LEVEL));

        let blocks = synthesizer.build_blocks(&EnergyWindows {
            peak: vec![iv("08:00-10:00")],
            ..Default::default()
        });
        assert_eq!(blocks[0].energy_level, MAX_ENERGY_LEVEL);

        let chart = timeline.render_ascii_chart();
        assert!(chart.contains("12:00"));
    }
}
