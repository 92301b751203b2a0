//! Read-only projections of a synthesized timeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::curve::{EnergySlot, EnergyTimeline, EnergyZone};
use crate::timeline::SLOT_MINUTES;

/// Energy that three consecutive slots must exceed to mark waking up.
const WAKE_ONSET_LEVEL: u8 = 50;
/// Energy that three consecutive slots must stay under to mark winding down.
const SLEEP_ONSET_LEVEL: u8 = 35;
/// Sleep detection ignores anything before 15:00.
const SLEEP_SCAN_START: usize = 60;
const RUN_LENGTH: usize = 3;
/// Last slot index a three-slot run may start at.
const LAST_RUN_START: usize = 92;

/// Derived view of a timeline. Never the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub optimal_wake_window: Option<String>,
    pub optimal_sleep_window: Option<String>,
    pub zone_periods: BTreeMap<EnergyZone, Vec<String>>,
    pub zone_total_minutes: BTreeMap<EnergyZone, u32>,
}

impl TimelineSummary {
    /// Project a summary out of `timeline`.
    pub fn from_timeline(timeline: &EnergyTimeline) -> Self {
        let slots = timeline.slots();
        Self {
            optimal_wake_window: wake_window(slots),
            optimal_sleep_window: sleep_window(slots),
            zone_periods: zone_periods(slots),
            zone_total_minutes: zone_totals(slots),
        }
    }
}

fn window(slots: &[EnergySlot], from: usize, to: usize) -> String {
    format!("{}-{}", slots[from].time, slots[to].time)
}

/// First run of three slots above the wake level, reported up to four slots on.
pub fn wake_window(slots: &[EnergySlot]) -> Option<String> {
    let last = slots.len().checked_sub(1)?;
    slots
        .windows(RUN_LENGTH)
        .take(LAST_RUN_START + 1)
        .position(|run| run.iter().all(|s| s.energy_level > WAKE_ONSET_LEVEL))
        .map(|i| window(slots, i, (i + 4).min(last)))
}

/// First afternoon run of three slots under the sleep level, reported from four slots back.
pub fn sleep_window(slots: &[EnergySlot]) -> Option<String> {
    slots
        .windows(RUN_LENGTH)
        .take(LAST_RUN_START + 1)
        .enumerate()
        .skip(SLEEP_SCAN_START)
        .find(|(_, run)| run.iter().all(|s| s.energy_level < SLEEP_ONSET_LEVEL))
        .map(|(i, _)| window(slots, i.saturating_sub(4), i))
}

/// Runs of consecutive same-zone slots, rendered `start-end` by slot times.
pub fn zone_periods(slots: &[EnergySlot]) -> BTreeMap<EnergyZone, Vec<String>> {
    let mut periods: BTreeMap<EnergyZone, Vec<String>> =
        EnergyZone::ALL.iter().map(|&z| (z, Vec::new())).collect();

    let mut run_start = 0;
    for i in 1..=slots.len() {
        if i == slots.len() || slots[i].zone != slots[run_start].zone {
            if let Some(list) = periods.get_mut(&slots[run_start].zone) {
                list.push(window(slots, run_start, i - 1));
            }
            run_start = i;
        }
    }
    periods
}

pub fn zone_totals(slots: &[EnergySlot]) -> BTreeMap<EnergyZone, u32> {
    EnergyZone::ALL
        .iter()
        .map(|&zone| {
            let count = slots.iter().filter(|s| s.zone == zone).count() as u32;
            (zone, count * SLOT_MINUTES as u32)
        })
        .collect()
}
