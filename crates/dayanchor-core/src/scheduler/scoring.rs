//! Task-to-gap scoring.
//!
//! Three components, each in `[0, 1]`, combined by the configured weights:
//! duration fit, zone match and priority alignment.

use serde::{Deserialize, Serialize};

use crate::energy::EnergyZone;
use crate::storage::{EnergyConfig, ScoringConfig};

/// Component scores of one candidate placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub duration_fit: f64,
    pub zone_match: f64,
    pub priority_alignment: f64,
    pub composite: f64,
}

/// Duration fit (0..1).
///
/// Favors tight but sufficient gaps: an exact fit scores 1, a task using a
/// sliver of a long gap scores close to 0.
pub fn duration_fit(remaining_minutes: u16, duration_minutes: u16) -> f64 {
    if remaining_minutes == 0 {
        return 0.0;
    }
    let remaining = remaining_minutes as f64;
    let slack = (remaining - duration_minutes as f64).abs();
    (1.0 - slack / remaining).clamp(0.0, 1.0)
}

/// Zone match (0..1).
///
/// Full credit when `average_energy` lies in the preferred zone's band,
/// falling off linearly with distance from the band. Above the band the
/// distance is measured from its highest whole level. Tasks without a
/// preference always get full credit.
pub fn zone_match(
    average_energy: f64,
    preferred: Option<EnergyZone>,
    energy: &EnergyConfig,
    falloff: f64,
) -> f64 {
    let Some(zone) = preferred else {
        return 1.0;
    };
    let (low, high) = energy.zone_band(zone);
    let distance = if average_energy < low {
        low - average_energy
    } else if average_energy >= high {
        average_energy - (high - 1.0)
    } else {
        0.0
    };
    (1.0 - distance / falloff).clamp(0.0, 1.0)
}

/// Priority alignment (0..1).
///
/// Higher-priority tasks earn more, but only as much as the gap's energy
/// suits them.
pub fn priority_alignment(priority: i64, zone_match: f64, priority_scale: f64) -> f64 {
    let weight = (priority.max(0) as f64 / priority_scale).min(1.0);
    weight * zone_match
}

/// Score one placement.
pub fn score(
    remaining_minutes: u16,
    duration_minutes: u16,
    average_energy: f64,
    preferred: Option<EnergyZone>,
    priority: i64,
    energy: &EnergyConfig,
    scoring: &ScoringConfig,
) -> ScoreBreakdown {
    let fit = duration_fit(remaining_minutes, duration_minutes);
    let zone = zone_match(average_energy, preferred, energy, scoring.zone_distance_falloff);
    let prio = priority_alignment(priority, zone, scoring.priority_scale);

    let total_weight = scoring.duration_weight + scoring.zone_weight + scoring.priority_weight;
    let composite = if total_weight > 0.0 {
        (scoring.duration_weight * fit + scoring.zone_weight * zone + scoring.priority_weight * prio)
            / total_weight
    } else {
        0.0
    };

    ScoreBreakdown {
        duration_fit: fit,
        zone_match: zone,
        priority_alignment: prio,
        composite: composite.clamp(0.0, 1.0),
    }
}
