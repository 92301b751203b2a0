//! The single entry point exposed to the rest of the product.
//!
//! `AnchorEngine::run` chains parser, synthesizer, summary, gap finder and
//! coordinator over one request. It performs no I/O and keeps no state
//! between calls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::energy::{
    parse_time_windows, parse_window_list, EnergyTimeline, EnergyWindows, TimelineSummary,
    TimelineSynthesizer,
};
use crate::error::{Result, ValidationError};
use crate::scheduler::{AnchoringCoordinator, CandidateTask, SlotAssignment};
use crate::storage::EngineConfig;
use crate::timeline::{AvailableSlot, CalendarEvent, GapFinder, RestWindow, MINUTES_PER_DAY};

/// Everything needed to anchor one user-day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorRequest {
    /// Day being planned; echoed back for the persistence key.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub candidate_tasks: Vec<CandidateTask>,
    #[serde(default)]
    pub peak_windows: Vec<String>,
    #[serde(default)]
    pub maintenance_windows: Vec<String>,
    #[serde(default)]
    pub recovery_windows: Vec<String>,
    /// Wake-up anchor in the same text form as the windows.
    #[serde(default)]
    pub wake_window: Option<String>,
    /// Wind-down anchor in the same text form as the windows.
    #[serde(default)]
    pub sleep_window: Option<String>,
    #[serde(default)]
    pub calendar_events: Vec<CalendarEvent>,
    /// Overrides `gaps.min_gap_minutes` from the config.
    #[serde(default)]
    pub min_gap_minutes: Option<i64>,
    /// Overrides `gaps.rest_window` from the config.
    #[serde(default)]
    pub rest_exclusion: Option<RestWindow>,
}

impl AnchorRequest {
    /// SHA-256 of the canonical JSON form, hex encoded.
    ///
    /// Identical requests always produce the same fingerprint, so callers can
    /// use it when keying stored results.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Reject contract violations before any work starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for task in &self.candidate_tasks {
            task.validate()?;
        }
        for event in &self.calendar_events {
            event.interval()?;
        }
        if let Some(min_gap) = self.min_gap_minutes {
            if !(1..=MINUTES_PER_DAY as i64).contains(&min_gap) {
                return Err(ValidationError::OutOfBounds {
                    field: "min_gap_minutes".into(),
                    value: min_gap,
                    min: 1,
                    max: MINUTES_PER_DAY as i64,
                });
            }
        }
        Ok(())
    }

    /// Parse the raw window text into categorized intervals.
    pub fn energy_windows(&self) -> EnergyWindows {
        let first = |text: &Option<String>| parse_time_windows(text.as_deref()).into_iter().next();
        EnergyWindows {
            peak: parse_window_list(&self.peak_windows),
            maintenance: parse_window_list(&self.maintenance_windows),
            recovery: parse_window_list(&self.recovery_windows),
            wake: first(&self.wake_window),
            sleep: first(&self.sleep_window),
        }
    }
}

/// Output of one anchoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorResult {
    pub date: Option<NaiveDate>,
    pub timeline: EnergyTimeline,
    pub summary: TimelineSummary,
    /// Gaps as detected, before any capacity was consumed.
    pub gaps: Vec<AvailableSlot>,
    pub assignments: Vec<SlotAssignment>,
    pub tasks_rescheduled: usize,
    pub tasks_kept_original: usize,
    pub average_confidence: f64,
}

/// Runs the full anchoring pipeline under one configuration.
#[derive(Debug, Clone, Default)]
pub struct AnchorEngine {
    config: EngineConfig,
}

impl AnchorEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Anchor the request's tasks.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for invalid tasks, events or gap
    /// minimum, and `CoreError::Config` for an inconsistent configuration.
    /// Malformed window text is not an error.
    pub fn run(&self, request: &AnchorRequest) -> Result<AnchorResult> {
        self.config.validate()?;
        request.validate()?;

        let windows = request.energy_windows();
        debug!(
            peak = windows.peak.len(),
            maintenance = windows.maintenance.len(),
            recovery = windows.recovery.len(),
            "parsed energy windows"
        );

        let timeline = TimelineSynthesizer::with_config(self.config.energy.clone()).synthesize(&windows);
        let summary = TimelineSummary::from_timeline(&timeline);

        let mut finder = GapFinder::from_config(&self.config.gaps);
        if let Some(min_gap) = request.min_gap_minutes {
            finder = finder.with_min_gap(min_gap as u16);
        }
        if let Some(rest) = request.rest_exclusion {
            finder = finder.with_rest_window(rest);
        }
        let gaps = finder.find_gaps_for_events(&request.calendar_events)?;

        let outcome = AnchoringCoordinator::with_config(&self.config).anchor_tasks(
            &timeline,
            &gaps,
            &request.candidate_tasks,
        );

        Ok(AnchorResult {
            date: request.date,
            timeline,
            summary,
            gaps,
            assignments: outcome.assignments,
            tasks_rescheduled: outcome.tasks_rescheduled,
            tasks_kept_original: outcome.tasks_kept_original,
            average_confidence: outcome.average_confidence,
        })
    }
}

/// Convenience function to anchor with the default configuration
pub fn anchor(request: &AnchorRequest) -> Result<AnchorResult> {
    AnchorEngine::new().run(request)
}
