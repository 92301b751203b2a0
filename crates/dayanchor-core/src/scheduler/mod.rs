//! Energy-aware anchoring of candidate tasks into calendar gaps.
//!
//! This module provides greedy assignment of tasks to free capacity:
//! - Tasks are processed by descending priority
//! - Every gap that still fits a task is scored (duration, zone, priority)
//! - The best gap wins; its capacity is consumed left to right
//! - Tasks without an acceptable gap keep their original start

pub mod scoring;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::energy::{EnergyTimeline, EnergyZone};
use crate::error::ValidationError;
use crate::storage::{EnergyConfig, EngineConfig, ScoringConfig};
use crate::timeline::{AvailableSlot, TimeInterval, MINUTES_PER_DAY, SLOT_MINUTES};

pub use scoring::ScoreBreakdown;

/// A task proposed for anchoring by the task source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTask {
    pub id: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub preferred_zone: Option<EnergyZone>,
    pub original_start_minute: i64,
}

impl CandidateTask {
    /// Reject durations outside `(0, 1440]` and starts outside the day.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MINUTES_PER_DAY as i64).contains(&self.duration_minutes) {
            return Err(ValidationError::InvalidDuration {
                task_id: self.id.clone(),
                minutes: self.duration_minutes,
            });
        }
        if !(0..MINUTES_PER_DAY as i64).contains(&self.original_start_minute) {
            return Err(ValidationError::OutOfBounds {
                field: format!("tasks[{}].original_start_minute", self.id),
                value: self.original_start_minute,
                min: 0,
                max: MINUTES_PER_DAY as i64 - 1,
            });
        }
        Ok(())
    }
}

/// Where a task ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub task_id: String,
    pub assigned_start_minute: u16,
    /// May pass 1440 for a late task kept at its original start.
    pub assigned_end_minute: u16,
    pub confidence_score: f64,
    pub was_rescheduled: bool,
    pub reasoning: String,
    /// Index into the input gap list, `None` when kept at the original start.
    pub gap_index: Option<usize>,
}

/// Result of one coordinator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorOutcome {
    /// One per task, in input order.
    pub assignments: Vec<SlotAssignment>,
    pub tasks_rescheduled: usize,
    pub tasks_kept_original: usize,
    pub average_confidence: f64,
    /// Gap capacity left after the run.
    pub remaining_gaps: Vec<AvailableSlot>,
}

/// Best placement found for one task.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    arena_index: usize,
    start_minute: u16,
    breakdown: ScoreBreakdown,
}

/// Gap copy owned by one run, remembering which input gap it came from.
#[derive(Debug, Clone)]
struct ArenaSlot {
    origin: usize,
    slot: AvailableSlot,
}

/// Greedy task-to-gap coordinator
#[derive(Debug, Clone, Default)]
pub struct AnchoringCoordinator {
    energy: EnergyConfig,
    scoring: ScoringConfig,
}

impl AnchoringCoordinator {
    /// Create a coordinator with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            energy: config.energy.clone(),
            scoring: config.scoring.clone(),
        }
    }

    /// Anchor `tasks` into `gaps` using `timeline` for energy.
    ///
    /// Tasks must already be validated. `gaps` is copied; the caller's list
    /// is never touched, so repeated calls with the same input give the same
    /// output.
    pub fn anchor_tasks(
        &self,
        timeline: &EnergyTimeline,
        gaps: &[AvailableSlot],
        tasks: &[CandidateTask],
    ) -> AnchorOutcome {
        let mut arena: Vec<ArenaSlot> = gaps
            .iter()
            .enumerate()
            .map(|(origin, slot)| ArenaSlot {
                origin,
                slot: slot.clone(),
            })
            .collect();

        let mut order: Vec<usize> = (0..tasks.len()).collect();
        order.sort_by(|&a, &b| {
            tasks[b]
                .priority
                .cmp(&tasks[a].priority)
                .then(tasks[a].original_start_minute.cmp(&tasks[b].original_start_minute))
        });

        let mut results: Vec<Option<SlotAssignment>> = vec![None; tasks.len()];
        for index in order {
            let task = &tasks[index];
            results[index] = Some(self.anchor_one(timeline, &mut arena, task));
        }
        let assignments: Vec<SlotAssignment> = results.into_iter().flatten().collect();

        let tasks_rescheduled = assignments.iter().filter(|a| a.was_rescheduled).count();
        let tasks_kept_original = assignments.len() - tasks_rescheduled;
        let average_confidence = if assignments.is_empty() {
            0.0
        } else {
            assignments.iter().map(|a| a.confidence_score).sum::<f64>() / assignments.len() as f64
        };

        info!(
            tasks = assignments.len(),
            tasks_rescheduled,
            tasks_kept_original,
            average_confidence,
            "anchoring run complete"
        );

        AnchorOutcome {
            assignments,
            tasks_rescheduled,
            tasks_kept_original,
            average_confidence,
            remaining_gaps: arena.into_iter().map(|a| a.slot).collect(),
        }
    }

    fn anchor_one(
        &self,
        timeline: &EnergyTimeline,
        arena: &mut Vec<ArenaSlot>,
        task: &CandidateTask,
    ) -> SlotAssignment {
        let duration = task.duration_minutes.clamp(1, MINUTES_PER_DAY as i64) as u16;

        let mut best: Option<Candidate> = None;
        for (arena_index, entry) in arena.iter().enumerate() {
            if !entry.slot.can_fit(duration) {
                continue;
            }
            let (start_minute, average) =
                self.best_start(timeline, &entry.slot, duration, task.preferred_zone);
            let breakdown = scoring::score(
                entry.slot.remaining_minutes,
                duration,
                average,
                task.preferred_zone,
                task.priority,
                &self.energy,
                &self.scoring,
            );
            if best.map_or(true, |b| breakdown.composite > b.breakdown.composite) {
                best = Some(Candidate {
                    arena_index,
                    start_minute,
                    breakdown,
                });
            }
        }

        match best {
            Some(candidate) if candidate.breakdown.composite >= self.scoring.confidence_floor => {
                self.place(arena, task, duration, candidate)
            }
            Some(candidate) => {
                debug!(task = %task.id, score = candidate.breakdown.composite, "best gap below confidence floor");
                self.keep_original(
                    task,
                    duration,
                    candidate.breakdown.composite,
                    format!(
                        "Best gap scored {:.2}, below the {:.2} confidence floor; kept original start",
                        candidate.breakdown.composite, self.scoring.confidence_floor
                    ),
                )
            }
            None => {
                debug!(task = %task.id, duration, "no gap with enough capacity");
                self.keep_original(
                    task,
                    duration,
                    0.0,
                    format!("No gap with {duration} free minutes; kept original start"),
                )
            }
        }
    }

    /// Pick the start inside `slot` with the best zone match.
    ///
    /// The current start is tried first, then each later slot boundary that
    /// still fits the task. Only a strictly better match moves the start.
    fn best_start(
        &self,
        timeline: &EnergyTimeline,
        slot: &AvailableSlot,
        duration: u16,
        preferred: Option<EnergyZone>,
    ) -> (u16, f64) {
        let average_at = |start: u16| {
            timeline.average_energy(&TimeInterval {
                start_minute: start,
                end_minute: start + duration,
            })
        };
        let current = (slot.start_minute, average_at(slot.start_minute));

        if !self.scoring.energy_aligned_placement || preferred.is_none() {
            return current;
        }

        let falloff = self.scoring.zone_distance_falloff;
        let matched = |avg: f64| scoring::zone_match(avg, preferred, &self.energy, falloff);

        let mut best = current;
        let mut best_match = matched(current.1);
        let mut start = (slot.start_minute / SLOT_MINUTES + 1) * SLOT_MINUTES;
        while best_match < 1.0 && start + duration <= slot.end_minute() {
            let avg = average_at(start);
            let m = matched(avg);
            if m > best_match {
                best = (start, avg);
                best_match = m;
            }
            start += SLOT_MINUTES;
        }
        best
    }

    fn place(
        &self,
        arena: &mut Vec<ArenaSlot>,
        task: &CandidateTask,
        duration: u16,
        candidate: Candidate,
    ) -> SlotAssignment {
        let Candidate {
            arena_index,
            start_minute,
            breakdown,
        } = candidate;
        let origin = arena[arena_index].origin;
        let kind = arena[arena_index].slot.gap_kind;
        let gap_interval = arena[arena_index].slot.interval;
        let gap_start = arena[arena_index].slot.start_minute;

        let end_minute = start_minute + duration;
        {
            let slot = &mut arena[arena_index].slot;
            slot.start_minute = end_minute;
            slot.remaining_minutes = slot.end_minute() - end_minute;
        }

        // Capacity skipped to reach a better-matching start stays usable.
        if start_minute > gap_start {
            let leading = TimeInterval {
                start_minute: gap_start,
                end_minute: start_minute,
            };
            arena.insert(
                arena_index,
                ArenaSlot {
                    origin,
                    slot: AvailableSlot::new(leading, kind),
                },
            );
        }

        let confidence = breakdown.composite.clamp(0.0, 1.0);
        debug!(
            task = %task.id,
            start = start_minute,
            confidence,
            zone_match = breakdown.zone_match,
            "task anchored"
        );

        SlotAssignment {
            task_id: task.id.clone(),
            assigned_start_minute: start_minute,
            assigned_end_minute: end_minute,
            confidence_score: confidence,
            was_rescheduled: start_minute as i64 != task.original_start_minute,
            reasoning: format!(
                "Anchored in {:?} gap {} (fit {:.2}, zone {:.2}, priority {:.2})",
                kind, gap_interval, breakdown.duration_fit, breakdown.zone_match, breakdown.priority_alignment
            ),
            gap_index: Some(origin),
        }
    }

    fn keep_original(
        &self,
        task: &CandidateTask,
        duration: u16,
        confidence: f64,
        reasoning: String,
    ) -> SlotAssignment {
        let start = task.original_start_minute.clamp(0, MINUTES_PER_DAY as i64 - 1) as u16;
        SlotAssignment {
            task_id: task.id.clone(),
            assigned_start_minute: start,
            assigned_end_minute: start + duration,
            confidence_score: confidence.clamp(0.0, 1.0),
            was_rescheduled: false,
            reasoning,
            gap_index: None,
        }
    }
}
