//! Integration tests for the full anchoring pipeline.

use dayanchor_core::{
    anchor, AnchorEngine, AnchorRequest, CalendarEvent, CandidateTask, EnergyZone, EngineConfig,
    GapKind,
};

fn task(id: &str, duration: i64, priority: i64, zone: Option<EnergyZone>, start: i64) -> CandidateTask {
    CandidateTask {
        id: id.to_string(),
        duration_minutes: duration,
        priority,
        preferred_zone: zone,
        original_start_minute: start,
    }
}

fn busy_day() -> AnchorRequest {
    AnchorRequest {
        candidate_tasks: vec![
            task("write-report", 90, 9, Some(EnergyZone::Peak), 13 * 60),
            task("inbox", 30, 3, Some(EnergyZone::Maintenance), 9 * 60),
            task("walk", 20, 2, Some(EnergyZone::Recovery), 17 * 60),
            task("review-pr", 45, 7, Some(EnergyZone::Peak), 16 * 60),
            task("errands", 60, 1, None, 18 * 60),
        ],
        peak_windows: vec!["8:00 AM - 10:00 AM and 2:00 PM - 4:00 PM".to_string()],
        maintenance_windows: vec!["10:00 AM - 12:00 PM".to_string()],
        recovery_windows: vec!["12:00 PM - 1:00 PM and 8:00 PM - 9:00 PM".to_string()],
        calendar_events: vec![
            CalendarEvent::new(9 * 60, 9 * 60 + 30, "standup"),
            CalendarEvent::new(11 * 60, 12 * 60, "1:1"),
            CalendarEvent::new(15 * 60, 15 * 60 + 30, "sync"),
        ],
        ..Default::default()
    }
}

#[test]
fn test_single_peak_task_scenario() {
    let request = AnchorRequest {
        candidate_tasks: vec![task("t1", 15, 5, Some(EnergyZone::Peak), 600)],
        peak_windows: vec!["8:00 AM - 10:00 AM".to_string()],
        ..Default::default()
    };
    let result = anchor(&request).unwrap();

    assert_eq!(result.timeline.len(), 96);
    for index in 32..40 {
        let slot = &result.timeline.slots()[index];
        assert_eq!(slot.energy_level, 85, "slot {}", slot.time);
        assert_eq!(slot.zone, EnergyZone::Peak);
    }
    assert_eq!(result.gaps.len(), 1);
    assert_eq!(result.gaps[0].gap_kind, GapKind::FullDay);

    let assignment = &result.assignments[0];
    assert_eq!(assignment.assigned_start_minute, 480);
    assert_eq!(assignment.was_rescheduled, 480 != 600);
    assert!(assignment.confidence_score >= 0.3);
}

#[test]
fn test_busy_day_assignments_respect_calendar() {
    let request = busy_day();
    let result = anchor(&request).unwrap();

    assert_eq!(result.assignments.len(), request.candidate_tasks.len());
    for (assignment, task) in result.assignments.iter().zip(&request.candidate_tasks) {
        assert_eq!(assignment.task_id, task.id);
        assert!((0.0..=1.0).contains(&assignment.confidence_score));

        if assignment.gap_index.is_some() {
            for event in &request.calendar_events {
                let overlaps = (assignment.assigned_start_minute as i64) < event.end_minute
                    && (assignment.assigned_end_minute as i64) > event.start_minute;
                assert!(!overlaps, "{} overlaps {}", task.id, event.label);
            }
        }
    }

    assert_eq!(
        result.tasks_rescheduled + result.tasks_kept_original,
        request.candidate_tasks.len()
    );
}

#[test]
fn test_busy_day_peak_work_lands_in_peak() {
    let result = anchor(&busy_day()).unwrap();
    let report = result
        .assignments
        .iter()
        .find(|a| a.task_id == "write-report")
        .unwrap();
    assert!(report.gap_index.is_some());

    let start = report.assigned_start_minute;
    let end = report.assigned_end_minute;
    let avg: f64 = (start..end)
        .map(|m| result.timeline.energy_at_minute(m) as f64)
        .sum::<f64>()
        / (end - start) as f64;
    assert!(avg >= 60.0, "report placed at {start} with average energy {avg}");
}

#[test]
fn test_placed_assignments_do_not_overlap() {
    let result = anchor(&busy_day()).unwrap();
    let mut placed: Vec<_> = result
        .assignments
        .iter()
        .filter(|a| a.gap_index.is_some())
        .map(|a| (a.assigned_start_minute, a.assigned_end_minute))
        .collect();
    placed.sort();
    for pair in placed.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
}

#[test]
fn test_capacity_never_exceeded() {
    let mut request = busy_day();
    for i in 0..20 {
        request
            .candidate_tasks
            .push(task(&format!("filler-{i}"), 45, i % 4, None, 600));
    }
    let result = anchor(&request).unwrap();

    for (index, gap) in result.gaps.iter().enumerate() {
        let used: u32 = result
            .assignments
            .iter()
            .filter(|a| a.gap_index == Some(index))
            .map(|a| (a.assigned_end_minute - a.assigned_start_minute) as u32)
            .sum();
        assert!(used <= gap.remaining_minutes as u32, "gap {index} overbooked");

        for a in result.assignments.iter().filter(|a| a.gap_index == Some(index)) {
            assert!(a.assigned_start_minute >= gap.interval.start_minute);
            assert!(a.assigned_end_minute <= gap.interval.end_minute);
        }
    }
    assert!(result.tasks_kept_original > 0);
}

#[test]
fn test_runs_are_deterministic() {
    let request = busy_day();
    let first = anchor(&request).unwrap();
    let second = anchor(&request).unwrap();

    let a = serde_json::to_vec(&first.assignments).unwrap();
    let b = serde_json::to_vec(&second.assignments).unwrap();
    assert_eq!(a, b);
    assert_eq!(first, second);
}

#[test]
fn test_fully_booked_day_keeps_everything() {
    let mut request = busy_day();
    request.calendar_events = vec![CalendarEvent::new(0, 1440, "offsite")];
    let result = anchor(&request).unwrap();

    assert!(result.gaps.is_empty());
    assert_eq!(result.tasks_rescheduled, 0);
    for (assignment, task) in result.assignments.iter().zip(&request.candidate_tasks) {
        assert_eq!(assignment.assigned_start_minute as i64, task.original_start_minute);
        assert!(!assignment.was_rescheduled);
        assert_eq!(assignment.confidence_score, 0.0);
    }
}

#[test]
fn test_task_larger_than_every_gap() {
    let request = AnchorRequest {
        candidate_tasks: vec![task("marathon", 600, 9, None, 480)],
        calendar_events: vec![
            CalendarEvent::new(10 * 60, 11 * 60, "a"),
            CalendarEvent::new(15 * 60, 16 * 60, "b"),
        ],
        ..Default::default()
    };
    let result = anchor(&request).unwrap();
    assert_eq!(result.tasks_kept_original, 1);
    assert_eq!(result.assignments[0].assigned_start_minute, 480);
    assert_eq!(result.assignments[0].gap_index, None);
}

#[test]
fn test_gap_count_bound() {
    let request = busy_day();
    let result = anchor(&request).unwrap();
    assert!(result.gaps.len() <= request.calendar_events.len() + 1);
    for gap in &result.gaps {
        for event in &request.calendar_events {
            assert!(!event.interval().unwrap().overlaps(&gap.interval));
        }
    }
}

#[test]
fn test_empty_request() {
    let result = anchor(&AnchorRequest::default()).unwrap();
    assert!(result.assignments.is_empty());
    assert_eq!(result.tasks_rescheduled, 0);
    assert_eq!(result.average_confidence, 0.0);
    assert_eq!(result.summary.optimal_wake_window, None);
}

#[test]
fn test_alternate_thresholds_via_config() {
    let mut config = EngineConfig::default();
    config.set("energy.peak_threshold", "90").unwrap_err();
    config.energy.peak_threshold = 80;
    config.energy.peak_level = 90;

    let request = AnchorRequest {
        peak_windows: vec!["9:00 AM - 10:00 AM".to_string()],
        ..Default::default()
    };
    let result = AnchorEngine::with_config(config).run(&request).unwrap();
    assert_eq!(result.timeline.energy_at_minute(9 * 60), 90);
    assert_eq!(result.timeline.slot_at_minute(9 * 60).zone, EnergyZone::Peak);
}

#[test]
fn test_result_serializes_to_json() {
    let result = anchor(&busy_day()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["timeline"].as_array().unwrap().len(), 96);
    assert!(json["summary"]["zone_periods"]["Peak"].is_array());
    assert!(json["assignments"][0]["reasoning"].is_string());
}
