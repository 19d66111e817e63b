//! Integration tests for full generation runs.
//!
//! Exercises the path:
//! - TimetableInput -> GenerationService::run / launch
//! - SearchCoordinator rounds -> ResultEvaluator -> RunStore
//! - Candidate queries, selection and deletion

use std::collections::{BTreeMap, HashSet};

use u_timetable::config::{AcceptancePolicy, GenerationConfig};
use u_timetable::error::{Result, TimetableError};
use u_timetable::models::{
    CourseGroup, FixedPin, ReliefAllotment, Shift, Teacher, TeachingAssignment, TimetableInput,
    WeekLayout,
};
use u_timetable::run::{
    CandidateRecord, InMemoryRunStore, NewCandidate, OutputKind, OutputRow, RunRecord, RunState,
    RunStore, TeacherScoreRow,
};
use u_timetable::service::GenerationService;

/// Two morning groups, one afternoon vocational group.
fn school() -> TimetableInput {
    TimetableInput::new(WeekLayout::new(6, 5))
        .with_group(CourseGroup::new("1A").with_name("First A"))
        .with_group(CourseGroup::new("1B").with_name("First B"))
        .with_group(CourseGroup::vocational("V1").with_shift(Shift::Afternoon))
        .with_teacher(Teacher::new("ANA").without_first_period())
        .with_teacher(Teacher::new("BEA").with_avoid_slot(Shift::Morning, 0, 5))
        .with_teacher(Teacher::new("CARL"))
        .with_teacher(Teacher::new("DORA"))
        .with_assignment(TeachingAssignment::new("MATH-1A", "ANA", "MATH", "1A", 5))
        .with_assignment(TeachingAssignment::new("MATH-1B", "ANA", "MATH", "1B", 5))
        .with_assignment(TeachingAssignment::new("HIST-1A", "BEA", "HIST", "1A", 3))
        .with_assignment(
            TeachingAssignment::new("FR-1A", "CARL", "FR", "1A", 2).with_elective_block("LANG"),
        )
        .with_assignment(
            TeachingAssignment::new("DE-1A", "DORA", "DE", "1A", 2).with_elective_block("LANG"),
        )
        .with_assignment(
            TeachingAssignment::new("WELD-V1", "CARL", "WELD", "V1", 4).with_module_block(2),
        )
        .with_relief(ReliefAllotment::new("TUT-1B", "BEA", "TUTOR", "1B", 2))
        .with_pin(FixedPin::new("HIST-1A", 0, 1, 2))
}

fn config() -> GenerationConfig {
    GenerationConfig::new("2026-27")
        .with_pool_size(2)
        .with_workers_per_round(4)
        .with_max_rounds(100)
        .with_seed(2026)
}

fn accepted_rows(service: &GenerationService<InMemoryRunStore>) -> Vec<OutputRow> {
    let status = service.latest_status().unwrap().unwrap();
    assert_eq!(status.run.state, RunState::Finished);
    let best = status.best().expect("run accepted no candidate");
    service.solution_rows(best.id).unwrap()
}

#[test]
fn test_every_weekly_hour_is_placed_once() {
    let service = GenerationService::new(InMemoryRunStore::new());
    let input = school();
    service.run(&input, &config()).unwrap();
    let rows = accepted_rows(&service);

    let mut hours: BTreeMap<&str, u32> = BTreeMap::new();
    for row in &rows {
        *hours.entry(row.source_id.as_str()).or_default() += 1;
    }
    for a in &input.assignments {
        assert_eq!(hours[a.id.as_str()], a.weekly_hours, "{}", a.id);
    }
    assert_eq!(hours["TUT-1B"], 2);
    assert_eq!(rows.len() as u32, input.total_weekly_hours());
}

#[test]
fn test_hard_constraints_hold() {
    let service = GenerationService::new(InMemoryRunStore::new());
    service.run(&school(), &config()).unwrap();
    let rows = accepted_rows(&service);

    let mut teacher_slots = HashSet::new();
    for row in &rows {
        assert!(
            teacher_slots.insert((row.teacher_id.clone(), row.shift, row.weekday, row.slot)),
            "{} double-booked",
            row.teacher_id
        );
    }

    // One teaching hour per group slot, elective siblings excepted.
    let mut group_slots: BTreeMap<(String, usize, usize), Vec<&OutputRow>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.kind == OutputKind::Subject) {
        group_slots
            .entry((row.group_id.clone(), row.weekday, row.slot))
            .or_default()
            .push(row);
    }
    for occupants in group_slots.values() {
        if occupants.len() > 1 {
            let sources: HashSet<_> = occupants.iter().map(|r| r.source_id.as_str()).collect();
            assert_eq!(sources, HashSet::from(["FR-1A", "DE-1A"]));
        }
    }
}

#[test]
fn test_couplings_and_pins() {
    let service = GenerationService::new(InMemoryRunStore::new());
    service.run(&school(), &config()).unwrap();
    let rows = accepted_rows(&service);
    let positions = |source: &str| -> Vec<(usize, usize)> {
        let mut v: Vec<_> = rows
            .iter()
            .filter(|r| r.source_id == source)
            .map(|r| (r.weekday, r.slot))
            .collect();
        v.sort();
        v
    };

    assert_eq!(positions("FR-1A"), positions("DE-1A"));
    assert!(positions("HIST-1A").contains(&(1, 2)));

    // Two runs of two consecutive hours each.
    let weld = positions("WELD-V1");
    let mut by_day: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (day, slot) in weld {
        by_day.entry(day).or_default().push(slot);
    }
    for slots in by_day.values() {
        assert_eq!(slots.len() % 2, 0);
        for pair in slots.chunks(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
    }
}

#[test]
fn test_relief_rows_are_reductions() {
    let service = GenerationService::new(InMemoryRunStore::new());
    service.run(&school(), &config()).unwrap();
    let rows = accepted_rows(&service);
    let relief: Vec<_> = rows.iter().filter(|r| r.source_id == "TUT-1B").collect();
    assert_eq!(relief.len(), 2);
    assert!(relief.iter().all(|r| r.kind == OutputKind::Reduction));
    assert!(relief.iter().all(|r| r.activity_id == "TUTOR"));
}

#[test]
fn test_teacher_without_avoid_slots_scores_zero() {
    let service = GenerationService::new(InMemoryRunStore::new());
    service.run(&school(), &config()).unwrap();
    let status = service.latest_status().unwrap().unwrap();
    let candidate = status.best().unwrap();
    let scores = service.solution_teacher_scores(candidate.id).unwrap();

    let dora = scores
        .iter()
        .find(|s| s.score.teacher_id == "DORA")
        .expect("DORA has sessions");
    assert_eq!(dora.score.specific_points, 0);
    assert_eq!(dora.score.specific_percentage, 0.0);
    assert!(scores.iter().all(|s| s.candidate_id == candidate.id));
}

#[test]
fn test_same_seed_same_candidate() {
    let config = config().with_pool_size(1).with_workers_per_round(1);
    let first = GenerationService::new(InMemoryRunStore::new());
    let second = GenerationService::new(InMemoryRunStore::new());
    let a = first.run(&school(), &config).unwrap();
    let b = second.run(&school(), &config).unwrap();

    assert_eq!(a.best_score, b.best_score);
    assert_eq!(a.attempts, b.attempts);
    let rows_a = first.solution_rows(a.accepted[0]).unwrap();
    let rows_b = second.solution_rows(b.accepted[0]).unwrap();
    assert_eq!(rows_a, rows_b);
}

#[test]
fn test_launch_rejects_second_run() {
    let service = GenerationService::new(InMemoryRunStore::new());
    let held = service.store().begin_run("2026-27").unwrap();
    match service.launch(school(), config()) {
        Err(TimetableError::AlreadyRunning { run_id }) => assert_eq!(run_id, held.id),
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }
}

#[test]
fn test_force_stop_ends_run_stopped() {
    let service = GenerationService::new(InMemoryRunStore::new());
    let config = config()
        .with_max_rounds(1_000_000)
        .with_error_threshold(i64::MAX)
        .with_min_solution_threshold(i64::MAX);
    let handle = service.launch(school(), config).unwrap();
    let run_id = handle.run_id();

    let stopped = service.force_stop().unwrap();
    assert_eq!(stopped.id, run_id);
    assert_eq!(stopped.state, RunState::Stopped);

    let summary = handle.join().unwrap();
    assert_eq!(summary.state, RunState::Stopped);
    assert!(summary.rounds < 1_000_000);
    assert_eq!(service.status(run_id).unwrap().run.state, RunState::Stopped);
    assert!(matches!(service.force_stop(), Err(TimetableError::NoActiveRun)));
}

#[test]
fn test_gather_then_select_and_delete() {
    let service = GenerationService::new(InMemoryRunStore::new());
    let config = config()
        .with_max_rounds(30)
        .with_policy(AcceptancePolicy::Gather { max_candidates: 3 });
    let summary = service.run(&school(), &config).unwrap();
    assert_eq!(summary.state, RunState::Finished);
    assert!(!summary.accepted.is_empty());
    assert!(summary.accepted.len() <= 3);

    let first = summary.accepted[0];
    let last = *summary.accepted.last().unwrap();
    service.select_solution(first).unwrap();
    service.select_solution(last).unwrap();
    let status = service.status(summary.run_id).unwrap();
    let selected: Vec<_> = status
        .candidates
        .iter()
        .filter(|c| c.selected)
        .map(|c| c.id)
        .collect();
    assert_eq!(selected, vec![last]);

    service.delete_solution(last).unwrap();
    assert!(matches!(
        service.solution_rows(last),
        Err(TimetableError::CandidateNotFound(_))
    ));
    assert_eq!(
        service.status(summary.run_id).unwrap().candidates.len(),
        summary.accepted.len() - 1
    );
}

#[test]
fn test_later_run_must_beat_earlier_best() {
    let service = GenerationService::new(InMemoryRunStore::new());
    service.run(&school(), &config()).unwrap();
    let best = service.store().best_score("2026-27").unwrap().unwrap();
    let second = service.run(&school(), &config().with_seed(7)).unwrap();
    for id in &second.accepted {
        assert!(service.store().candidate(*id).unwrap().total() >= best);
    }
}

#[test]
fn test_invalid_input_reports_every_problem() {
    let service = GenerationService::new(InMemoryRunStore::new());
    let input = school()
        .with_assignment(TeachingAssignment::new("X1", "NOBODY", "X", "1A", 1))
        .with_pin(FixedPin::new("MATH-1A", 9, 0, 0));
    match service.run(&input, &config()) {
        Err(TimetableError::UpstreamDataInvalid(errors)) => assert!(errors.len() >= 2),
        other => panic!("expected UpstreamDataInvalid, got {other:?}"),
    }
    assert!(service.latest_status().unwrap().is_none());
}

/// Store whose candidate writes always fail.
#[derive(Default)]
struct ReadOnlyStore(InMemoryRunStore);

impl RunStore for ReadOnlyStore {
    fn begin_run(&self, term: &str) -> Result<RunRecord> {
        self.0.begin_run(term)
    }
    fn run(&self, run_id: u64) -> Result<RunRecord> {
        self.0.run(run_id)
    }
    fn latest_run(&self) -> Result<Option<RunRecord>> {
        self.0.latest_run()
    }
    fn active_run(&self) -> Result<Option<RunRecord>> {
        self.0.active_run()
    }
    fn transition_run(&self, run_id: u64, state: RunState) -> Result<RunRecord> {
        self.0.transition_run(run_id, state)
    }
    fn best_score(&self, term: &str) -> Result<Option<i64>> {
        self.0.best_score(term)
    }
    fn save_candidate(&self, _: NewCandidate) -> Result<CandidateRecord> {
        Err(TimetableError::Persistence("read-only store".into()))
    }
    fn candidate(&self, id: u64) -> Result<CandidateRecord> {
        self.0.candidate(id)
    }
    fn candidates(&self, run_id: u64) -> Result<Vec<CandidateRecord>> {
        self.0.candidates(run_id)
    }
    fn select_candidate(&self, id: u64) -> Result<CandidateRecord> {
        self.0.select_candidate(id)
    }
    fn delete_candidate(&self, id: u64) -> Result<()> {
        self.0.delete_candidate(id)
    }
    fn output_rows(&self, id: u64) -> Result<Vec<OutputRow>> {
        self.0.output_rows(id)
    }
    fn teacher_scores(&self, id: u64) -> Result<Vec<TeacherScoreRow>> {
        self.0.teacher_scores(id)
    }
}

#[test]
fn test_persistence_failure_marks_run_error() {
    let service = GenerationService::new(ReadOnlyStore::default());
    let result = service.run(&school(), &config());
    assert!(matches!(result, Err(TimetableError::Persistence(_))));
    let status = service.latest_status().unwrap().unwrap();
    assert_eq!(status.run.state, RunState::Error);
    assert!(status.run.ended_at.is_some());
}
