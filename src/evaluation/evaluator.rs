//! Shared result evaluator.
//!
//! Every search worker hands its completed matrix here. Scoring runs on
//! the worker's thread; acceptance goes through a single mutex so that
//! threshold checks, persistence and policy decisions happen one
//! candidate at a time.
//!
//! # Thresholds
//!
//! | Score | Outcome |
//! |-------|---------|
//! | `< error_threshold` | discarded |
//! | `< min threshold` | counted as usable, not persisted |
//! | `≥ min threshold` | persisted; min threshold rises to the score |
//!
//! The min threshold starts at `max(min_solution_threshold, best score
//! already persisted for the term)`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tracing::{debug, info, trace};

use super::score::{ScoreBreakdown, ScoreCalculator, ScoreSettings, TeacherScore};
use crate::config::{AcceptancePolicy, GenerationConfig};
use crate::error::Result;
use crate::models::{ScheduleMatrix, SessionKind, TimetableInput};
use crate::run::{NewCandidate, OutputKind, OutputRow, RunState, RunStore, TeacherScoreRow};

/// Outcome of evaluating one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Below the error threshold.
    Discarded,
    /// Usable but below the current min threshold.
    BelowThreshold,
    /// Persisted as a candidate.
    Accepted {
        /// Stored candidate ID.
        candidate_id: u64,
    },
    /// Arrived after the evaluator had already stopped accepting.
    Ignored,
}

#[derive(Debug)]
struct AcceptState {
    min_threshold: i64,
    accepted: Vec<u64>,
}

/// Scores matrices and persists accepted ones.
pub struct ResultEvaluator<'s, S: RunStore + ?Sized> {
    store: &'s S,
    run_id: u64,
    term: String,
    calculator: ScoreCalculator,
    policy: AcceptancePolicy,
    error_threshold: i64,
    accept: Mutex<AcceptState>,
    stopped: AtomicBool,
    cleared_error: AtomicBool,
    evaluated: AtomicUsize,
    best_score: AtomicI64,
}

impl<'s, S: RunStore + ?Sized> ResultEvaluator<'s, S> {
    /// Creates an evaluator for a run, reading the term's best score.
    pub fn new(
        store: &'s S,
        run_id: u64,
        config: &GenerationConfig,
        input: &TimetableInput,
    ) -> Result<Self> {
        let prior = store.best_score(&config.term)?;
        let min_threshold = prior.map_or(config.min_solution_threshold, |best| {
            best.max(config.min_solution_threshold)
        });
        debug!(
            run_id,
            term = %config.term,
            min_threshold,
            error_threshold = config.error_threshold,
            "Evaluator initialised"
        );
        let settings = ScoreSettings {
            gap_divisor: config.gap_divisor,
            max_specific_preferences: config.max_specific_preferences,
        };
        Ok(Self {
            store,
            run_id,
            term: config.term.clone(),
            calculator: ScoreCalculator::new(&input.teachers, input.layout, settings),
            policy: config.policy,
            error_threshold: config.error_threshold,
            accept: Mutex::new(AcceptState {
                min_threshold,
                accepted: Vec::new(),
            }),
            stopped: AtomicBool::new(false),
            cleared_error: AtomicBool::new(false),
            evaluated: AtomicUsize::new(0),
            best_score: AtomicI64::new(i64::MIN),
        })
    }

    /// Scores a matrix and applies the acceptance rules.
    ///
    /// # Errors
    /// Store failures. The evaluator stops accepting after one.
    pub fn evaluate(&self, matrix: &ScheduleMatrix) -> Result<Verdict> {
        let (score, teacher_scores) = self.calculator.score(matrix);
        let total = score.total;
        self.evaluated.fetch_add(1, Ordering::Relaxed);
        self.best_score.fetch_max(total, Ordering::AcqRel);

        if total < self.error_threshold {
            trace!(total, "Candidate below error threshold");
            return Ok(Verdict::Discarded);
        }
        self.cleared_error.store(true, Ordering::Release);

        if self.is_stopped() {
            return Ok(Verdict::Ignored);
        }

        let mut state = self.accept.lock();
        if self.is_stopped() {
            return Ok(Verdict::Ignored);
        }
        if total < state.min_threshold {
            trace!(total, min = state.min_threshold, "Candidate below min threshold");
            return Ok(Verdict::BelowThreshold);
        }

        let candidate = NewCandidate {
            run_id: self.run_id,
            term: self.term.clone(),
            score,
            rows: output_rows(matrix),
            teacher_scores: teacher_scores
                .into_iter()
                .map(|score| TeacherScoreRow {
                    candidate_id: 0,
                    score,
                })
                .collect(),
        };
        let record = match self.store.save_candidate(candidate) {
            Ok(record) => record,
            Err(e) => {
                self.stopped.store(true, Ordering::Release);
                return Err(e);
            }
        };

        info!(
            run_id = self.run_id,
            candidate_id = record.id,
            total,
            old_threshold = state.min_threshold,
            "Candidate accepted"
        );
        state.min_threshold = total;
        state.accepted.push(record.id);

        match self.policy {
            AcceptancePolicy::StopOnFirst => {
                self.stopped.store(true, Ordering::Release);
                self.store.transition_run(self.run_id, RunState::Finished)?;
            }
            AcceptancePolicy::Gather { max_candidates } => {
                if state.accepted.len() >= max_candidates {
                    debug!(max_candidates, "Candidate quota reached");
                    self.stopped.store(true, Ordering::Release);
                }
            }
        }

        Ok(Verdict::Accepted {
            candidate_id: record.id,
        })
    }

    /// Scores a matrix without touching thresholds or the store.
    pub fn score(&self, matrix: &ScheduleMatrix) -> (ScoreBreakdown, Vec<TeacherScore>) {
        self.calculator.score(matrix)
    }

    /// Whether the evaluator has stopped accepting candidates.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Whether any candidate reached the error threshold.
    #[inline]
    pub fn cleared_error_threshold(&self) -> bool {
        self.cleared_error.load(Ordering::Acquire)
    }

    /// Number of matrices scored.
    #[inline]
    pub fn evaluated(&self) -> usize {
        self.evaluated.load(Ordering::Relaxed)
    }

    /// Best score seen, accepted or not.
    pub fn best_score(&self) -> Option<i64> {
        match self.best_score.load(Ordering::Acquire) {
            i64::MIN => None,
            best => Some(best),
        }
    }

    /// Current min threshold.
    pub fn min_threshold(&self) -> i64 {
        self.accept.lock().min_threshold
    }

    /// Accepted candidate IDs, in acceptance order.
    pub fn accepted(&self) -> Vec<u64> {
        self.accept.lock().accepted.clone()
    }
}

/// Flattens a matrix into output rows, one per placed session.
pub fn output_rows(matrix: &ScheduleMatrix) -> Vec<OutputRow> {
    matrix
        .placements()
        .map(|p| OutputRow {
            candidate_id: 0,
            kind: match p.session.kind {
                SessionKind::Teaching { .. } => OutputKind::Subject,
                SessionKind::Relief { .. } => OutputKind::Reduction,
            },
            teacher_id: p.session.teacher_id.clone(),
            activity_id: p.session.activity_id().to_string(),
            source_id: p.session.source_id().to_string(),
            group_id: p.session.group_id.clone(),
            shift: p.shift,
            weekday: p.weekday,
            slot: p.slot,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimetableError;
    use crate::models::{
        CourseGroup, EducationLevel, RestrictionPool, Session, Shift, Teacher, WeekLayout,
    };
    use crate::run::{CandidateRecord, InMemoryRunStore, OutputRow, RunRecord, TeacherScoreRow};

    fn input() -> TimetableInput {
        TimetableInput::new(WeekLayout::new(6, 6))
            .with_group(CourseGroup::new("G1"))
            .with_teacher(Teacher::new("T1"))
    }

    /// One morning column; T1 teaches Monday at the given slots.
    fn matrix(slots: &[usize]) -> ScheduleMatrix {
        let mut m = ScheduleMatrix::new(1, 6, 0, 6);
        for &slot in slots {
            let s = Session::teaching(
                "A1",
                "T1",
                "MATH",
                "G1",
                Shift::Morning,
                EducationLevel::Secondary,
                0,
                RestrictionPool::empty(6),
            );
            m.morning.place(0, slot, s).unwrap();
        }
        m
    }

    // Single teacher, worst case 20: slots [0, 5] score 16, [0, 1] score 20.

    #[test]
    fn test_error_threshold_discards() {
        let store = InMemoryRunStore::new();
        let run = store.begin_run("T").unwrap();
        let config = GenerationConfig::new("T")
            .with_error_threshold(18)
            .with_min_solution_threshold(18);
        let eval = ResultEvaluator::new(&store, run.id, &config, &input()).unwrap();
        assert_eq!(eval.evaluate(&matrix(&[0, 5])).unwrap(), Verdict::Discarded);
        assert!(!eval.cleared_error_threshold());
        assert_eq!(eval.best_score(), Some(16));
        assert_eq!(store.candidate_count(), 0);
    }

    #[test]
    fn test_stop_on_first_finishes_run() {
        let store = InMemoryRunStore::new();
        let run = store.begin_run("T").unwrap();
        let config = GenerationConfig::new("T");
        let eval = ResultEvaluator::new(&store, run.id, &config, &input()).unwrap();
        let verdict = eval.evaluate(&matrix(&[0, 1])).unwrap();
        assert!(matches!(verdict, Verdict::Accepted { .. }));
        assert!(eval.is_stopped());
        assert_eq!(store.run(run.id).unwrap().state, RunState::Finished);
        assert_eq!(eval.evaluate(&matrix(&[0, 1])).unwrap(), Verdict::Ignored);
        assert_eq!(store.candidate_count(), 1);
    }

    #[test]
    fn test_gather_ratchets_threshold() {
        let store = InMemoryRunStore::new();
        let run = store.begin_run("T").unwrap();
        let config =
            GenerationConfig::new("T").with_policy(AcceptancePolicy::Gather { max_candidates: 5 });
        let eval = ResultEvaluator::new(&store, run.id, &config, &input()).unwrap();

        assert!(matches!(
            eval.evaluate(&matrix(&[0, 5])).unwrap(),
            Verdict::Accepted { .. }
        ));
        assert_eq!(eval.min_threshold(), 16);
        assert!(matches!(
            eval.evaluate(&matrix(&[0, 1])).unwrap(),
            Verdict::Accepted { .. }
        ));
        assert_eq!(eval.evaluate(&matrix(&[0, 5])).unwrap(), Verdict::BelowThreshold);
        assert_eq!(eval.accepted().len(), 2);
        assert!(!eval.is_stopped());
        assert_eq!(store.run(run.id).unwrap().state, RunState::InProgress);
    }

    #[test]
    fn test_gather_quota_stops() {
        let store = InMemoryRunStore::new();
        let run = store.begin_run("T").unwrap();
        let config =
            GenerationConfig::new("T").with_policy(AcceptancePolicy::Gather { max_candidates: 1 });
        let eval = ResultEvaluator::new(&store, run.id, &config, &input()).unwrap();
        eval.evaluate(&matrix(&[0, 1])).unwrap();
        assert!(eval.is_stopped());
    }

    #[test]
    fn test_prior_best_raises_threshold() {
        let store = InMemoryRunStore::new();
        let first = store.begin_run("T").unwrap();
        let config = GenerationConfig::new("T");
        let eval = ResultEvaluator::new(&store, first.id, &config, &input()).unwrap();
        eval.evaluate(&matrix(&[0, 1])).unwrap();

        let second = store.begin_run("T").unwrap();
        let eval = ResultEvaluator::new(&store, second.id, &config, &input()).unwrap();
        assert_eq!(eval.min_threshold(), 20);
        assert_eq!(eval.evaluate(&matrix(&[0, 5])).unwrap(), Verdict::BelowThreshold);
        assert!(eval.cleared_error_threshold());
    }

    #[test]
    fn test_output_rows() {
        let rows = output_rows(&matrix(&[2]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, OutputKind::Subject);
        assert_eq!((rows[0].weekday, rows[0].slot), (0, 2));
        assert_eq!(rows[0].activity_id, "MATH");
    }

    struct FailingStore(InMemoryRunStore);

    impl RunStore for FailingStore {
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
            Err(TimetableError::Persistence("disk full".into()))
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
    fn test_persistence_failure_stops() {
        let store = FailingStore(InMemoryRunStore::new());
        let run = store.begin_run("T").unwrap();
        let eval =
            ResultEvaluator::new(&store, run.id, &GenerationConfig::new("T"), &input()).unwrap();
        assert!(matches!(
            eval.evaluate(&matrix(&[0, 1])),
            Err(TimetableError::Persistence(_))
        ));
        assert!(eval.is_stopped());
    }
}
