//! Control surface for generation runs.
//!
//! [`GenerationService`] is what an administrative front end talks to:
//! it launches runs, stops them, and manages the accepted candidates.
//!
//! # Example
//!
//! ```no_run
//! use u_timetable::config::GenerationConfig;
//! use u_timetable::models::{CourseGroup, Teacher, TeachingAssignment, TimetableInput, WeekLayout};
//! use u_timetable::run::InMemoryRunStore;
//! use u_timetable::service::GenerationService;
//!
//! let input = TimetableInput::new(WeekLayout::new(6, 6))
//!     .with_group(CourseGroup::new("1A"))
//!     .with_teacher(Teacher::new("T1"))
//!     .with_assignment(TeachingAssignment::new("A1", "T1", "MATH", "1A", 4));
//!
//! let service = GenerationService::new(InMemoryRunStore::new());
//! let handle = service.launch(input, GenerationConfig::new("2026-27")).unwrap();
//! let summary = handle.join().unwrap();
//! println!("run {} ended {:?}", summary.run_id, summary.state);
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::info;

use crate::config::GenerationConfig;
use crate::error::{Result, TimetableError};
use crate::factory::{SessionFactory, SessionPlan};
use crate::models::TimetableInput;
use crate::run::{CandidateRecord, OutputRow, RunRecord, RunState, RunStatus, RunStore, TeacherScoreRow};
use crate::search::{RunSummary, SearchCoordinator};

/// Handle to a run executing on a background thread.
#[derive(Debug)]
pub struct RunHandle {
    run_id: u64,
    thread: JoinHandle<Result<RunSummary>>,
}

impl RunHandle {
    /// ID of the launched run.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Whether the background thread has returned.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the run to end.
    ///
    /// A panic on the search thread is resumed on the caller's thread.
    pub fn join(self) -> Result<RunSummary> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Launches and manages generation runs over a [`RunStore`].
pub struct GenerationService<S: RunStore + 'static> {
    store: Arc<S>,
    factory: SessionFactory,
}

impl<S: RunStore + 'static> GenerationService<S> {
    /// Creates a service owning `store`.
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    /// Creates a service over a shared store.
    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            store,
            factory: SessionFactory::new(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates the input, opens a run record and builds the session plan.
    fn prepare(&self, input: &TimetableInput, config: &GenerationConfig) -> Result<(RunRecord, SessionPlan)> {
        config.validate()?;
        if let Some(active) = self.store.active_run()? {
            return Err(TimetableError::AlreadyRunning { run_id: active.id });
        }
        let plan = self.factory.build(input)?;
        let record = self.store.begin_run(&config.term)?;
        info!(run_id = record.id, term = %record.term, "Generation run launched");
        Ok((record, plan))
    }

    /// Starts a run on a background thread and returns immediately.
    ///
    /// # Errors
    /// - [`TimetableError::InvalidConfig`] for unusable parameters.
    /// - [`TimetableError::AlreadyRunning`] if a run is in progress.
    /// - [`TimetableError::UpstreamDataInvalid`] if the input fails validation.
    #[tracing::instrument(level = "info", skip_all, fields(term = %config.term))]
    pub fn launch(&self, input: TimetableInput, config: GenerationConfig) -> Result<RunHandle> {
        let (record, plan) = self.prepare(&input, &config)?;
        let store = Arc::clone(&self.store);
        let run_id = record.id;
        let spawned = thread::Builder::new()
            .name(format!("timetable-run-{run_id}"))
            .spawn(move || {
                SearchCoordinator::new(&*store, run_id, &plan, &input, &config).run()
            });
        match spawned {
            Ok(thread) => Ok(RunHandle { run_id, thread }),
            Err(e) => {
                self.store.transition_run(run_id, RunState::Error)?;
                Err(TimetableError::ThreadStart(e.to_string()))
            }
        }
    }

    /// Runs to completion on the calling thread.
    pub fn run(&self, input: &TimetableInput, config: &GenerationConfig) -> Result<RunSummary> {
        let (record, plan) = self.prepare(input, config)?;
        SearchCoordinator::new(&*self.store, record.id, &plan, input, config).run()
    }

    /// Marks the in-progress run as stopped.
    ///
    /// Workers finish their current round and the coordinator exits before
    /// starting the next one.
    ///
    /// # Errors
    /// [`TimetableError::NoActiveRun`] if nothing is running.
    pub fn force_stop(&self) -> Result<RunRecord> {
        let active = self.store.active_run()?.ok_or(TimetableError::NoActiveRun)?;
        let record = self.store.transition_run(active.id, RunState::Stopped)?;
        info!(run_id = record.id, state = ?record.state, "Stop requested");
        Ok(record)
    }

    /// Marks a candidate as the selected timetable, clearing any other.
    pub fn select_solution(&self, candidate_id: u64) -> Result<CandidateRecord> {
        let record = self.store.select_candidate(candidate_id)?;
        info!(candidate_id, term = %record.term, "Candidate selected");
        Ok(record)
    }

    /// Deletes a candidate and its rows.
    pub fn delete_solution(&self, candidate_id: u64) -> Result<()> {
        self.store.delete_candidate(candidate_id)?;
        info!(candidate_id, "Candidate deleted");
        Ok(())
    }

    /// Status of a run with its candidates.
    pub fn status(&self, run_id: u64) -> Result<RunStatus> {
        Ok(RunStatus {
            run: self.store.run(run_id)?,
            candidates: self.store.candidates(run_id)?,
        })
    }

    /// Status of the most recent run, if any.
    pub fn latest_status(&self) -> Result<Option<RunStatus>> {
        match self.store.latest_run()? {
            Some(run) => self.status(run.id).map(Some),
            None => Ok(None),
        }
    }

    /// Placed hours of a candidate.
    pub fn solution_rows(&self, candidate_id: u64) -> Result<Vec<OutputRow>> {
        self.store.output_rows(candidate_id)
    }

    /// Per-teacher scores of a candidate.
    pub fn solution_teacher_scores(&self, candidate_id: u64) -> Result<Vec<TeacherScoreRow>> {
        self.store.teacher_scores(candidate_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseGroup, Teacher, TeachingAssignment, WeekLayout};
    use crate::run::InMemoryRunStore;

    fn input() -> TimetableInput {
        TimetableInput::new(WeekLayout::new(6, 6))
            .with_group(CourseGroup::new("G1"))
            .with_teacher(Teacher::new("T1"))
            .with_assignment(TeachingAssignment::new("A1", "T1", "MATH", "G1", 4))
    }

    fn config() -> GenerationConfig {
        GenerationConfig::new("2026")
            .with_pool_size(1)
            .with_workers_per_round(2)
            .with_max_rounds(5)
            .with_seed(3)
    }

    #[test]
    fn test_run_and_status() {
        let service = GenerationService::new(InMemoryRunStore::new());
        let summary = service.run(&input(), &config()).unwrap();
        assert_eq!(summary.state, RunState::Finished);

        let status = service.latest_status().unwrap().unwrap();
        assert_eq!(status.run.id, summary.run_id);
        assert_eq!(status.candidates.len(), 1);
        let rows = service.solution_rows(status.candidates[0].id).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_invalid_input_opens_no_run() {
        let service = GenerationService::new(InMemoryRunStore::new());
        let bad = input().with_assignment(TeachingAssignment::new("A2", "T9", "X", "G1", 1));
        assert!(matches!(
            service.run(&bad, &config()),
            Err(TimetableError::UpstreamDataInvalid(_))
        ));
        assert!(service.latest_status().unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_refused() {
        let service = GenerationService::new(InMemoryRunStore::new());
        assert!(matches!(
            service.run(&input(), &config().with_pool_size(0)),
            Err(TimetableError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_force_stop_without_run() {
        let service = GenerationService::new(InMemoryRunStore::new());
        assert!(matches!(service.force_stop(), Err(TimetableError::NoActiveRun)));
    }

    #[test]
    fn test_already_running() {
        let service = GenerationService::new(InMemoryRunStore::new());
        let held = service.store().begin_run("2026").unwrap();
        match service.run(&input(), &config()) {
            Err(TimetableError::AlreadyRunning { run_id }) => assert_eq!(run_id, held.id),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
    }
}
