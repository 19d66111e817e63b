//! Run persistence.
//!
//! [`RunStore`] is the seam to whatever database backs the engine. The
//! engine needs only a handful of operations, each of which must be
//! atomic on its own:
//!
//! - `begin_run` checks for an `InProgress` run and inserts the new one
//!   in a single step, so two concurrent launches cannot both succeed.
//! - `transition_run` only moves a run out of `InProgress`; a run that
//!   was already stopped or finished keeps its state.
//! - `select_candidate` clears the previous selection, across all runs,
//!   and sets the new one together.
//!
//! [`InMemoryRunStore`] keeps everything behind one `parking_lot::Mutex`.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::record::{
    CandidateRecord, NewCandidate, OutputRow, RunRecord, RunState, TeacherScoreRow,
};
use crate::error::{Result, TimetableError};

/// Storage for runs, candidates and their rows.
pub trait RunStore: Send + Sync {
    /// Inserts a new `InProgress` run.
    ///
    /// # Errors
    /// [`TimetableError::AlreadyRunning`] if another run is in progress.
    fn begin_run(&self, term: &str) -> Result<RunRecord>;

    /// Looks up a run.
    fn run(&self, run_id: u64) -> Result<RunRecord>;

    /// Most recently started run.
    fn latest_run(&self) -> Result<Option<RunRecord>>;

    /// The run currently in progress.
    fn active_run(&self) -> Result<Option<RunRecord>>;

    /// Moves an `InProgress` run to `state` and stamps its end time.
    ///
    /// Returns the record after the call. A run already in a terminal
    /// state is returned unchanged.
    fn transition_run(&self, run_id: u64, state: RunState) -> Result<RunRecord>;

    /// Highest accepted score of a term, across all runs.
    fn best_score(&self, term: &str) -> Result<Option<i64>>;

    /// Persists an accepted candidate with its rows.
    fn save_candidate(&self, candidate: NewCandidate) -> Result<CandidateRecord>;

    /// Looks up a candidate.
    fn candidate(&self, candidate_id: u64) -> Result<CandidateRecord>;

    /// Candidates of a run, in acceptance order.
    fn candidates(&self, run_id: u64) -> Result<Vec<CandidateRecord>>;

    /// Marks a candidate as the one selected timetable.
    fn select_candidate(&self, candidate_id: u64) -> Result<CandidateRecord>;

    /// Removes a candidate and its rows.
    fn delete_candidate(&self, candidate_id: u64) -> Result<()>;

    /// Placed hours of a candidate.
    fn output_rows(&self, candidate_id: u64) -> Result<Vec<OutputRow>>;

    /// Per-teacher scores of a candidate.
    fn teacher_scores(&self, candidate_id: u64) -> Result<Vec<TeacherScoreRow>>;
}

#[derive(Debug)]
struct StoredCandidate {
    record: CandidateRecord,
    rows: Vec<OutputRow>,
    teacher_scores: Vec<TeacherScoreRow>,
}

#[derive(Debug, Default)]
struct Tables {
    runs: BTreeMap<u64, RunRecord>,
    candidates: BTreeMap<u64, StoredCandidate>,
    next_run_id: u64,
    next_candidate_id: u64,
}

impl Tables {
    fn candidate_mut(&mut self, id: u64) -> Result<&mut StoredCandidate> {
        self.candidates
            .get_mut(&id)
            .ok_or(TimetableError::CandidateNotFound(id))
    }

    fn candidate(&self, id: u64) -> Result<&StoredCandidate> {
        self.candidates
            .get(&id)
            .ok_or(TimetableError::CandidateNotFound(id))
    }
}

/// Process-local [`RunStore`].
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    tables: Mutex<Tables>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored candidates across all runs.
    pub fn candidate_count(&self) -> usize {
        self.tables.lock().candidates.len()
    }
}

impl RunStore for InMemoryRunStore {
    fn begin_run(&self, term: &str) -> Result<RunRecord> {
        let mut tables = self.tables.lock();
        if let Some(active) = tables
            .runs
            .values()
            .find(|r| r.state == RunState::InProgress)
        {
            return Err(TimetableError::AlreadyRunning { run_id: active.id });
        }
        tables.next_run_id += 1;
        let record = RunRecord {
            id: tables.next_run_id,
            term: term.to_string(),
            state: RunState::InProgress,
            started_at: Utc::now(),
            ended_at: None,
        };
        tables.runs.insert(record.id, record.clone());
        Ok(record)
    }

    fn run(&self, run_id: u64) -> Result<RunRecord> {
        self.tables
            .lock()
            .runs
            .get(&run_id)
            .cloned()
            .ok_or(TimetableError::RunNotFound(run_id))
    }

    fn latest_run(&self) -> Result<Option<RunRecord>> {
        Ok(self.tables.lock().runs.values().next_back().cloned())
    }

    fn active_run(&self) -> Result<Option<RunRecord>> {
        Ok(self
            .tables
            .lock()
            .runs
            .values()
            .find(|r| r.state == RunState::InProgress)
            .cloned())
    }

    fn transition_run(&self, run_id: u64, state: RunState) -> Result<RunRecord> {
        let mut tables = self.tables.lock();
        let run = tables
            .runs
            .get_mut(&run_id)
            .ok_or(TimetableError::RunNotFound(run_id))?;
        if run.state == RunState::InProgress && state != RunState::InProgress {
            run.state = state;
            run.ended_at = Some(Utc::now());
        }
        Ok(run.clone())
    }

    fn best_score(&self, term: &str) -> Result<Option<i64>> {
        Ok(self
            .tables
            .lock()
            .candidates
            .values()
            .filter(|c| c.record.term == term)
            .map(|c| c.record.total())
            .max())
    }

    fn save_candidate(&self, candidate: NewCandidate) -> Result<CandidateRecord> {
        let mut tables = self.tables.lock();
        if !tables.runs.contains_key(&candidate.run_id) {
            return Err(TimetableError::RunNotFound(candidate.run_id));
        }
        tables.next_candidate_id += 1;
        let id = tables.next_candidate_id;
        let record = CandidateRecord {
            id,
            run_id: candidate.run_id,
            term: candidate.term,
            score: candidate.score,
            selected: false,
            created_at: Utc::now(),
        };
        let rows = candidate
            .rows
            .into_iter()
            .map(|row| OutputRow {
                candidate_id: id,
                ..row
            })
            .collect();
        let teacher_scores = candidate
            .teacher_scores
            .into_iter()
            .map(|row| TeacherScoreRow {
                candidate_id: id,
                ..row
            })
            .collect();
        tables.candidates.insert(
            id,
            StoredCandidate {
                record: record.clone(),
                rows,
                teacher_scores,
            },
        );
        Ok(record)
    }

    fn candidate(&self, candidate_id: u64) -> Result<CandidateRecord> {
        Ok(self.tables.lock().candidate(candidate_id)?.record.clone())
    }

    fn candidates(&self, run_id: u64) -> Result<Vec<CandidateRecord>> {
        let tables = self.tables.lock();
        if !tables.runs.contains_key(&run_id) {
            return Err(TimetableError::RunNotFound(run_id));
        }
        Ok(tables
            .candidates
            .values()
            .filter(|c| c.record.run_id == run_id)
            .map(|c| c.record.clone())
            .collect())
    }

    fn select_candidate(&self, candidate_id: u64) -> Result<CandidateRecord> {
        let mut tables = self.tables.lock();
        tables.candidate(candidate_id)?;
        for stored in tables.candidates.values_mut() {
            stored.record.selected = stored.record.id == candidate_id;
        }
        Ok(tables.candidate_mut(candidate_id)?.record.clone())
    }

    fn delete_candidate(&self, candidate_id: u64) -> Result<()> {
        self.tables
            .lock()
            .candidates
            .remove(&candidate_id)
            .map(|_| ())
            .ok_or(TimetableError::CandidateNotFound(candidate_id))
    }

    fn output_rows(&self, candidate_id: u64) -> Result<Vec<OutputRow>> {
        Ok(self.tables.lock().candidate(candidate_id)?.rows.clone())
    }

    fn teacher_scores(&self, candidate_id: u64) -> Result<Vec<TeacherScoreRow>> {
        Ok(self
            .tables
            .lock()
            .candidate(candidate_id)?
            .teacher_scores
            .clone())
    }
}
