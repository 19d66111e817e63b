//! Persisted run and candidate records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluation::{ScoreBreakdown, TeacherScore};
use crate::models::Shift;

/// Lifecycle state of a generation run.
///
/// `InProgress` is the only non-terminal state. At most one run is
/// `InProgress` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Search is running.
    InProgress,
    /// Cancelled by an administrator.
    Stopped,
    /// Ended with at least one usable candidate.
    Finished,
    /// Ended without a usable candidate, or failed.
    Error,
}

impl RunState {
    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::InProgress)
    }
}

/// One generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run ID.
    pub id: u64,
    /// School term.
    pub term: String,
    /// Current state.
    pub state: RunState,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// Time the run left `InProgress`.
    pub ended_at: Option<DateTime<Utc>>,
}

/// Kind of an output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// A subject hour.
    Subject,
    /// A relief hour.
    Reduction,
}

/// One placed hour of an accepted candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    /// Owning candidate; assigned by the store.
    pub candidate_id: u64,
    /// Subject or relief.
    pub kind: OutputKind,
    /// Teacher.
    pub teacher_id: String,
    /// Subject or reduction ID.
    pub activity_id: String,
    /// Source assignment or allotment.
    pub source_id: String,
    /// Group column.
    pub group_id: String,
    /// Shift.
    pub shift: Shift,
    /// Weekday (0-indexed).
    pub weekday: usize,
    /// Slot within the day (0-indexed).
    pub slot: usize,
}

/// Per-teacher score row of an accepted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherScoreRow {
    /// Owning candidate; assigned by the store.
    pub candidate_id: u64,
    /// Score details.
    pub score: TeacherScore,
}

/// An accepted candidate timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Candidate ID.
    pub id: u64,
    /// Producing run.
    pub run_id: u64,
    /// Term of the producing run.
    pub term: String,
    /// Score breakdown.
    pub score: ScoreBreakdown,
    /// Whether an administrator selected this candidate.
    pub selected: bool,
    /// Acceptance time.
    pub created_at: DateTime<Utc>,
}

impl CandidateRecord {
    /// Total score.
    pub fn total(&self) -> i64 {
        self.score.total
    }
}

/// Candidate data handed to the store on acceptance.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    /// Producing run.
    pub run_id: u64,
    /// Term of the producing run.
    pub term: String,
    /// Score breakdown.
    pub score: ScoreBreakdown,
    /// Placed hours.
    pub rows: Vec<OutputRow>,
    /// Per-teacher scores.
    pub teacher_scores: Vec<TeacherScoreRow>,
}

/// Run record with its accepted candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    /// The run.
    pub run: RunRecord,
    /// Candidates accepted by the run, in acceptance order.
    pub candidates: Vec<CandidateRecord>,
}

impl RunStatus {
    /// Best-scoring candidate of the run.
    pub fn best(&self) -> Option<&CandidateRecord> {
        self.candidates.iter().max_by_key(|c| c.total())
    }

    /// Currently selected candidate of the run.
    pub fn selected(&self) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|c| c.selected)
    }
}
