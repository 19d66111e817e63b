//! Run lifecycle records and their storage.

mod record;
mod store;

pub use record::{
    CandidateRecord, NewCandidate, OutputKind, OutputRow, RunRecord, RunState, RunStatus,
    TeacherScoreRow,
};
pub use store::{InMemoryRunStore, RunStore};
