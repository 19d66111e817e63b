//! Error types surfaced by generation runs.
//!
//! [`SlotExhausted`](crate::models::SlotExhausted) is deliberately absent:
//! it is the expected outcome of most candidate builds and never leaves
//! the search worker.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by the control surface and run lifecycle.
#[derive(Debug, Clone, Error)]
pub enum TimetableError {
    /// Another run is still in progress.
    #[error("generation run {run_id} is already in progress")]
    AlreadyRunning { run_id: u64 },

    /// Pre-flight validation of the input rows failed.
    #[error("input data is invalid ({} problem(s))", .0.len())]
    UpstreamDataInvalid(Vec<ValidationError>),

    /// A write to the run store failed. Fatal to the run.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Run parameters are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The search threads could not be started.
    #[error("could not start search threads: {0}")]
    ThreadStart(String),

    /// No run record with this ID.
    #[error("run {0} not found")]
    RunNotFound(u64),

    /// No candidate record with this ID.
    #[error("candidate {0} not found")]
    CandidateNotFound(u64),

    /// A stop was requested but nothing is running.
    #[error("no generation run is in progress")]
    NoActiveRun,
}

impl TimetableError {
    /// Whether the caller is at fault (as opposed to the engine or store).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            TimetableError::Persistence(_) | TimetableError::ThreadStart(_)
        )
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, TimetableError>;
