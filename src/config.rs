//! Generation run parameters.
//!
//! Loadable from JSON/TOML through serde; every field has a default so a
//! partial document is enough.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};

/// What the evaluator does after accepting a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptancePolicy {
    /// Finish the run with the first accepted candidate.
    StopOnFirst,
    /// Keep gathering until `max_candidates` are accepted or the budget
    /// runs out. Final selection is left to the caller.
    Gather { max_candidates: usize },
}

/// Parameters of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// School term the run belongs to. Past accepted scores of the same
    /// term raise the acceptance threshold.
    pub term: String,
    /// Worker threads in the bounded pool.
    pub pool_size: usize,
    /// Candidate builds launched per round.
    pub workers_per_round: usize,
    /// Round budget.
    pub max_rounds: usize,
    /// Scores below this are discarded silently.
    pub error_threshold: i64,
    /// Scores at or above this are accepted. Raised at start to the best
    /// score already persisted for the term.
    pub min_solution_threshold: i64,
    /// Behaviour after an acceptance.
    pub policy: AcceptancePolicy,
    /// Divisor applied to weekly gap counts for the gap percentage.
    pub gap_divisor: u32,
    /// Specific avoid-slots tracked per teacher for normalization.
    pub max_specific_preferences: u32,
    /// Base seed for reproducible runs. `None` = seeded from entropy.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            term: String::new(),
            pool_size: 4,
            workers_per_round: 8,
            max_rounds: 1_000,
            error_threshold: 0,
            min_solution_threshold: 0,
            policy: AcceptancePolicy::StopOnFirst,
            gap_divisor: 5,
            max_specific_preferences: 3,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Creates a default configuration for a term.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    /// Sets the worker pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the number of builds per round.
    pub fn with_workers_per_round(mut self, n: usize) -> Self {
        self.workers_per_round = n;
        self
    }

    /// Sets the round budget.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Sets the error threshold.
    pub fn with_error_threshold(mut self, threshold: i64) -> Self {
        self.error_threshold = threshold;
        self
    }

    /// Sets the minimum-solution threshold.
    pub fn with_min_solution_threshold(mut self, threshold: i64) -> Self {
        self.min_solution_threshold = threshold;
        self
    }

    /// Sets the acceptance policy.
    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the gap divisor.
    pub fn with_gap_divisor(mut self, divisor: u32) -> Self {
        self.gap_divisor = divisor;
        self
    }

    /// Sets the tracked avoid-slot maximum.
    pub fn with_max_specific_preferences(mut self, max: u32) -> Self {
        self.max_specific_preferences = max;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that the parameters describe a runnable search.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(TimetableError::InvalidConfig("pool_size must be at least 1".into()));
        }
        if self.workers_per_round == 0 {
            return Err(TimetableError::InvalidConfig(
                "workers_per_round must be at least 1".into(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(TimetableError::InvalidConfig("max_rounds must be at least 1".into()));
        }
        if self.gap_divisor == 0 {
            return Err(TimetableError::InvalidConfig("gap_divisor must be non-zero".into()));
        }
        if self.max_specific_preferences == 0 {
            return Err(TimetableError::InvalidConfig(
                "max_specific_preferences must be non-zero".into(),
            ));
        }
        if let AcceptancePolicy::Gather { max_candidates: 0 } = self.policy {
            return Err(TimetableError::InvalidConfig(
                "max_candidates must be at least 1".into(),
            ));
        }
        if self.error_threshold > self.min_solution_threshold {
            return Err(TimetableError::InvalidConfig(
                "error_threshold must not exceed min_solution_threshold".into(),
            ));
        }
        Ok(())
    }
}
