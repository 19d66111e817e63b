//! Round-based search coordinator.
//!
//! Runs candidate builds on a bounded rayon pool, one round at a time:
//!
//! ```text
//! loop until budget or stop:
//!     check run state in the store (Stopped → cancel)
//!     build `workers_per_round` candidates in parallel
//!     score each completed one through the shared evaluator
//!     wait for the whole round
//! ```
//!
//! Each build gets its own seeded RNG, so a fixed config seed reproduces
//! the same sequence of rounds.
//!
//! # Final State
//!
//! | Situation | State |
//! |-----------|-------|
//! | store reports `Stopped` | stays `Stopped` |
//! | evaluator finished the run | stays `Finished` |
//! | budget spent, a score cleared the error threshold | `Finished` |
//! | budget spent, nothing cleared it | `Error` |
//! | store write failed | `Error` |

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::worker::SearchWorker;
use crate::config::GenerationConfig;
use crate::error::{Result, TimetableError};
use crate::evaluation::{ResultEvaluator, Verdict};
use crate::factory::SessionPlan;
use crate::models::TimetableInput;
use crate::run::{RunState, RunStore};

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run ID.
    pub run_id: u64,
    /// State the run ended in.
    pub state: RunState,
    /// Rounds started.
    pub rounds: usize,
    /// Builds attempted.
    pub attempts: usize,
    /// Builds that placed every session.
    pub completed: usize,
    /// Accepted candidate IDs, in acceptance order.
    pub accepted: Vec<u64>,
    /// Best score seen, accepted or not.
    pub best_score: Option<i64>,
}

impl RunSummary {
    /// Share of attempts that produced a complete matrix.
    pub fn completion_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.completed as f64 / self.attempts as f64
        }
    }
}

/// Drives the rounds of one generation run.
pub struct SearchCoordinator<'a, S: RunStore + ?Sized> {
    store: &'a S,
    run_id: u64,
    plan: &'a SessionPlan,
    input: &'a TimetableInput,
    config: &'a GenerationConfig,
}

impl<'a, S: RunStore + ?Sized> SearchCoordinator<'a, S> {
    /// Creates a coordinator for an `InProgress` run.
    pub fn new(
        store: &'a S,
        run_id: u64,
        plan: &'a SessionPlan,
        input: &'a TimetableInput,
        config: &'a GenerationConfig,
    ) -> Self {
        Self {
            store,
            run_id,
            plan,
            input,
            config,
        }
    }

    /// Runs the search to completion and settles the run state.
    ///
    /// # Errors
    /// Store failures. The run is marked `Error` first when possible.
    #[tracing::instrument(level = "debug", skip(self), fields(run_id = self.run_id))]
    pub fn run(&self) -> Result<RunSummary> {
        match self.search() {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!(error = %e, "Generation run failed");
                if let Err(mark) = self.store.transition_run(self.run_id, RunState::Error) {
                    warn!(error = %mark, "Could not mark run as failed");
                }
                Err(e)
            }
        }
    }

    fn search(&self) -> Result<RunSummary> {
        let pool = self.thread_pool()?;
        let evaluator = ResultEvaluator::new(self.store, self.run_id, self.config, self.input)?;
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let workers = self.config.workers_per_round;

        info!(
            run_id = self.run_id,
            sessions = self.plan.session_count(),
            pool_size = self.config.pool_size,
            workers,
            max_rounds = self.config.max_rounds,
            "Generation run started"
        );

        let mut rounds = 0;
        let mut attempts = 0;
        let mut completed = 0;
        let mut cancelled = false;

        for round in 0..self.config.max_rounds {
            match self.store.run(self.run_id)?.state {
                RunState::InProgress => {}
                RunState::Stopped => {
                    warn!(run_id = self.run_id, round, "Run stopped by request");
                    cancelled = true;
                    break;
                }
                RunState::Finished | RunState::Error => break,
            }
            if evaluator.is_stopped() {
                break;
            }
            rounds += 1;

            let outcomes: Vec<Result<Option<Verdict>>> = pool.install(|| {
                (0..workers)
                    .into_par_iter()
                    .map(|w| {
                        let seed = job_seed(base_seed, round * workers + w);
                        let worker = SearchWorker::new(w, self.plan, SmallRng::seed_from_u64(seed));
                        match worker.build() {
                            Ok(matrix) => evaluator.evaluate(&matrix).map(Some),
                            Err(_) => Ok(None),
                        }
                    })
                    .collect()
            });

            attempts += outcomes.len();
            let mut round_completed = 0;
            for outcome in outcomes {
                if outcome?.is_some() {
                    round_completed += 1;
                }
            }
            completed += round_completed;
            debug!(
                run_id = self.run_id,
                round,
                completed = round_completed,
                best = ?evaluator.best_score(),
                "Round finished"
            );
        }

        let state = if cancelled {
            RunState::Stopped
        } else if evaluator.cleared_error_threshold() {
            self.store
                .transition_run(self.run_id, RunState::Finished)?
                .state
        } else {
            self.store.transition_run(self.run_id, RunState::Error)?.state
        };

        let summary = RunSummary {
            run_id: self.run_id,
            state,
            rounds,
            attempts,
            completed,
            accepted: evaluator.accepted(),
            best_score: evaluator.best_score(),
        };
        info!(
            run_id = summary.run_id,
            state = ?summary.state,
            rounds,
            attempts,
            completed,
            accepted = summary.accepted.len(),
            "Generation run ended"
        );
        Ok(summary)
    }

    fn thread_pool(&self) -> Result<ThreadPool> {
        ThreadPoolBuilder::new()
            .num_threads(self.config.pool_size)
            .thread_name(|i| format!("timetable-worker-{i}"))
            .build()
            .map_err(|e| TimetableError::ThreadStart(e.to_string()))
    }
}

/// SplitMix64 step over `base + index`.
fn job_seed(base: u64, index: usize) -> u64 {
    let mut z = base.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
