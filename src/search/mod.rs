//! Randomized timetable search.
//!
//! - [`SearchWorker`]: builds one candidate by drawing from restriction pools.
//! - [`CouplingIndex`]: keeps elective and module hours together.
//! - [`SearchCoordinator`]: runs rounds of workers on a bounded pool.

mod coordinator;
mod coupling;
mod worker;

pub use coordinator::{RunSummary, SearchCoordinator};
pub use coupling::{Anchor, CouplingIndex};
pub use worker::SearchWorker;
