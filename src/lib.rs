//! School timetable generation engine for the U-Engine ecosystem.
//!
//! Builds weekly timetables for course groups by randomized constructive
//! search: every weekly hour of every teaching assignment becomes a
//! session with a pool of legal (day, slot) positions, and workers draw
//! from those pools until each session is placed or one pool runs dry.
//! Completed timetables are scored against teacher preferences and the
//! good ones are persisted as candidates for an administrator to pick.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `CourseGroup`, `Teacher`,
//!   `TeachingAssignment`, `Session`, `RestrictionPool`, `ScheduleMatrix`
//! - **`validation`**: Input integrity checks (references, pins, electives,
//!   modules, capacity)
//! - **`factory`**: Expands input rows into per-column session plans
//! - **`search`**: Randomized workers and the round-based coordinator
//! - **`evaluation`**: Gap and preference scoring, acceptance thresholds
//! - **`run`**: Run/candidate records and the `RunStore` persistence seam
//! - **`service`**: Launch, stop, select and delete operations
//!
//! # Architecture
//!
//! ```text
//! TimetableInput ─▶ SessionFactory ─▶ SessionPlan
//!                                         │ cloned per worker
//!                                         ▼
//!                   SearchCoordinator ─▶ SearchWorker × N (rayon pool)
//!                                         │ complete matrices
//!                                         ▼
//!                   ResultEvaluator ─▶ RunStore (candidates, rows)
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod config;
pub mod error;
pub mod evaluation;
pub mod factory;
pub mod models;
pub mod run;
pub mod search;
pub mod service;
pub mod validation;

pub use config::{AcceptancePolicy, GenerationConfig};
pub use error::{Result, TimetableError};
pub use service::{GenerationService, RunHandle};
