//! Candidate scoring and acceptance.

mod evaluator;
mod score;

pub use evaluator::{output_rows, ResultEvaluator, Verdict};
pub use score::{ScoreBreakdown, ScoreCalculator, ScoreSettings, ShiftScore, TeacherScore};
