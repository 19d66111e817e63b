//! Candidate timetable scoring.
//!
//! Scores a completed matrix shift by shift, then sums the shifts.
//!
//! # Components
//!
//! | Component | Points | Percentage |
//! |-----------|--------|------------|
//! | Gaps | worst-case gaps − actual gaps | 100 × (gaps / divisor) / teachers |
//! | Daily preference | days honouring first/last-period opt-outs | share of the 5-day week |
//! | Specific preference | avoid-slots left free | share of the tracked maximum |
//!
//! Only the point sum decides acceptance; percentages are kept for the
//! per-candidate and per-teacher breakdown.
//!
//! A gap is a free slot between two occupied slots of the same teacher on
//! the same day. The worst case per teacher and day is `slots − 2`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{
    DayProfile, ScheduleMatrix, Shift, Teacher, TeacherPreferences, WeekLayout, DAYS_PER_WEEK,
};

/// Scoring constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSettings {
    /// Divisor applied to weekly gap counts for the gap percentage.
    pub gap_divisor: u32,
    /// Avoid-slots tracked per teacher.
    pub max_specific_preferences: u32,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            gap_divisor: 5,
            max_specific_preferences: 3,
        }
    }
}

/// Score of one shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftScore {
    /// Teachers with at least one session in the shift.
    pub teachers: usize,
    /// Weekly gaps summed over teachers.
    pub gaps: u32,
    /// Worst possible weekly gaps for these teachers.
    pub worst_case_gaps: u32,
    /// `worst_case_gaps − gaps`.
    pub gap_points: i64,
    /// Average gaps per divisor unit per teacher, ×100.
    pub gap_percentage: f64,
    /// Days honouring daily opt-outs.
    pub daily_points: i64,
    /// Share of declared daily opt-outs honoured (0..100).
    pub daily_percentage: f64,
    /// Avoid-slots left free.
    pub specific_points: i64,
    /// Share of the tracked avoid-slot maximum left free (0..100).
    pub specific_percentage: f64,
}

impl ShiftScore {
    /// Point total of this shift.
    pub fn points(&self) -> i64 {
        self.gap_points + self.daily_points + self.specific_points
    }
}

/// Score of a whole candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Morning shift score.
    pub morning: ShiftScore,
    /// Afternoon shift score.
    pub afternoon: ShiftScore,
    /// Sum of both shifts' points.
    pub total: i64,
}

/// Per-teacher score within one shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherScore {
    /// Teacher.
    pub teacher_id: String,
    /// Shift.
    pub shift: Shift,
    /// Weekly gaps.
    pub gaps: u32,
    /// Days honouring daily opt-outs.
    pub daily_points: i64,
    /// Share of declared daily opt-outs honoured (0..100).
    pub daily_percentage: f64,
    /// Avoid-slots left free.
    pub specific_points: i64,
    /// Share of the tracked maximum left free (0..100).
    pub specific_percentage: f64,
}

/// Scores matrices against teacher preferences.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    preferences: HashMap<String, TeacherPreferences>,
    layout: WeekLayout,
    settings: ScoreSettings,
}

impl ScoreCalculator {
    /// Creates a calculator for the given teachers and layout.
    pub fn new(teachers: &[Teacher], layout: WeekLayout, settings: ScoreSettings) -> Self {
        Self {
            preferences: teachers
                .iter()
                .map(|t| (t.id.clone(), t.preferences.clone()))
                .collect(),
            layout,
            settings,
        }
    }

    /// Scores a matrix. Deterministic for a given matrix and preferences.
    pub fn score(&self, matrix: &ScheduleMatrix) -> (ScoreBreakdown, Vec<TeacherScore>) {
        let mut teacher_scores = Vec::new();
        let morning = self.score_shift(matrix, Shift::Morning, &mut teacher_scores);
        let afternoon = self.score_shift(matrix, Shift::Afternoon, &mut teacher_scores);
        let total = morning.points() + afternoon.points();
        (
            ScoreBreakdown {
                morning,
                afternoon,
                total,
            },
            teacher_scores,
        )
    }

    fn score_shift(
        &self,
        matrix: &ScheduleMatrix,
        shift: Shift,
        out: &mut Vec<TeacherScore>,
    ) -> ShiftScore {
        let slots = self.layout.slots(shift);
        let profiles = matrix.teacher_profiles(shift);
        let default_prefs = TeacherPreferences::default();
        let max_specific = self.settings.max_specific_preferences.max(1) as usize;

        let mut score = ShiftScore {
            teachers: profiles.len(),
            ..Default::default()
        };
        let mut daily_declared = 0usize;

        for (teacher_id, profile) in &profiles {
            let prefs = self.preferences.get(teacher_id).unwrap_or(&default_prefs);

            let gaps = weekly_gaps(profile);
            score.gaps += gaps;
            score.worst_case_gaps += (DAYS_PER_WEEK * slots.saturating_sub(2)) as u32;

            let mut daily_points = 0i64;
            let mut declared = 0usize;
            if prefs.no_first_period && slots > 0 {
                daily_points += honoured_days(profile, 0);
                declared += 1;
            }
            if prefs.no_last_period && slots > 0 {
                daily_points += honoured_days(profile, slots - 1);
                declared += 1;
            }
            daily_declared += declared;

            let specific_points = prefs
                .avoid_slots
                .iter()
                .filter(|a| a.shift == shift)
                .take(max_specific)
                .filter(|a| {
                    a.weekday < DAYS_PER_WEEK && !profile[a.weekday].contains(&a.slot)
                })
                .count() as i64;

            score.daily_points += daily_points;
            score.specific_points += specific_points;

            out.push(TeacherScore {
                teacher_id: teacher_id.clone(),
                shift,
                gaps,
                daily_points,
                daily_percentage: percentage(daily_points as f64, (declared * DAYS_PER_WEEK) as f64),
                specific_points,
                specific_percentage: percentage(specific_points as f64, max_specific as f64),
            });
        }

        score.gap_points = i64::from(score.worst_case_gaps) - i64::from(score.gaps);
        score.gap_percentage = if score.teachers == 0 {
            0.0
        } else {
            100.0 * (f64::from(score.gaps) / f64::from(self.settings.gap_divisor.max(1)))
                / score.teachers as f64
        };
        score.daily_percentage = percentage(
            score.daily_points as f64,
            (daily_declared * DAYS_PER_WEEK) as f64,
        );
        score.specific_percentage = percentage(
            score.specific_points as f64,
            (max_specific * score.teachers) as f64,
        );
        score
    }
}

/// Free slots between occupied slots, summed over the week.
fn weekly_gaps(profile: &DayProfile) -> u32 {
    profile
        .iter()
        .map(|slots| {
            slots
                .windows(2)
                .map(|w| (w[1] - w[0] - 1) as u32)
                .sum::<u32>()
        })
        .sum()
}

/// Days on which `slot` is free (5 − violations).
fn honoured_days(profile: &DayProfile, slot: usize) -> i64 {
    let hits = profile.iter().filter(|slots| slots.contains(&slot)).count();
    (DAYS_PER_WEEK - hits) as i64
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        100.0 * part / whole
    }
}
