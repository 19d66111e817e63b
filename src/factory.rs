//! Session factory.
//!
//! Expands persisted assignments, relief allotments and fixed pins into
//! per-column session lists, one session per weekly hour.
//!
//! # Algorithm
//!
//! 1. Scan the groups once and give every group a column index within its
//!    shift, in input order. Column `c` owns days `[5c, 5c + 5)`.
//! 2. Build one template restriction pool per column.
//! 3. For every weekly hour of every assignment and allotment, clone the
//!    column template, apply the teacher's soft preferences, and collapse
//!    it onto the pinned position if an administrator fixed that hour.
//!
//! Elective and module couplings are left to the search worker, which
//! resolves them while placing.

use std::collections::HashMap;
use tracing::debug;

use crate::error::{Result, TimetableError};
use crate::models::{
    CourseGroup, RestrictionPool, Session, Shift, Teacher, TimetableInput, WeekLayout,
    DAYS_PER_WEEK,
};
use crate::validation::validate_input;

/// Group → column index, per shift.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    morning: HashMap<String, usize>,
    afternoon: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Assigns consecutive column indices per shift, in group order.
    pub fn build(groups: &[CourseGroup]) -> Self {
        let mut index = Self::default();
        for g in groups {
            let map = index.map_mut(g.shift);
            let next = map.len();
            map.entry(g.id.clone()).or_insert(next);
        }
        index
    }

    fn map_mut(&mut self, shift: Shift) -> &mut HashMap<String, usize> {
        match shift {
            Shift::Morning => &mut self.morning,
            Shift::Afternoon => &mut self.afternoon,
        }
    }

    fn map(&self, shift: Shift) -> &HashMap<String, usize> {
        match shift {
            Shift::Morning => &self.morning,
            Shift::Afternoon => &self.afternoon,
        }
    }

    /// Column index of a group within its shift.
    pub fn column(&self, shift: Shift, group_id: &str) -> Option<usize> {
        self.map(shift).get(group_id).copied()
    }

    /// First day of a group's column on the flat day axis.
    pub fn day_offset(&self, shift: Shift, group_id: &str) -> Option<usize> {
        self.column(shift, group_id).map(|c| c * DAYS_PER_WEEK)
    }

    /// Number of columns in a shift.
    pub fn columns(&self, shift: Shift) -> usize {
        self.map(shift).len()
    }
}

/// Sessions of a run, grouped by shift and column.
///
/// Serves as the read-only template every search worker clones.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    /// Morning sessions; outer index = column.
    pub morning: Vec<Vec<Session>>,
    /// Afternoon sessions; outer index = column.
    pub afternoon: Vec<Vec<Session>>,
    /// Group → column index.
    pub columns: ColumnIndex,
    /// Slots per day per shift.
    pub layout: WeekLayout,
}

impl SessionPlan {
    /// Sessions of a shift, by column.
    pub fn shift(&self, shift: Shift) -> &[Vec<Session>] {
        match shift {
            Shift::Morning => &self.morning,
            Shift::Afternoon => &self.afternoon,
        }
    }

    /// Iterates every session in factory order, morning first.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> + '_ {
        self.morning
            .iter()
            .chain(self.afternoon.iter())
            .flat_map(|column| column.iter())
    }

    /// Total number of sessions.
    pub fn session_count(&self) -> usize {
        self.sessions().count()
    }

    /// Expected weekly hours per assignment/allotment ID.
    pub fn expected_hours(&self) -> HashMap<String, u32> {
        let mut hours = HashMap::new();
        for s in self.sessions() {
            *hours.entry(s.source_id().to_string()).or_insert(0) += 1;
        }
        hours
    }
}

/// Builds session plans from validated input rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFactory;

impl SessionFactory {
    /// Creates a factory.
    pub fn new() -> Self {
        Self
    }

    /// Validates the input and expands it into a session plan.
    ///
    /// # Errors
    /// [`TimetableError::UpstreamDataInvalid`] with every problem found.
    pub fn build(&self, input: &TimetableInput) -> Result<SessionPlan> {
        validate_input(input).map_err(TimetableError::UpstreamDataInvalid)?;

        let layout = input.layout;
        let columns = ColumnIndex::build(&input.groups);
        let groups: HashMap<&str, &CourseGroup> =
            input.groups.iter().map(|g| (g.id.as_str(), g)).collect();
        let teachers: HashMap<&str, &Teacher> =
            input.teachers.iter().map(|t| (t.id.as_str(), t)).collect();
        let pins: HashMap<(&str, u32), (usize, usize)> = input
            .pins
            .iter()
            .map(|p| ((p.assignment_id.as_str(), p.hour_seq), (p.weekday, p.slot)))
            .collect();

        let mut plan = SessionPlan {
            morning: vec![Vec::new(); columns.columns(Shift::Morning)],
            afternoon: vec![Vec::new(); columns.columns(Shift::Afternoon)],
            columns,
            layout,
        };

        // Validation guarantees every lookup below succeeds.
        for a in &input.assignments {
            let (Some(group), Some(teacher)) =
                (groups.get(a.group_id.as_str()), teachers.get(a.teacher_id.as_str()))
            else {
                continue;
            };
            let Some(column) = plan.columns.column(group.shift, &group.id) else {
                continue;
            };
            let template = preference_pool(column, layout.slots(group.shift), group.shift, teacher);
            for hour in 0..a.weekly_hours {
                let mut session = Session::teaching(
                    &a.id,
                    &a.teacher_id,
                    &a.subject_id,
                    &a.group_id,
                    group.shift,
                    group.level,
                    hour,
                    template.clone(),
                )
                .with_column(column)
                .with_elective_block(a.elective_block.clone())
                .with_module_block(a.module_block);
                if let Some(&(weekday, slot)) = pins.get(&(a.id.as_str(), hour)) {
                    session.pin(weekday, slot);
                }
                plan.column_mut(group.shift, column).push(session);
            }
        }

        for r in &input.reliefs {
            let (Some(group), Some(teacher)) =
                (groups.get(r.group_id.as_str()), teachers.get(r.teacher_id.as_str()))
            else {
                continue;
            };
            let Some(column) = plan.columns.column(group.shift, &group.id) else {
                continue;
            };
            let template = preference_pool(column, layout.slots(group.shift), group.shift, teacher);
            for hour in 0..r.weekly_hours {
                let mut session = Session::relief(
                    &r.id,
                    &r.teacher_id,
                    &r.reduction_id,
                    &r.group_id,
                    group.shift,
                    group.level,
                    hour,
                    template.clone(),
                )
                .with_column(column);
                if let Some(&(weekday, slot)) = pins.get(&(r.id.as_str(), hour)) {
                    session.pin(weekday, slot);
                }
                plan.column_mut(group.shift, column).push(session);
            }
        }

        debug!(
            sessions = plan.session_count(),
            morning_columns = plan.morning.len(),
            afternoon_columns = plan.afternoon.len(),
            "Session plan built"
        );
        Ok(plan)
    }
}

impl SessionPlan {
    fn column_mut(&mut self, shift: Shift, column: usize) -> &mut Vec<Session> {
        match shift {
            Shift::Morning => &mut self.morning[column],
            Shift::Afternoon => &mut self.afternoon[column],
        }
    }
}

/// Column pool narrowed by a teacher's soft preferences.
fn preference_pool(column: usize, slots: usize, shift: Shift, teacher: &Teacher) -> RestrictionPool {
    let mut pool = RestrictionPool::for_column(column * DAYS_PER_WEEK, slots);
    let prefs = &teacher.preferences;
    if prefs.no_first_period {
        pool.exclude_first_period();
    }
    if prefs.no_last_period {
        pool.exclude_last_period();
    }
    let dislikes = prefs.dislikes_for(shift);
    if !dislikes.is_empty() {
        pool.exclude_teacher_dislikes(&dislikes);
    }
    pool
}
