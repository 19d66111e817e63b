//! Session model.
//!
//! A session is one weekly hour of an assignment: the smallest unit the
//! search places. An assignment needing four hours a week yields four
//! independent sessions, each owning its own restriction pool.
//!
//! Two kinds share the same base:
//! - **Teaching**: subject + group, blocks both teacher and group.
//! - **Relief**: a workload reduction, blocks only the teacher.

use serde::{Deserialize, Serialize};

use super::{EducationLevel, RestrictionPool, Shift};

/// What a session is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    /// One hour of subject teaching.
    Teaching {
        /// Source assignment.
        assignment_id: String,
        /// Subject taught.
        subject_id: String,
        /// Elective block key, if any.
        elective_block: Option<String>,
        /// Vocational module run length, if any.
        module_block: Option<u32>,
    },
    /// One hour of workload relief.
    Relief {
        /// Source allotment.
        allotment_id: String,
        /// Reduction type.
        reduction_id: String,
    },
}

/// Key under which coupled sessions share placement information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CouplingKey {
    /// Hour `hour_seq` of every assignment in elective block `block`.
    Elective { block: String, hour_seq: u32 },
    /// Run `run` of a vocational module assignment.
    Module { assignment_id: String, run: u32 },
}

/// One schedulable weekly hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Teacher holding the session.
    pub teacher_id: String,
    /// Group column the session is placed in.
    pub group_id: String,
    /// Column index within the shift's grid.
    pub column: usize,
    /// Shift of the group column.
    pub shift: Shift,
    /// Education level of the group column.
    pub level: EducationLevel,
    /// Hour sequence number within the assignment (0-indexed).
    pub hour_seq: u32,
    /// Whether an administrator fixed this hour's position.
    pub pinned: bool,
    /// Remaining placement options for the current attempt.
    pub pool: RestrictionPool,
    /// Teaching or relief payload.
    pub kind: SessionKind,
}

impl Session {
    /// Creates a teaching session.
    #[allow(clippy::too_many_arguments)]
    pub fn teaching(
        assignment_id: impl Into<String>,
        teacher_id: impl Into<String>,
        subject_id: impl Into<String>,
        group_id: impl Into<String>,
        shift: Shift,
        level: EducationLevel,
        hour_seq: u32,
        pool: RestrictionPool,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            group_id: group_id.into(),
            column: pool_column(&pool),
            shift,
            level,
            hour_seq,
            pinned: false,
            pool,
            kind: SessionKind::Teaching {
                assignment_id: assignment_id.into(),
                subject_id: subject_id.into(),
                elective_block: None,
                module_block: None,
            },
        }
    }

    /// Creates a relief session.
    #[allow(clippy::too_many_arguments)]
    pub fn relief(
        allotment_id: impl Into<String>,
        teacher_id: impl Into<String>,
        reduction_id: impl Into<String>,
        group_id: impl Into<String>,
        shift: Shift,
        level: EducationLevel,
        hour_seq: u32,
        pool: RestrictionPool,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            group_id: group_id.into(),
            column: pool_column(&pool),
            shift,
            level,
            hour_seq,
            pinned: false,
            pool,
            kind: SessionKind::Relief {
                allotment_id: allotment_id.into(),
                reduction_id: reduction_id.into(),
            },
        }
    }

    /// Sets the elective block of a teaching session.
    pub fn with_elective_block(mut self, block: Option<String>) -> Self {
        if let SessionKind::Teaching { elective_block, .. } = &mut self.kind {
            *elective_block = block;
        }
        self
    }

    /// Sets the module run length of a teaching session.
    pub fn with_module_block(mut self, len: Option<u32>) -> Self {
        if let SessionKind::Teaching { module_block, .. } = &mut self.kind {
            *module_block = len;
        }
        self
    }

    /// Sets the column index explicitly.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    /// Collapses the pool to the pinned `(weekday, slot)` of this column.
    pub fn pin(&mut self, weekday: usize, slot: usize) {
        self.pool
            .force_to(self.column * super::DAYS_PER_WEEK + weekday, slot);
        self.pinned = true;
    }

    /// Whether this is a teaching session.
    pub fn is_teaching(&self) -> bool {
        matches!(self.kind, SessionKind::Teaching { .. })
    }

    /// Whether this is a relief session.
    pub fn is_relief(&self) -> bool {
        matches!(self.kind, SessionKind::Relief { .. })
    }

    /// Source assignment or allotment ID.
    pub fn source_id(&self) -> &str {
        match &self.kind {
            SessionKind::Teaching { assignment_id, .. } => assignment_id,
            SessionKind::Relief { allotment_id, .. } => allotment_id,
        }
    }

    /// Subject (teaching) or reduction (relief) ID.
    pub fn activity_id(&self) -> &str {
        match &self.kind {
            SessionKind::Teaching { subject_id, .. } => subject_id,
            SessionKind::Relief { reduction_id, .. } => reduction_id,
        }
    }

    /// Coupling key, if this session is tied to other sessions.
    ///
    /// Elective membership takes precedence over module continuity.
    pub fn coupling_key(&self) -> Option<CouplingKey> {
        match &self.kind {
            SessionKind::Teaching {
                elective_block: Some(block),
                ..
            } => Some(CouplingKey::Elective {
                block: block.clone(),
                hour_seq: self.hour_seq,
            }),
            SessionKind::Teaching {
                assignment_id,
                module_block: Some(len),
                ..
            } if *len > 0 => Some(CouplingKey::Module {
                assignment_id: assignment_id.clone(),
                run: self.hour_seq / len,
            }),
            _ => None,
        }
    }

    /// Whether this hour opens a module run (or is not in a module).
    pub fn leads_module_run(&self) -> bool {
        match &self.kind {
            SessionKind::Teaching {
                module_block: Some(len),
                ..
            } if *len > 0 => self.hour_seq % len == 0,
            _ => true,
        }
    }
}

fn pool_column(pool: &RestrictionPool) -> usize {
    pool.unavoidable()
        .iter()
        .chain(pool.avoidable().iter())
        .map(|item| item.column())
        .next()
        .unwrap_or(0)
}
