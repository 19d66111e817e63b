//! Weekly-hour assignments: teaching, workload relief, and fixed pins.
//!
//! These are the persisted inputs of a generation run. Each weekly hour
//! of an assignment becomes one independent session.

use serde::{Deserialize, Serialize};

/// A teacher teaching a subject to a group for a number of hours a week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachingAssignment {
    /// Unique assignment identifier.
    pub id: String,
    /// Teacher giving the class.
    pub teacher_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Group attending.
    pub group_id: String,
    /// Hours per week.
    pub weekly_hours: u32,
    /// Elective block key. Assignments sharing a key run in parallel,
    /// hour by hour.
    pub elective_block: Option<String>,
    /// Vocational module run length. Hours are chunked into runs of this
    /// length, each run on adjacent slots of one day.
    pub module_block: Option<u32>,
}

impl TeachingAssignment {
    /// Creates a new assignment.
    pub fn new(
        id: impl Into<String>,
        teacher_id: impl Into<String>,
        subject_id: impl Into<String>,
        group_id: impl Into<String>,
        weekly_hours: u32,
    ) -> Self {
        Self {
            id: id.into(),
            teacher_id: teacher_id.into(),
            subject_id: subject_id.into(),
            group_id: group_id.into(),
            weekly_hours,
            elective_block: None,
            module_block: None,
        }
    }

    /// Joins an elective block.
    pub fn with_elective_block(mut self, block: impl Into<String>) -> Self {
        self.elective_block = Some(block.into());
        self
    }

    /// Marks the assignment as a vocational module with runs of `len` hours.
    pub fn with_module_block(mut self, len: u32) -> Self {
        self.module_block = Some(len);
        self
    }

    /// Whether this assignment belongs to an elective block.
    pub fn is_elective(&self) -> bool {
        self.elective_block.is_some()
    }
}

/// Teacher hours released from teaching (tutoring, coordination, duty).
///
/// Relief sessions occupy the teacher but not the group they are
/// timetabled against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliefAllotment {
    /// Unique allotment identifier.
    pub id: String,
    /// Teacher receiving the relief.
    pub teacher_id: String,
    /// Reduction type (e.g. "tutoring", "department-head").
    pub reduction_id: String,
    /// Group column the relief hours are placed in.
    pub group_id: String,
    /// Hours per week.
    pub weekly_hours: u32,
}

impl ReliefAllotment {
    /// Creates a new relief allotment.
    pub fn new(
        id: impl Into<String>,
        teacher_id: impl Into<String>,
        reduction_id: impl Into<String>,
        group_id: impl Into<String>,
        weekly_hours: u32,
    ) -> Self {
        Self {
            id: id.into(),
            teacher_id: teacher_id.into(),
            reduction_id: reduction_id.into(),
            group_id: group_id.into(),
            weekly_hours,
        }
    }
}

/// An administrator-fixed position for one hour of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPin {
    /// Teaching assignment or relief allotment the pin applies to.
    pub assignment_id: String,
    /// Hour sequence number within the week (0-indexed).
    pub hour_seq: u32,
    /// Weekday (0-indexed).
    pub weekday: usize,
    /// Slot within the day (0-indexed).
    pub slot: usize,
}

impl FixedPin {
    /// Creates a pin.
    pub fn new(assignment_id: impl Into<String>, hour_seq: u32, weekday: usize, slot: usize) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            hour_seq,
            weekday,
            slot,
        }
    }
}
