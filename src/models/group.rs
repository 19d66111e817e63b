//! Course group model.
//!
//! A course group (class) is one column of the weekly timetable. Groups
//! attend either in the morning or in the afternoon, and belong to an
//! education level that decides which coupling rules apply to them.

use serde::{Deserialize, Serialize};

/// Half of the school day a group attends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    /// Morning timetable.
    Morning,
    /// Afternoon timetable.
    Afternoon,
}

impl Shift {
    /// Both shifts, morning first.
    pub const ALL: [Shift; 2] = [Shift::Morning, Shift::Afternoon];
}

/// Education level of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    /// Compulsory / general secondary education.
    Secondary,
    /// Vocational training, organised in modules.
    Vocational,
}

/// A course group: one weekly timetable column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseGroup {
    /// Unique group identifier.
    pub id: String,
    /// Human-readable name (e.g. "1A").
    pub name: String,
    /// Shift the group attends.
    pub shift: Shift,
    /// Education level.
    pub level: EducationLevel,
}

impl CourseGroup {
    /// Creates a secondary morning group.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            shift: Shift::Morning,
            level: EducationLevel::Secondary,
        }
    }

    /// Creates a vocational group.
    pub fn vocational(id: impl Into<String>) -> Self {
        Self::new(id).with_level(EducationLevel::Vocational)
    }

    /// Sets the group name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the shift.
    pub fn with_shift(mut self, shift: Shift) -> Self {
        self.shift = shift;
        self
    }

    /// Sets the education level.
    pub fn with_level(mut self, level: EducationLevel) -> Self {
        self.level = level;
        self
    }

    /// Whether this group attends in the afternoon.
    pub fn is_afternoon(&self) -> bool {
        self.shift == Shift::Afternoon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_builder() {
        let g = CourseGroup::new("G1")
            .with_name("1A")
            .with_shift(Shift::Afternoon);
        assert_eq!(g.id, "G1");
        assert_eq!(g.name, "1A");
        assert!(g.is_afternoon());
        assert_eq!(g.level, EducationLevel::Secondary);
    }

    #[test]
    fn test_vocational_group() {
        let g = CourseGroup::vocational("FP1");
        assert_eq!(g.level, EducationLevel::Vocational);
        assert_eq!(g.shift, Shift::Morning);
    }
}
