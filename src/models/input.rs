//! Generation input: the week layout plus every persisted row the engine
//! consumes.

use serde::{Deserialize, Serialize};

use super::{CourseGroup, FixedPin, ReliefAllotment, Shift, Teacher, TeachingAssignment};

/// Slots per day for each shift. The week always has five days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekLayout {
    /// Slots per morning day.
    pub morning_slots: usize,
    /// Slots per afternoon day.
    pub afternoon_slots: usize,
}

impl WeekLayout {
    /// Creates a layout.
    pub fn new(morning_slots: usize, afternoon_slots: usize) -> Self {
        Self {
            morning_slots,
            afternoon_slots,
        }
    }

    /// Slots per day of a shift.
    pub fn slots(&self, shift: Shift) -> usize {
        match shift {
            Shift::Morning => self.morning_slots,
            Shift::Afternoon => self.afternoon_slots,
        }
    }

    /// Weekly positions of one column in a shift.
    pub fn weekly_positions(&self, shift: Shift) -> usize {
        super::DAYS_PER_WEEK * self.slots(shift)
    }
}

impl Default for WeekLayout {
    fn default() -> Self {
        Self::new(6, 6)
    }
}

/// Everything a generation run is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableInput {
    /// Slots per day per shift.
    pub layout: WeekLayout,
    /// Course groups (timetable columns).
    pub groups: Vec<CourseGroup>,
    /// Teachers with their preferences.
    pub teachers: Vec<Teacher>,
    /// Teacher-subject-group weekly hours.
    pub assignments: Vec<TeachingAssignment>,
    /// Teacher workload relief hours.
    pub reliefs: Vec<ReliefAllotment>,
    /// Administrator-fixed positions.
    pub pins: Vec<FixedPin>,
}

impl TimetableInput {
    /// Creates an empty input with the given layout.
    pub fn new(layout: WeekLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    /// Adds a group.
    pub fn with_group(mut self, group: CourseGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a teaching assignment.
    pub fn with_assignment(mut self, assignment: TeachingAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Adds a relief allotment.
    pub fn with_relief(mut self, relief: ReliefAllotment) -> Self {
        self.reliefs.push(relief);
        self
    }

    /// Adds a fixed pin.
    pub fn with_pin(mut self, pin: FixedPin) -> Self {
        self.pins.push(pin);
        self
    }

    /// Finds a group by ID.
    pub fn group(&self, id: &str) -> Option<&CourseGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Finds a teacher by ID.
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    /// Total weekly hours across assignments and reliefs.
    pub fn total_weekly_hours(&self) -> u32 {
        self.assignments.iter().map(|a| a.weekly_hours).sum::<u32>()
            + self.reliefs.iter().map(|r| r.weekly_hours).sum::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let layout = WeekLayout::new(6, 5);
        assert_eq!(layout.slots(Shift::Morning), 6);
        assert_eq!(layout.slots(Shift::Afternoon), 5);
        assert_eq!(layout.weekly_positions(Shift::Afternoon), 25);
    }

    #[test]
    fn test_input_builder() {
        let input = TimetableInput::new(WeekLayout::default())
            .with_group(CourseGroup::new("G1"))
            .with_teacher(Teacher::new("T1"))
            .with_assignment(TeachingAssignment::new("A1", "T1", "MATH", "G1", 4))
            .with_relief(ReliefAllotment::new("R1", "T1", "TUTOR", "G1", 1))
            .with_pin(FixedPin::new("A1", 0, 0, 0));

        assert!(input.group("G1").is_some());
        assert!(input.teacher("T9").is_none());
        assert_eq!(input.total_weekly_hours(), 5);
        assert_eq!(input.pins.len(), 1);
    }
}
