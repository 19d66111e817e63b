//! Teacher model and scheduling preferences.
//!
//! Preferences are soft constraints: they move positions into the
//! avoidable bucket of a session's pool and feed the preference scores,
//! but never make a placement illegal.

use serde::{Deserialize, Serialize};

use super::Shift;

/// A teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Declared scheduling preferences.
    pub preferences: TeacherPreferences,
}

/// Soft scheduling preferences declared by a teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherPreferences {
    /// Prefers no class in the first period of the day.
    pub no_first_period: bool,
    /// Prefers no class in the last period of the day.
    pub no_last_period: bool,
    /// Specific positions the teacher wants to keep free.
    pub avoid_slots: Vec<AvoidSlot>,
}

/// A specific (shift, weekday, slot) a teacher wants to keep free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvoidSlot {
    /// Shift the slot belongs to.
    pub shift: Shift,
    /// Weekday (0-indexed).
    pub weekday: usize,
    /// Slot within the day (0-indexed).
    pub slot: usize,
}

impl AvoidSlot {
    /// Creates an avoid-slot.
    pub fn new(shift: Shift, weekday: usize, slot: usize) -> Self {
        Self {
            shift,
            weekday,
            slot,
        }
    }
}

impl TeacherPreferences {
    /// Whether any daily (first/last period) preference is declared.
    pub fn has_daily_preference(&self) -> bool {
        self.no_first_period || self.no_last_period
    }

    /// Avoid-slots of one shift as `(weekday, slot)` pairs.
    pub fn dislikes_for(&self, shift: Shift) -> Vec<(usize, usize)> {
        self.avoid_slots
            .iter()
            .filter(|a| a.shift == shift)
            .map(|a| (a.weekday, a.slot))
            .collect()
    }
}

impl Teacher {
    /// Creates a teacher with no preferences.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            preferences: TeacherPreferences::default(),
        }
    }

    /// Sets the teacher name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares the no-first-period preference.
    pub fn without_first_period(mut self) -> Self {
        self.preferences.no_first_period = true;
        self
    }

    /// Declares the no-last-period preference.
    pub fn without_last_period(mut self) -> Self {
        self.preferences.no_last_period = true;
        self
    }

    /// Adds a specific slot to avoid.
    pub fn with_avoid_slot(mut self, shift: Shift, weekday: usize, slot: usize) -> Self {
        self.preferences
            .avoid_slots
            .push(AvoidSlot::new(shift, weekday, slot));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_builder() {
        let t = Teacher::new("T1")
            .with_name("Ada")
            .without_first_period()
            .with_avoid_slot(Shift::Morning, 2, 3)
            .with_avoid_slot(Shift::Afternoon, 0, 1);

        assert_eq!(t.id, "T1");
        assert!(t.preferences.no_first_period);
        assert!(!t.preferences.no_last_period);
        assert!(t.preferences.has_daily_preference());
        assert_eq!(t.preferences.avoid_slots.len(), 2);
    }

    #[test]
    fn test_dislikes_for_shift() {
        let t = Teacher::new("T1")
            .with_avoid_slot(Shift::Morning, 2, 3)
            .with_avoid_slot(Shift::Afternoon, 0, 1)
            .with_avoid_slot(Shift::Morning, 4, 0);

        assert_eq!(t.preferences.dislikes_for(Shift::Morning), vec![(2, 3), (4, 0)]);
        assert_eq!(t.preferences.dislikes_for(Shift::Afternoon), vec![(0, 1)]);
    }

    #[test]
    fn test_no_preferences() {
        let t = Teacher::new("T2");
        assert!(!t.preferences.has_daily_preference());
        assert!(t.preferences.dislikes_for(Shift::Morning).is_empty());
    }
}
