//! Input validation for generation runs.
//!
//! Checks structural integrity of groups, teachers, assignments, reliefs
//! and pins before a run is launched. Detects:
//! - Duplicate IDs
//! - Dangling teacher, group and assignment references
//! - Pins and avoid-slots outside the week layout
//! - Inconsistent elective blocks and vocational modules
//! - Teachers or groups demanding more hours than their shift offers
//!
//! A run is refused with the full list of problems.

use crate::models::{Shift, TimetableInput, DAYS_PER_WEEK, EducationLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A row references a teacher that doesn't exist.
    InvalidTeacherReference,
    /// A row references a group that doesn't exist.
    InvalidGroupReference,
    /// A pin references an assignment that doesn't exist.
    InvalidAssignmentReference,
    /// An assignment or relief has zero weekly hours.
    EmptyAssignment,
    /// A shift with groups has no slots per day.
    InvalidLayout,
    /// A pin lies outside the week or the assignment's hours.
    PinOutOfRange,
    /// Two pins fix the same hour.
    DuplicatePin,
    /// Elective siblings disagree on hours or shift.
    ElectiveMismatch,
    /// Elective siblings are pinned to different positions for one hour.
    ConflictingPins,
    /// A module block is malformed or misplaced.
    InvalidModuleBlock,
    /// A teacher avoid-slot lies outside the week.
    AvoidSlotOutOfRange,
    /// A teacher or group needs more hours than the shift offers.
    Overloaded,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates the input rows of a generation run.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: &TimetableInput) -> ValidationResult {
    let mut errors = Vec::new();

    let groups = check_ids(input, &mut errors);
    check_layout(input, &mut errors);
    check_references(input, &groups, &mut errors);
    check_pins(input, &groups, &mut errors);
    check_electives(input, &groups, &mut errors);
    check_modules(input, &groups, &mut errors);
    check_avoid_slots(input, &mut errors);
    check_capacity(input, &groups, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

type GroupIndex<'a> = HashMap<&'a str, (Shift, EducationLevel)>;

fn push(errors: &mut Vec<ValidationError>, kind: ValidationErrorKind, message: String) {
    errors.push(ValidationError::new(kind, message));
}

fn check_ids<'a>(input: &'a TimetableInput, errors: &mut Vec<ValidationError>) -> GroupIndex<'a> {
    let mut groups = HashMap::new();
    for g in &input.groups {
        if groups.insert(g.id.as_str(), (g.shift, g.level)).is_some() {
            push(errors, ValidationErrorKind::DuplicateId, format!("Duplicate group ID: {}", g.id));
        }
    }

    let mut teacher_ids = HashSet::new();
    for t in &input.teachers {
        if !teacher_ids.insert(t.id.as_str()) {
            push(errors, ValidationErrorKind::DuplicateId, format!("Duplicate teacher ID: {}", t.id));
        }
    }

    // Pins address assignments and reliefs through one ID space.
    let mut source_ids = HashSet::new();
    let sources = input
        .assignments
        .iter()
        .map(|a| a.id.as_str())
        .chain(input.reliefs.iter().map(|r| r.id.as_str()));
    for id in sources {
        if !source_ids.insert(id) {
            push(errors, ValidationErrorKind::DuplicateId, format!("Duplicate assignment ID: {id}"));
        }
    }

    groups
}

fn check_layout(input: &TimetableInput, errors: &mut Vec<ValidationError>) {
    for shift in Shift::ALL {
        let used = input.groups.iter().any(|g| g.shift == shift);
        if used && input.layout.slots(shift) == 0 {
            push(
                errors,
                ValidationErrorKind::InvalidLayout,
                format!("Shift {shift:?} has groups but no slots per day"),
            );
        }
    }
}

fn check_references(input: &TimetableInput, groups: &GroupIndex<'_>, errors: &mut Vec<ValidationError>) {
    let teachers: HashSet<&str> = input.teachers.iter().map(|t| t.id.as_str()).collect();

    let rows = input
        .assignments
        .iter()
        .map(|a| (&a.id, &a.teacher_id, &a.group_id, a.weekly_hours))
        .chain(
            input
                .reliefs
                .iter()
                .map(|r| (&r.id, &r.teacher_id, &r.group_id, r.weekly_hours)),
        );

    for (id, teacher_id, group_id, hours) in rows {
        if !teachers.contains(teacher_id.as_str()) {
            push(
                errors,
                ValidationErrorKind::InvalidTeacherReference,
                format!("Assignment '{id}' references unknown teacher '{teacher_id}'"),
            );
        }
        if !groups.contains_key(group_id.as_str()) {
            push(
                errors,
                ValidationErrorKind::InvalidGroupReference,
                format!("Assignment '{id}' references unknown group '{group_id}'"),
            );
        }
        if hours == 0 {
            push(
                errors,
                ValidationErrorKind::EmptyAssignment,
                format!("Assignment '{id}' has no weekly hours"),
            );
        }
    }
}

/// Weekly hours, group and module length per assignment/allotment ID.
fn sources(input: &TimetableInput) -> HashMap<&str, (u32, &str, Option<u32>)> {
    input
        .assignments
        .iter()
        .map(|a| (a.id.as_str(), (a.weekly_hours, a.group_id.as_str(), a.module_block)))
        .chain(
            input
                .reliefs
                .iter()
                .map(|r| (r.id.as_str(), (r.weekly_hours, r.group_id.as_str(), None))),
        )
        .collect()
}

fn check_pins(input: &TimetableInput, groups: &GroupIndex<'_>, errors: &mut Vec<ValidationError>) {
    let sources = sources(input);
    let mut seen = HashSet::new();

    for pin in &input.pins {
        let Some(&(hours, group_id, module)) = sources.get(pin.assignment_id.as_str()) else {
            push(
                errors,
                ValidationErrorKind::InvalidAssignmentReference,
                format!("Pin references unknown assignment '{}'", pin.assignment_id),
            );
            continue;
        };

        if !seen.insert((pin.assignment_id.as_str(), pin.hour_seq)) {
            push(
                errors,
                ValidationErrorKind::DuplicatePin,
                format!("Hour {} of '{}' is pinned twice", pin.hour_seq, pin.assignment_id),
            );
        }
        if pin.hour_seq >= hours {
            push(
                errors,
                ValidationErrorKind::PinOutOfRange,
                format!(
                    "Pin for '{}' targets hour {} but the assignment has {hours} hour(s)",
                    pin.assignment_id, pin.hour_seq
                ),
            );
        }
        if let Some(&(shift, _)) = groups.get(group_id) {
            if pin.weekday >= DAYS_PER_WEEK || pin.slot >= input.layout.slots(shift) {
                push(
                    errors,
                    ValidationErrorKind::PinOutOfRange,
                    format!(
                        "Pin for '{}' at ({}, {}) is outside the week",
                        pin.assignment_id, pin.weekday, pin.slot
                    ),
                );
            }
        }
        if let Some(len) = module {
            if len > 0 && pin.hour_seq % len != 0 {
                push(
                    errors,
                    ValidationErrorKind::InvalidModuleBlock,
                    format!(
                        "Pin for '{}' targets hour {} which does not open a module run",
                        pin.assignment_id, pin.hour_seq
                    ),
                );
            }
        }
    }
}

fn check_electives(input: &TimetableInput, groups: &GroupIndex<'_>, errors: &mut Vec<ValidationError>) {
    let mut blocks: BTreeMap<&str, Vec<&crate::models::TeachingAssignment>> = BTreeMap::new();
    for a in &input.assignments {
        if let Some(block) = &a.elective_block {
            blocks.entry(block.as_str()).or_default().push(a);
        }
    }

    for (block, members) in &blocks {
        let hours: HashSet<u32> = members.iter().map(|a| a.weekly_hours).collect();
        if hours.len() > 1 {
            push(
                errors,
                ValidationErrorKind::ElectiveMismatch,
                format!("Elective block '{block}' mixes different weekly hours"),
            );
        }
        let shifts: HashSet<Shift> = members
            .iter()
            .filter_map(|a| groups.get(a.group_id.as_str()).map(|(s, _)| *s))
            .collect();
        if shifts.len() > 1 {
            push(
                errors,
                ValidationErrorKind::ElectiveMismatch,
                format!("Elective block '{block}' spans both shifts"),
            );
        }
        if members.iter().any(|a| a.module_block.is_some()) {
            push(
                errors,
                ValidationErrorKind::InvalidModuleBlock,
                format!("Elective block '{block}' contains a module assignment"),
            );
        }

        let ids: HashSet<&str> = members.iter().map(|a| a.id.as_str()).collect();
        let mut fixed: HashMap<u32, (usize, usize)> = HashMap::new();
        for pin in input.pins.iter().filter(|p| ids.contains(p.assignment_id.as_str())) {
            let at = (pin.weekday, pin.slot);
            if let Some(prev) = fixed.insert(pin.hour_seq, at) {
                if prev != at {
                    push(
                        errors,
                        ValidationErrorKind::ConflictingPins,
                        format!(
                            "Elective block '{block}' hour {} is pinned to different positions",
                            pin.hour_seq
                        ),
                    );
                }
            }
        }
    }
}

fn check_modules(input: &TimetableInput, groups: &GroupIndex<'_>, errors: &mut Vec<ValidationError>) {
    for a in &input.assignments {
        let Some(len) = a.module_block else { continue };
        let Some(&(shift, level)) = groups.get(a.group_id.as_str()) else {
            continue;
        };
        if level != EducationLevel::Vocational {
            push(
                errors,
                ValidationErrorKind::InvalidModuleBlock,
                format!("Assignment '{}' has a module block but group '{}' is not vocational", a.id, a.group_id),
            );
        }
        if len == 0 || len as usize > input.layout.slots(shift) {
            push(
                errors,
                ValidationErrorKind::InvalidModuleBlock,
                format!("Assignment '{}' has a module run of {len} hour(s), which cannot fit a day", a.id),
            );
        }
    }
}

fn check_avoid_slots(input: &TimetableInput, errors: &mut Vec<ValidationError>) {
    for t in &input.teachers {
        for a in &t.preferences.avoid_slots {
            if a.weekday >= DAYS_PER_WEEK || a.slot >= input.layout.slots(a.shift) {
                push(
                    errors,
                    ValidationErrorKind::AvoidSlotOutOfRange,
                    format!(
                        "Teacher '{}' avoids ({}, {}) outside the {:?} week",
                        t.id, a.weekday, a.slot, a.shift
                    ),
                );
            }
        }
    }
}

fn check_capacity(input: &TimetableInput, groups: &GroupIndex<'_>, errors: &mut Vec<ValidationError>) {
    let mut teacher_load: BTreeMap<(&str, Shift), u32> = BTreeMap::new();
    let mut group_plain: BTreeMap<&str, u32> = BTreeMap::new();
    let mut group_blocks: BTreeMap<(&str, &str), u32> = BTreeMap::new();

    for a in &input.assignments {
        let Some(&(shift, _)) = groups.get(a.group_id.as_str()) else { continue };
        *teacher_load.entry((a.teacher_id.as_str(), shift)).or_default() += a.weekly_hours;
        match &a.elective_block {
            // Parallel electives share the group's slots.
            Some(block) => {
                let hours = group_blocks.entry((a.group_id.as_str(), block.as_str())).or_default();
                *hours = (*hours).max(a.weekly_hours);
            }
            None => *group_plain.entry(a.group_id.as_str()).or_default() += a.weekly_hours,
        }
    }
    for r in &input.reliefs {
        let Some(&(shift, _)) = groups.get(r.group_id.as_str()) else { continue };
        *teacher_load.entry((r.teacher_id.as_str(), shift)).or_default() += r.weekly_hours;
    }

    for ((teacher_id, shift), load) in &teacher_load {
        let capacity = input.layout.weekly_positions(*shift) as u32;
        if *load > capacity {
            push(
                errors,
                ValidationErrorKind::Overloaded,
                format!("Teacher '{teacher_id}' needs {load} {shift:?} hour(s) but the week has {capacity}"),
            );
        }
    }

    let mut group_load = group_plain;
    for ((group_id, _), hours) in group_blocks {
        *group_load.entry(group_id).or_default() += hours;
    }
    for (group_id, load) in &group_load {
        let Some(&(shift, _)) = groups.get(group_id) else { continue };
        let capacity = input.layout.weekly_positions(shift) as u32;
        if *load > capacity {
            push(
                errors,
                ValidationErrorKind::Overloaded,
                format!("Group '{group_id}' needs {load} hour(s) but the week has {capacity}"),
            );
        }
    }
}
