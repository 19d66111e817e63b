//! Schedule matrix (candidate timetable) model.
//!
//! A matrix holds two grids, one per shift. Each grid is indexed by
//! `(day, slot)` on the flat day axis: day `5c + w` is weekday `w` of
//! column `c`. A cell holds the sessions placed there, normally one;
//! several only for parallel elective hours or relief hours sharing a
//! group's column.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::{Session, Shift, DAYS_PER_WEEK};

/// Sessions occupying one `(day, slot)` of a grid.
pub type Cell = Vec<Session>;

/// One shift's grid of cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    columns: usize,
    slots_per_day: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an empty grid for `columns` groups.
    pub fn new(columns: usize, slots_per_day: usize) -> Self {
        let days = columns * DAYS_PER_WEEK;
        Self {
            columns,
            slots_per_day,
            cells: vec![Vec::new(); days * slots_per_day],
        }
    }

    /// Number of group columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of days on the flat axis (`columns × 5`).
    pub fn days(&self) -> usize {
        self.columns * DAYS_PER_WEEK
    }

    /// Slots per day.
    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    #[inline]
    fn index(&self, day: usize, slot: usize) -> Option<usize> {
        (day < self.days() && slot < self.slots_per_day).then(|| day * self.slots_per_day + slot)
    }

    /// Sessions at `(day, slot)`. Empty for out-of-range positions.
    pub fn cell(&self, day: usize, slot: usize) -> &[Session] {
        match self.index(day, slot) {
            Some(i) => &self.cells[i],
            None => &[],
        }
    }

    /// Appends a session to `(day, slot)`.
    ///
    /// Returns the session back if the position is outside the grid.
    pub fn place(&mut self, day: usize, slot: usize, session: Session) -> Result<(), Session> {
        match self.index(day, slot) {
            Some(i) => {
                self.cells[i].push(session);
                Ok(())
            }
            None => Err(session),
        }
    }

    /// Iterates `(day, slot, session)` over every placed session.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Session)> + '_ {
        let spd = self.slots_per_day.max(1);
        self.cells.iter().enumerate().flat_map(move |(i, cell)| {
            let (day, slot) = (i / spd, i % spd);
            cell.iter().map(move |s| (day, slot, s))
        })
    }

    /// Number of placed sessions.
    pub fn placed_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

/// Occupied slots of one teacher, per weekday, sorted and deduplicated.
pub type DayProfile = [Vec<usize>; DAYS_PER_WEEK];

/// A complete candidate timetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleMatrix {
    /// Morning grid.
    pub morning: Grid,
    /// Afternoon grid.
    pub afternoon: Grid,
}

/// A placed session with its position, for output and queries.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    /// Shift grid.
    pub shift: Shift,
    /// Column within the shift.
    pub column: usize,
    /// Weekday.
    pub weekday: usize,
    /// Slot within the day.
    pub slot: usize,
    /// The session.
    pub session: &'a Session,
}

impl ScheduleMatrix {
    /// Creates an empty matrix.
    pub fn new(
        morning_columns: usize,
        morning_slots: usize,
        afternoon_columns: usize,
        afternoon_slots: usize,
    ) -> Self {
        Self {
            morning: Grid::new(morning_columns, morning_slots),
            afternoon: Grid::new(afternoon_columns, afternoon_slots),
        }
    }

    /// Grid of a shift.
    pub fn grid(&self, shift: Shift) -> &Grid {
        match shift {
            Shift::Morning => &self.morning,
            Shift::Afternoon => &self.afternoon,
        }
    }

    /// Mutable grid of a shift.
    pub fn grid_mut(&mut self, shift: Shift) -> &mut Grid {
        match shift {
            Shift::Morning => &mut self.morning,
            Shift::Afternoon => &mut self.afternoon,
        }
    }

    /// Iterates every placed session across both shifts.
    pub fn placements(&self) -> impl Iterator<Item = Placement<'_>> + '_ {
        Shift::ALL.into_iter().flat_map(move |shift| {
            self.grid(shift).iter().map(move |(day, slot, session)| Placement {
                shift,
                column: day / DAYS_PER_WEEK,
                weekday: day % DAYS_PER_WEEK,
                slot,
                session,
            })
        })
    }

    /// Number of placed sessions across both shifts.
    pub fn placed_count(&self) -> usize {
        self.morning.placed_count() + self.afternoon.placed_count()
    }

    /// All placements of a teacher.
    pub fn sessions_for_teacher(&self, teacher_id: &str) -> Vec<Placement<'_>> {
        self.placements()
            .filter(|p| p.session.teacher_id == teacher_id)
            .collect()
    }

    /// All placements in a group's column.
    pub fn sessions_for_group(&self, group_id: &str) -> Vec<Placement<'_>> {
        self.placements()
            .filter(|p| p.session.group_id == group_id)
            .collect()
    }

    /// Number of placed hours per source assignment/allotment ID.
    pub fn hours_by_source(&self) -> HashMap<String, u32> {
        let mut hours = HashMap::new();
        for p in self.placements() {
            *hours.entry(p.session.source_id().to_string()).or_insert(0) += 1;
        }
        hours
    }

    /// Per-teacher occupied slots by weekday within one shift.
    ///
    /// Ordered by teacher ID so that downstream scoring is deterministic.
    pub fn teacher_profiles(&self, shift: Shift) -> BTreeMap<String, DayProfile> {
        let mut profiles: BTreeMap<String, DayProfile> = BTreeMap::new();
        for (day, slot, session) in self.grid(shift).iter() {
            let profile = profiles.entry(session.teacher_id.clone()).or_default();
            profile[day % DAYS_PER_WEEK].push(slot);
        }
        for profile in profiles.values_mut() {
            for slots in profile.iter_mut() {
                slots.sort_unstable();
                slots.dedup();
            }
        }
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EducationLevel, RestrictionPool};

    fn session(teacher: &str, group: &str, source: &str, column: usize) -> Session {
        Session::teaching(
            source,
            teacher,
            "SUBJ",
            group,
            Shift::Morning,
            EducationLevel::Secondary,
            0,
            RestrictionPool::empty(6),
        )
        .with_column(column)
    }

    fn sample_matrix() -> ScheduleMatrix {
        let mut m = ScheduleMatrix::new(2, 6, 1, 4);
        m.morning.place(0, 0, session("T1", "G1", "A1", 0)).unwrap();
        m.morning.place(0, 3, session("T1", "G1", "A1", 0)).unwrap();
        m.morning.place(6, 1, session("T2", "G2", "A2", 1)).unwrap();
        m.afternoon.place(2, 2, session("T1", "G3", "A3", 0)).unwrap();
        m
    }

    #[test]
    fn test_grid_dimensions() {
        let g = Grid::new(3, 6);
        assert_eq!(g.days(), 15);
        assert_eq!(g.slots_per_day(), 6);
        assert_eq!(g.placed_count(), 0);
        assert!(g.cell(14, 5).is_empty());
    }

    #[test]
    fn test_place_out_of_range() {
        let mut g = Grid::new(1, 6);
        assert!(g.place(5, 0, session("T1", "G1", "A1", 0)).is_err());
        assert!(g.place(0, 6, session("T1", "G1", "A1", 0)).is_err());
        assert!(g.place(4, 5, session("T1", "G1", "A1", 0)).is_ok());
    }

    #[test]
    fn test_placements_and_counts() {
        let m = sample_matrix();
        assert_eq!(m.placed_count(), 4);
        assert_eq!(m.sessions_for_teacher("T1").len(), 3);
        assert_eq!(m.sessions_for_group("G2").len(), 1);

        let p = m.sessions_for_group("G2")[0];
        assert_eq!((p.column, p.weekday, p.slot), (1, 1, 1));
        assert_eq!(m.hours_by_source()["A1"], 2);
    }

    #[test]
    fn test_teacher_profiles() {
        let m = sample_matrix();
        let morning = m.teacher_profiles(Shift::Morning);
        assert_eq!(morning["T1"][0], vec![0, 3]);
        assert_eq!(morning["T2"][1], vec![1]);
        let afternoon = m.teacher_profiles(Shift::Afternoon);
        assert_eq!(afternoon.len(), 1);
        assert_eq!(afternoon["T1"][2], vec![2]);
    }

    #[test]
    fn test_cells_allow_multiple_sessions() {
        let mut g = Grid::new(1, 6);
        g.place(1, 1, session("T1", "G1", "A1", 0)).unwrap();
        g.place(1, 1, session("T2", "G1", "A2", 0)).unwrap();
        assert_eq!(g.cell(1, 1).len(), 2);
    }
}
