//! Randomized candidate builder.
//!
//! # Algorithm
//!
//! 1. Clone every session of the plan (pools included).
//! 2. Order them: pinned sessions first, then the rest in plan order.
//! 3. For each session, narrow its pool onto the coupling target if a
//!    coupled session was already placed, then draw positions until one
//!    fits:
//!    - the teacher is free at that weekday and slot in the shift;
//!    - for teaching sessions, the cell holds no other teaching session
//!      unless both belong to the same elective hour.
//! 4. An exhausted pool aborts the whole build.
//!
//! Relief sessions block only their teacher, never the group column.

use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::trace;

use super::coupling::CouplingIndex;
use crate::factory::SessionPlan;
use crate::models::{
    CouplingKey, RestrictionItem, ScheduleMatrix, Session, Shift, SlotExhausted,
};

type TeacherBusy = HashMap<String, HashSet<(Shift, usize, usize)>>;

/// Builds one candidate matrix from a session plan.
pub struct SearchWorker<'p, R: Rng> {
    id: usize,
    plan: &'p SessionPlan,
    rng: R,
}

impl<'p, R: Rng> SearchWorker<'p, R> {
    /// Creates a worker over a shared plan template.
    pub fn new(id: usize, plan: &'p SessionPlan, rng: R) -> Self {
        Self { id, plan, rng }
    }

    /// Runs one build.
    ///
    /// # Errors
    /// [`SlotExhausted`] if any session runs out of positions. The partial
    /// matrix is dropped.
    pub fn build(mut self) -> Result<ScheduleMatrix, SlotExhausted> {
        let layout = self.plan.layout;
        let mut matrix = ScheduleMatrix::new(
            self.plan.morning.len(),
            layout.morning_slots,
            self.plan.afternoon.len(),
            layout.afternoon_slots,
        );
        let mut busy = TeacherBusy::new();
        let mut coupling = CouplingIndex::new();

        let (pinned, free): (Vec<Session>, Vec<Session>) =
            self.plan.sessions().cloned().partition(|s| s.pinned);

        for mut session in pinned.into_iter().chain(free) {
            if let Some((day, slot)) = coupling.target_for(&session) {
                session.pool.force_to(day, slot);
            }
            let item = match self.place_one(&matrix, &busy, &mut session) {
                Ok(item) => item,
                Err(e) => {
                    trace!(
                        worker = self.id,
                        teacher = %session.teacher_id,
                        group = %session.group_id,
                        hour = session.hour_seq,
                        placed = matrix.placed_count(),
                        "Pool exhausted"
                    );
                    return Err(e);
                }
            };

            busy.entry(session.teacher_id.clone()).or_default().insert((
                session.shift,
                item.weekday(),
                item.slot,
            ));
            coupling.record(&session, item);
            let shift = session.shift;
            matrix
                .grid_mut(shift)
                .place(item.day, item.slot, session)
                .map_err(|_| SlotExhausted)?;
        }

        trace!(worker = self.id, placed = matrix.placed_count(), "Candidate built");
        Ok(matrix)
    }

    /// Draws from the session's pool until a position fits.
    fn place_one(
        &mut self,
        matrix: &ScheduleMatrix,
        busy: &TeacherBusy,
        session: &mut Session,
    ) -> Result<RestrictionItem, SlotExhausted> {
        loop {
            let item = session.pool.draw(&mut self.rng)?;
            if fits(matrix, busy, session, item) {
                return Ok(item);
            }
        }
    }
}

/// Whether `session` may go to `item` given the placements so far.
fn fits(matrix: &ScheduleMatrix, busy: &TeacherBusy, session: &Session, item: RestrictionItem) -> bool {
    let teacher_busy = busy
        .get(&session.teacher_id)
        .is_some_and(|slots| slots.contains(&(session.shift, item.weekday(), item.slot)));
    if teacher_busy {
        return false;
    }
    if session.is_relief() {
        return true;
    }
    let key = session.coupling_key();
    matrix
        .grid(session.shift)
        .cell(item.day, item.slot)
        .iter()
        .filter(|occupant| occupant.is_teaching())
        .all(|occupant| is_elective_sibling(key.as_ref(), occupant))
}

fn is_elective_sibling(key: Option<&CouplingKey>, occupant: &Session) -> bool {
    match (key, occupant.coupling_key()) {
        (Some(a), Some(b)) => matches!(a, CouplingKey::Elective { .. }) && *a == b,
        _ => false,
    }
}
