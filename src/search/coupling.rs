//! Placement coupling between sessions.
//!
//! Two kinds of sessions must not be placed independently:
//!
//! - **Elective blocks**: hour `h` of every assignment in a block runs in
//!   parallel, so all of them share one weekday and slot, each in its
//!   own group column.
//! - **Vocational modules**: a run of `len` hours is taught back to back
//!   on one day, so hour `k + 1` sits directly after hour `k`.
//!
//! The index remembers where the last member of each coupling was placed
//! and tells the worker where the next member has to go.

use std::collections::HashMap;

use crate::models::{CouplingKey, RestrictionItem, Session, Shift, DAYS_PER_WEEK};

/// Last placement of a coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Shift the anchor was placed in.
    pub shift: Shift,
    /// Weekday of the anchor.
    pub weekday: usize,
    /// Slot of the anchor.
    pub slot: usize,
}

/// Anchors of the couplings placed so far in one candidate build.
#[derive(Debug, Clone, Default)]
pub struct CouplingIndex {
    anchors: HashMap<CouplingKey, Anchor>,
}

impl CouplingIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forced `(day, slot)` for a session, if a coupled session was placed.
    ///
    /// The day is translated onto the session's own column.
    pub fn target_for(&self, session: &Session) -> Option<(usize, usize)> {
        let key = session.coupling_key()?;
        let anchor = self.anchors.get(&key)?;
        let day = session.column * DAYS_PER_WEEK + anchor.weekday;
        match key {
            CouplingKey::Elective { .. } => Some((day, anchor.slot)),
            CouplingKey::Module { .. } => Some((day, anchor.slot + 1)),
        }
    }

    /// Records where a session landed.
    pub fn record(&mut self, session: &Session, item: RestrictionItem) {
        if let Some(key) = session.coupling_key() {
            self.anchors.insert(
                key,
                Anchor {
                    shift: session.shift,
                    weekday: item.weekday(),
                    slot: item.slot,
                },
            );
        }
    }

    /// Anchor of a coupling.
    pub fn anchor(&self, key: &CouplingKey) -> Option<Anchor> {
        self.anchors.get(key).copied()
    }

    /// Number of couplings with an anchor.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no coupling has been anchored yet.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EducationLevel, RestrictionPool};

    fn session(column: usize, hour_seq: u32) -> Session {
        Session::teaching(
            format!("A{column}"),
            format!("T{column}"),
            "SUBJ",
            format!("G{column}"),
            Shift::Morning,
            EducationLevel::Vocational,
            hour_seq,
            RestrictionPool::for_column(column * DAYS_PER_WEEK, 6),
        )
    }

    #[test]
    fn test_uncoupled_session_is_free() {
        let mut index = CouplingIndex::new();
        let s = session(0, 0);
        index.record(&s, RestrictionItem::new(2, 3));
        assert!(index.is_empty());
        assert_eq!(index.target_for(&s), None);
    }

    #[test]
    fn test_elective_sibling_follows_anchor() {
        let mut index = CouplingIndex::new();
        let first = session(0, 1).with_elective_block(Some("B".into()));
        let sibling = session(2, 1).with_elective_block(Some("B".into()));
        let other_hour = session(2, 0).with_elective_block(Some("B".into()));

        assert_eq!(index.target_for(&sibling), None);
        index.record(&first, RestrictionItem::new(3, 4));
        assert_eq!(index.target_for(&sibling), Some((13, 4)));
        assert_eq!(index.target_for(&other_hour), None);
    }

    #[test]
    fn test_module_hour_follows_previous() {
        let mut index = CouplingIndex::new();
        let h0 = session(1, 0).with_module_block(Some(2));
        let h1 = session(1, 1).with_module_block(Some(2));
        let h2 = session(1, 2).with_module_block(Some(2));

        index.record(&h0, RestrictionItem::new(7, 2));
        assert_eq!(index.target_for(&h1), Some((7, 3)));
        assert_eq!(index.target_for(&h2), None);
        assert_eq!(
            index.anchor(&h0.coupling_key().unwrap()),
            Some(Anchor {
                shift: Shift::Morning,
                weekday: 2,
                slot: 2
            })
        );
    }
}
