//! Restriction pool model.
//!
//! A restriction pool holds the (day, slot) positions a session may still
//! be placed at. Positions are split into two disjoint buckets:
//!
//! - **Unavoidable**: preferred positions, drawn first.
//! - **Avoidable**: legal but discouraged positions (teacher dislikes,
//!   first/last period opt-outs), drawn only once the preferred bucket
//!   is empty.
//!
//! # Day Axis
//!
//! Several weekly columns share one flat day axis. A column at index `c`
//! owns days `[5c, 5c + 5)`, so `day % 5` is always the weekday and
//! `day / 5` the column.
//!
//! # Lifecycle
//! A pool is built once per column, cloned into every session of that
//! column, narrowed by preferences and pins, and cloned again per search
//! worker. Drawing consumes positions irreversibly.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Number of teaching days in a week.
pub const DAYS_PER_WEEK: usize = 5;

/// Returned by [`RestrictionPool::draw`] when no position remains.
///
/// This is the expected failure of a candidate build: the worker drops the
/// partial timetable and the next round retries with fresh pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no placement option left in restriction pool")]
pub struct SlotExhausted;

/// One placement option: a day on the flat axis and a slot within that day.
///
/// Identity is `(day, slot)`; the `teacher_disliked` flag is bookkeeping and
/// does not take part in equality or hashing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RestrictionItem {
    /// Day on the flat axis (column offset + weekday).
    pub day: usize,
    /// Slot within the day (0-indexed).
    pub slot: usize,
    /// Set when a teacher avoid-slot preference matched this position.
    pub teacher_disliked: bool,
}

impl RestrictionItem {
    /// Creates an item with the dislike flag cleared.
    pub fn new(day: usize, slot: usize) -> Self {
        Self {
            day,
            slot,
            teacher_disliked: false,
        }
    }

    /// Weekday (0 = first teaching day).
    #[inline]
    pub fn weekday(&self) -> usize {
        self.day % DAYS_PER_WEEK
    }

    /// Column this day belongs to.
    #[inline]
    pub fn column(&self) -> usize {
        self.day / DAYS_PER_WEEK
    }

    #[inline]
    fn is_at(&self, day: usize, slot: usize) -> bool {
        self.day == day && self.slot == slot
    }
}

impl PartialEq for RestrictionItem {
    fn eq(&self, other: &Self) -> bool {
        self.day == other.day && self.slot == other.slot
    }
}

impl Eq for RestrictionItem {}

impl Hash for RestrictionItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.day.hash(state);
        self.slot.hash(state);
    }
}

/// A narrowing rule applicable to a pool.
///
/// Soft rules (`ExcludeFirstPeriod`, `ExcludeLastPeriod`, `ExcludeDislikes`)
/// only migrate positions from unavoidable to avoidable. Hard rules
/// (`ForceTo`, `Remove`) delete positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrowing {
    /// Discourage slot 0 on every day.
    ExcludeFirstPeriod,
    /// Discourage the last slot on every day.
    ExcludeLastPeriod,
    /// Discourage the listed `(weekday, slot)` positions.
    ExcludeDislikes(Vec<(usize, usize)>),
    /// Keep only the given `(day, slot)`, if still present.
    ForceTo { day: usize, slot: usize },
    /// Delete the given `(day, slot)`.
    Remove { day: usize, slot: usize },
}

/// Remaining placement options for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionPool {
    unavoidable: Vec<RestrictionItem>,
    avoidable: Vec<RestrictionItem>,
    slots_per_day: usize,
}

impl RestrictionPool {
    /// Builds the full day/slot universe of one weekly column.
    ///
    /// Days run from `column_offset` to `column_offset + 5`; every position
    /// starts in the unavoidable bucket.
    pub fn for_column(column_offset: usize, slots_per_day: usize) -> Self {
        let mut unavoidable = Vec::with_capacity(DAYS_PER_WEEK * slots_per_day);
        for day in column_offset..column_offset + DAYS_PER_WEEK {
            for slot in 0..slots_per_day {
                unavoidable.push(RestrictionItem::new(day, slot));
            }
        }
        Self {
            unavoidable,
            avoidable: Vec::new(),
            slots_per_day,
        }
    }

    /// Creates an empty pool.
    pub fn empty(slots_per_day: usize) -> Self {
        Self {
            unavoidable: Vec::new(),
            avoidable: Vec::new(),
            slots_per_day,
        }
    }

    /// Slots per day this pool was built with.
    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    /// Number of preferred positions.
    pub fn unavoidable_len(&self) -> usize {
        self.unavoidable.len()
    }

    /// Number of discouraged positions.
    pub fn avoidable_len(&self) -> usize {
        self.avoidable.len()
    }

    /// Total remaining positions.
    pub fn len(&self) -> usize {
        self.unavoidable.len() + self.avoidable.len()
    }

    /// Whether no position remains.
    pub fn is_empty(&self) -> bool {
        self.unavoidable.is_empty() && self.avoidable.is_empty()
    }

    /// Preferred positions.
    pub fn unavoidable(&self) -> &[RestrictionItem] {
        &self.unavoidable
    }

    /// Discouraged positions.
    pub fn avoidable(&self) -> &[RestrictionItem] {
        &self.avoidable
    }

    /// Whether `(day, slot)` is still available in either bucket.
    pub fn contains(&self, day: usize, slot: usize) -> bool {
        self.find(day, slot).is_some()
    }

    /// Looks up `(day, slot)` in either bucket.
    pub fn find(&self, day: usize, slot: usize) -> Option<&RestrictionItem> {
        self.unavoidable
            .iter()
            .chain(self.avoidable.iter())
            .find(|item| item.is_at(day, slot))
    }

    /// Moves slot 0 of every day to the avoidable bucket.
    pub fn exclude_first_period(&mut self) {
        self.migrate(|item| item.slot == 0, false);
    }

    /// Moves the last slot of every day to the avoidable bucket.
    pub fn exclude_last_period(&mut self) {
        if self.slots_per_day == 0 {
            return;
        }
        let last = self.slots_per_day - 1;
        self.migrate(|item| item.slot == last, false);
    }

    /// Moves positions matching a teacher's `(weekday, slot)` dislikes to
    /// the avoidable bucket and flags them.
    ///
    /// Already-avoidable positions that match are flagged as well.
    pub fn exclude_teacher_dislikes(&mut self, dislikes: &[(usize, usize)]) {
        let matches =
            |item: &RestrictionItem| dislikes.contains(&(item.weekday(), item.slot));
        self.migrate(matches, true);
        for item in self.avoidable.iter_mut() {
            if matches(item) {
                item.teacher_disliked = true;
            }
        }
    }

    /// Collapses the pool to the single position `(day, slot)`.
    ///
    /// The position keeps the bucket (and flag) it was in. If it was
    /// already consumed or removed, the pool ends up empty.
    pub fn force_to(&mut self, day: usize, slot: usize) {
        self.unavoidable.retain(|item| item.is_at(day, slot));
        self.avoidable.retain(|item| item.is_at(day, slot));
    }

    /// Deletes `(day, slot)`. Returns whether it was present.
    pub fn remove(&mut self, day: usize, slot: usize) -> bool {
        if let Some(pos) = self.unavoidable.iter().position(|i| i.is_at(day, slot)) {
            self.unavoidable.remove(pos);
            return true;
        }
        if let Some(pos) = self.avoidable.iter().position(|i| i.is_at(day, slot)) {
            self.avoidable.remove(pos);
            return true;
        }
        false
    }

    /// Applies a narrowing rule in place.
    pub fn apply(&mut self, rule: &Narrowing) {
        match rule {
            Narrowing::ExcludeFirstPeriod => self.exclude_first_period(),
            Narrowing::ExcludeLastPeriod => self.exclude_last_period(),
            Narrowing::ExcludeDislikes(dislikes) => self.exclude_teacher_dislikes(dislikes),
            Narrowing::ForceTo { day, slot } => self.force_to(*day, *slot),
            Narrowing::Remove { day, slot } => {
                self.remove(*day, *slot);
            }
        }
    }

    /// Returns a derived pool with `rule` applied, leaving `self` untouched.
    pub fn narrowed(&self, rule: &Narrowing) -> Self {
        let mut derived = self.clone();
        derived.apply(rule);
        derived
    }

    /// Draws one position uniformly at random and removes it.
    ///
    /// Draws from the unavoidable bucket while it is non-empty, otherwise
    /// from the avoidable bucket.
    ///
    /// # Errors
    /// [`SlotExhausted`] when both buckets are empty.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Result<RestrictionItem, SlotExhausted> {
        let bucket = if !self.unavoidable.is_empty() {
            &mut self.unavoidable
        } else if !self.avoidable.is_empty() {
            &mut self.avoidable
        } else {
            return Err(SlotExhausted);
        };
        let idx = rng.random_range(0..bucket.len());
        Ok(bucket.swap_remove(idx))
    }

    fn migrate<F>(&mut self, matches: F, flag: bool)
    where
        F: Fn(&RestrictionItem) -> bool,
    {
        let mut kept = Vec::with_capacity(self.unavoidable.len());
        for mut item in self.unavoidable.drain(..) {
            if matches(&item) {
                item.teacher_disliked |= flag;
                self.avoidable.push(item);
            } else {
                kept.push(item);
            }
        }
        self.unavoidable = kept;
    }
}
