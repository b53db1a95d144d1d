//! Change intervals: contiguous runs of the drawable sequence that differ
//! between the old and the new ordering.
//!
//! An interval is bounded by the drawables just outside the changed run,
//! `drawable_before` and `drawable_after`. A `None` boundary extends the
//! interval to that edge of the list, so a fresh interval with two `None`
//! boundaries means "everything may have changed". A constricted interval
//! that collapsed past both edges is marked `collapsed_empty` instead, which
//! means "nothing changed".
//!
//! Intervals are pooled. A synchronization pass allocates them through
//! [`ChangeIntervalList::new_change_interval`], which registers each one so
//! [`ChangeIntervalList::dispose_all`] returns it to the pool when the pass
//! ends.

use crate::sequence::{DrawableId, DrawableSequence};

/// One changed run of the drawable sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeInterval {
    drawable_before: Option<DrawableId>,
    drawable_after: Option<DrawableId>,
    collapsed_empty: bool,
    next: Option<IntervalId>,
}

impl ChangeInterval {
    /// An interval between two boundaries.
    #[must_use]
    pub const fn new(before: Option<DrawableId>, after: Option<DrawableId>) -> Self {
        Self {
            drawable_before: before,
            drawable_after: after,
            collapsed_empty: false,
            next: None,
        }
    }

    fn reset(&mut self, before: Option<DrawableId>, after: Option<DrawableId>) {
        *self = Self::new(before, after);
    }

    /// Unchanged drawable just before the run, `None` for the list start.
    #[must_use]
    pub const fn drawable_before(&self) -> Option<DrawableId> {
        self.drawable_before
    }

    /// Unchanged drawable just after the run, `None` for the list end.
    #[must_use]
    pub const fn drawable_after(&self) -> Option<DrawableId> {
        self.drawable_after
    }

    /// Whether constriction collapsed the interval past both list edges.
    #[must_use]
    pub const fn collapsed_empty(&self) -> bool {
        self.collapsed_empty
    }

    /// The following interval in the list.
    #[must_use]
    pub const fn next(&self) -> Option<IntervalId> {
        self.next
    }

    /// Whether the interval contains no changed drawable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collapsed_empty
            || (self.drawable_before.is_some() && self.drawable_before == self.drawable_after)
    }

    /// Widen the boundaries to drawables present in both orderings, with
    /// `drawable_before` ahead of `drawable_after` in the new ordering.
    ///
    /// Intervals recorded while the sequence was being edited may name
    /// boundaries that were inserted, moved or removed afterwards; only
    /// after widening is constriction guaranteed to meet `drawable_after`
    /// before running off the end of the list. Returns whether a boundary
    /// changed.
    pub fn widen_to_stable(&mut self, sequence: &DrawableSequence) -> bool {
        if self.collapsed_empty {
            return false;
        }
        let original = (self.drawable_before, self.drawable_after);
        let mut before = stable_at_or_before(sequence, self.drawable_before);
        let mut after = stable_at_or_after(sequence, self.drawable_after);

        if let (Some(b), Some(a)) = (before, after) {
            if sequence.new_position(b) >= sequence.new_position(a) {
                before = stable_at_or_before(sequence, sequence.new_previous(a));
                after = stable_at_or_after(sequence, sequence.new_next(b));
            }
        }

        self.drawable_before = before;
        self.drawable_after = after;
        original != (before, after)
    }

    /// Pull both boundaries inward past drawables whose neighbours agree in
    /// the old and the new ordering. Returns whether a boundary moved.
    ///
    /// Boundaries only ever narrow: a `Some` boundary never becomes `None`
    /// unless the whole interval collapses, which sets `collapsed_empty`.
    pub fn constrict(&mut self, sequence: &DrawableSequence) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut changed = false;

        while let Some(before) = self.drawable_before {
            let next = sequence.new_next(before);
            // Only a boundary present in both orderings can move.
            if !sequence.is_in_both_orders(before) || next != sequence.old_next(before) {
                break;
            }
            self.drawable_before = next;
            changed = true;

            if next.is_none() {
                debug_assert!(
                    self.drawable_after.is_none(),
                    "interval collapsed past its end boundary"
                );
                self.collapsed_empty = true;
            }
            if self.drawable_before == self.drawable_after {
                return changed;
            }
        }

        while let Some(after) = self.drawable_after {
            let previous = sequence.new_previous(after);
            if !sequence.is_in_both_orders(after) || previous != sequence.old_previous(after) {
                break;
            }
            self.drawable_after = previous;
            changed = true;

            if previous.is_none() {
                debug_assert!(
                    self.drawable_before.is_none(),
                    "interval collapsed past its start boundary"
                );
                self.collapsed_empty = true;
            }
            if self.drawable_before == self.drawable_after {
                return changed;
            }
        }

        changed
    }

    /// Count the drawables strictly inside the interval in the old
    /// ordering. A `None` boundary stands for the supplied list edge
    /// (`start` is the first drawable counted, `end` the last).
    #[must_use]
    pub fn old_internal_drawable_count(
        &self,
        sequence: &DrawableSequence,
        start: Option<DrawableId>,
        end: Option<DrawableId>,
    ) -> usize {
        self.internal_count(start, end, |id| sequence.old_next(id))
    }

    /// Count the drawables strictly inside the interval in the new
    /// ordering, with the same boundary rules as
    /// [`ChangeInterval::old_internal_drawable_count`].
    #[must_use]
    pub fn new_internal_drawable_count(
        &self,
        sequence: &DrawableSequence,
        start: Option<DrawableId>,
        end: Option<DrawableId>,
    ) -> usize {
        self.internal_count(start, end, |id| sequence.new_next(id))
    }

    fn internal_count(
        &self,
        start: Option<DrawableId>,
        end: Option<DrawableId>,
        next: impl Fn(DrawableId) -> Option<DrawableId>,
    ) -> usize {
        if self.collapsed_empty {
            return 0;
        }
        let mut current = match self.drawable_before {
            Some(before) => next(before),
            None => start,
        };
        let mut count = 0;
        while let Some(id) = current {
            if Some(id) == self.drawable_after {
                break;
            }
            count += 1;
            if Some(id) == end {
                break;
            }
            current = next(id);
        }
        count
    }

    /// Absorb the interval that follows this one, so the result spans from
    /// this interval's start to the other's end.
    pub fn combine_with(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.drawable_before = other.drawable_before;
            self.collapsed_empty = false;
        }
        self.drawable_after = other.drawable_after;
    }
}

fn stable_at_or_before(sequence: &DrawableSequence, mut id: Option<DrawableId>) -> Option<DrawableId> {
    while let Some(current) = id {
        if sequence.is_in_both_orders(current) {
            break;
        }
        id = sequence.new_previous(current);
    }
    id
}

fn stable_at_or_after(sequence: &DrawableSequence, mut id: Option<DrawableId>) -> Option<DrawableId> {
    while let Some(current) = id {
        if sequence.is_in_both_orders(current) {
            break;
        }
        id = sequence.new_next(current);
    }
    id
}

/// Index of an interval in a [`ChangeIntervalList`], valid until the list
/// is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalId(usize);

/// The singly linked list of change intervals of one synchronization pass,
/// backed by a pool of recycled intervals.
#[derive(Debug, Default)]
pub struct ChangeIntervalList {
    active: Vec<ChangeInterval>,
    head: Option<IntervalId>,
    tail: Option<IntervalId>,
    pool: Vec<ChangeInterval>,
    pool_capacity: usize,
}

impl ChangeIntervalList {
    /// An empty list keeping at most `pool_capacity` recycled intervals.
    #[must_use]
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            pool_capacity,
            ..Self::default()
        }
    }

    /// Allocate an interval from the pool and append it to the list. It is
    /// returned to the pool by the next [`ChangeIntervalList::dispose_all`].
    pub fn new_change_interval(
        &mut self,
        before: Option<DrawableId>,
        after: Option<DrawableId>,
    ) -> IntervalId {
        let mut interval = self.pool.pop().unwrap_or_default();
        interval.reset(before, after);

        let id = IntervalId(self.active.len());
        self.active.push(interval);
        if let Some(tail) = self.tail {
            self.active[tail.0].next = Some(id);
        } else {
            self.head = Some(id);
        }
        self.tail = Some(id);
        id
    }

    /// First interval of the list.
    #[must_use]
    pub const fn head(&self) -> Option<IntervalId> {
        self.head
    }

    /// The interval behind `id`.
    #[must_use]
    pub fn get(&self, id: IntervalId) -> Option<&ChangeInterval> {
        self.active.get(id.0)
    }

    /// Number of intervals linked from the head.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the list has no intervals.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of intervals waiting in the pool.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    /// Walk the list from the head.
    pub fn iter(&self) -> impl Iterator<Item = (IntervalId, &ChangeInterval)> {
        std::iter::successors(
            self.head.and_then(|id| self.get(id).map(|interval| (id, interval))),
            |(_, interval)| {
                interval
                    .next
                    .and_then(|id| self.get(id).map(|interval| (id, interval)))
            },
        )
    }

    /// Widen every interval to stable boundaries. Returns how many changed.
    pub fn widen_all(&mut self, sequence: &DrawableSequence) -> usize {
        let mut widened = 0;
        let mut current = self.head;
        while let Some(id) = current {
            let interval = &mut self.active[id.0];
            if interval.widen_to_stable(sequence) {
                widened += 1;
            }
            current = interval.next;
        }
        widened
    }

    /// Constrict every interval. Returns how many moved.
    pub fn constrict_all(&mut self, sequence: &DrawableSequence) -> usize {
        let mut moved = 0;
        let mut current = self.head;
        while let Some(id) = current {
            let interval = &mut self.active[id.0];
            if interval.constrict(sequence) {
                moved += 1;
            }
            current = interval.next;
        }
        moved
    }

    /// Merge `id` with its successor, unlinking the successor. Returns
    /// whether there was a successor.
    pub fn combine_with_next(&mut self, id: IntervalId) -> bool {
        let Some(next_id) = self.active.get(id.0).and_then(|interval| interval.next) else {
            return false;
        };
        let next = self.active[next_id.0].clone();
        let interval = &mut self.active[id.0];
        interval.combine_with(&next);
        interval.next = next.next;
        if self.tail == Some(next_id) {
            self.tail = Some(id);
        }
        true
    }

    /// Merge neighbouring intervals that share a boundary drawable. Returns
    /// the number of merges.
    pub fn combine_adjacent(&mut self) -> usize {
        let mut merged = 0;
        let mut current = self.head;
        while let Some(id) = current {
            let interval = &self.active[id.0];
            let touches = interval.next.is_some_and(|next| {
                let next = &self.active[next.0];
                !interval.is_empty()
                    && !next.is_empty()
                    && interval.drawable_after.is_some()
                    && interval.drawable_after == next.drawable_before
            });
            if touches && self.combine_with_next(id) {
                merged += 1;
            } else {
                current = self.active[id.0].next;
            }
        }
        merged
    }

    /// Return every interval to the pool, up to its capacity, and clear the
    /// list. Returns the number disposed.
    pub fn dispose_all(&mut self) -> usize {
        let disposed = self.active.len();
        for mut interval in self.active.drain(..) {
            if self.pool.len() >= self.pool_capacity {
                break;
            }
            interval.reset(None, None);
            self.pool.push(interval);
        }
        self.head = None;
        self.tail = None;
        disposed
    }
}
