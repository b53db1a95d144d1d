//! The ordered sequence of drawables a surface renders.
//!
//! Drawables live in a generational arena addressed by [`DrawableId`]. Two
//! orderings are kept over it: the *old* ordering, as last rendered, and the
//! *new* ordering, with pending edits applied. Walking "the next drawable in
//! the old ordering" and "the next drawable in the new ordering" side by
//! side is what lets change intervals find the unchanged parts.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::drawable::Drawable;

/// Handle to a drawable in a [`DrawableSequence`].
///
/// A removed drawable's slot may be reused, but with a new generation, so a
/// stale handle never resolves to the wrong drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DrawableId {
    index: u32,
    generation: u32,
}

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}v{}", self.index, self.generation)
    }
}

struct Slot {
    generation: u32,
    drawable: Option<Box<dyn Drawable>>,
}

/// One ordering of drawables with O(1) position lookup.
#[derive(Debug, Default, Clone)]
struct Ordering {
    items: Vec<DrawableId>,
    positions: HashMap<DrawableId, usize>,
}

impl Ordering {
    fn reindex(&mut self) {
        self.positions = self
            .items
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();
    }

    fn position(&self, id: DrawableId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    fn next(&self, id: DrawableId) -> Option<DrawableId> {
        self.position(id)
            .and_then(|position| self.items.get(position + 1).copied())
    }

    fn previous(&self, id: DrawableId) -> Option<DrawableId> {
        self.position(id)
            .and_then(|position| position.checked_sub(1))
            .and_then(|position| self.items.get(position).copied())
    }
}

/// Arena of drawables with a committed (old) and a pending (new) ordering.
#[derive(Default)]
pub struct DrawableSequence {
    slots: Vec<Slot>,
    free: Vec<u32>,
    old: Ordering,
    new: Ordering,
}

impl DrawableSequence {
    /// An empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== arena ==========

    /// Store a drawable. It is not part of either ordering yet.
    pub fn insert(&mut self, drawable: Box<dyn Drawable>) -> DrawableId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.drawable = Some(drawable);
            return DrawableId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            drawable: Some(drawable),
        });
        DrawableId {
            index,
            generation: 0,
        }
    }

    /// Take a drawable out of the arena and the new ordering. The old
    /// ordering keeps the handle until the next commit.
    pub fn remove(&mut self, id: DrawableId) -> Option<Box<dyn Drawable>> {
        let slot = self.slot_mut(id)?;
        let drawable = slot.drawable.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        let _ = self.unlink(id);
        Some(drawable)
    }

    fn slot_mut(&mut self, id: DrawableId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Whether `id` refers to a live drawable.
    #[must_use]
    pub fn contains(&self, id: DrawableId) -> bool {
        self.get(id).is_some()
    }

    /// The drawable behind `id`.
    #[must_use]
    pub fn get(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.drawable.as_deref())
    }

    /// The drawable behind `id`, mutably.
    pub fn get_mut(&mut self, id: DrawableId) -> Option<&mut (dyn Drawable + 'static)> {
        self.slot_mut(id).and_then(|slot| slot.drawable.as_deref_mut())
    }

    /// Number of live drawables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no drawable is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========== new ordering edits ==========

    /// Place `id` right after `previous` in the new ordering, or first when
    /// `previous` is `None`. A drawable already in the ordering is moved.
    pub fn insert_after(&mut self, previous: Option<DrawableId>, id: DrawableId) {
        debug_assert!(self.contains(id), "ordered a drawable that is not stored");
        let _ = self.unlink(id);
        let position = match previous {
            Some(previous) => self.new.position(previous).map_or(self.new.items.len(), |p| p + 1),
            None => 0,
        };
        self.new.items.insert(position, id);
        self.new.reindex();
    }

    /// Append `id` to the new ordering.
    pub fn push_back(&mut self, id: DrawableId) {
        let last = self.new_last();
        self.insert_after(last, id);
    }

    /// Drop `id` from the new ordering. Returns whether it was there.
    pub fn unlink(&mut self, id: DrawableId) -> bool {
        let Some(position) = self.new.position(id) else {
            return false;
        };
        let _ = self.new.items.remove(position);
        self.new.reindex();
        true
    }

    /// Make the new ordering the old one.
    pub fn commit(&mut self) {
        self.old = self.new.clone();
    }

    // ========== traversal ==========

    /// The committed ordering.
    #[must_use]
    pub fn old_order(&self) -> &[DrawableId] {
        &self.old.items
    }

    /// The pending ordering.
    #[must_use]
    pub fn new_order(&self) -> &[DrawableId] {
        &self.new.items
    }

    /// Next drawable in the old ordering.
    #[must_use]
    pub fn old_next(&self, id: DrawableId) -> Option<DrawableId> {
        self.old.next(id)
    }

    /// Previous drawable in the old ordering.
    #[must_use]
    pub fn old_previous(&self, id: DrawableId) -> Option<DrawableId> {
        self.old.previous(id)
    }

    /// Next drawable in the new ordering.
    #[must_use]
    pub fn new_next(&self, id: DrawableId) -> Option<DrawableId> {
        self.new.next(id)
    }

    /// Previous drawable in the new ordering.
    #[must_use]
    pub fn new_previous(&self, id: DrawableId) -> Option<DrawableId> {
        self.new.previous(id)
    }

    /// First drawable of the old ordering.
    #[must_use]
    pub fn old_first(&self) -> Option<DrawableId> {
        self.old.items.first().copied()
    }

    /// Last drawable of the old ordering.
    #[must_use]
    pub fn old_last(&self) -> Option<DrawableId> {
        self.old.items.last().copied()
    }

    /// First drawable of the new ordering.
    #[must_use]
    pub fn new_first(&self) -> Option<DrawableId> {
        self.new.items.first().copied()
    }

    /// Last drawable of the new ordering.
    #[must_use]
    pub fn new_last(&self) -> Option<DrawableId> {
        self.new.items.last().copied()
    }

    /// Whether `id` is part of the new ordering.
    #[must_use]
    pub fn is_ordered(&self, id: DrawableId) -> bool {
        self.new.position(id).is_some()
    }

    /// Index of `id` in the new ordering.
    #[must_use]
    pub fn new_position(&self, id: DrawableId) -> Option<usize> {
        self.new.position(id)
    }

    /// Whether `id` is part of both the old and the new ordering.
    #[must_use]
    pub fn is_in_both_orders(&self, id: DrawableId) -> bool {
        self.old.position(id).is_some() && self.new.position(id).is_some()
    }
}

impl fmt::Debug for DrawableSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawableSequence")
            .field("len", &self.len())
            .field("old", &self.old.items)
            .field("new", &self.new.items)
            .finish_non_exhaustive()
    }
}
