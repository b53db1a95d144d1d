//! Render surfaces and the synchronization pass.
//!
//! A [`RenderSurface`] owns the drawable sequence of one output region and
//! the block its drawables render into. Edits to the sequence record change
//! intervals; [`RenderSurface::sync`] then brings the output tree up to date:
//!
//! 1. widen every interval to stable boundaries, constrict it, and merge
//!    neighbours sharing a boundary
//! 2. relink the output elements inside each non-empty interval
//! 3. update dirty drawables
//! 4. flush gradients whose stops changed
//! 5. commit the new ordering and return the intervals to their pool

use serde::Serialize;
use vellum_common::PipelineConfig;
use vellum_dom::{ElementId, SharedDocument, SvgDocument};
use vellum_paint::{SharedBlock, SvgBlock};

use crate::change_interval::ChangeIntervalList;
use crate::drawable::Drawable;
use crate::sequence::{DrawableId, DrawableSequence};

/// What one synchronization pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncReport {
    /// Pass number, starting at 1.
    pub pass: u64,
    /// Intervals recorded since the previous pass.
    pub intervals: usize,
    /// Intervals whose boundaries moved during constriction.
    pub constricted: usize,
    /// Intervals merged into their predecessor.
    pub combined: usize,
    /// Intervals found empty after constriction.
    pub empty_intervals: usize,
    /// Drawables inside changed intervals in the old ordering.
    pub old_internal_drawables: usize,
    /// Drawables inside changed intervals in the new ordering.
    pub new_internal_drawables: usize,
    /// Output elements moved in the tree.
    pub relinked: usize,
    /// Drawables that had pending changes.
    pub drawables_updated: usize,
    /// Gradient stops rewritten.
    pub stops_updated: usize,
    /// Attribute writes performed by the pass.
    pub attribute_writes: usize,
}

/// One output region: a drawable sequence rendered into a block.
#[derive(Debug)]
pub struct RenderSurface {
    document: SharedDocument,
    config: PipelineConfig,
    block: SharedBlock,
    sequence: DrawableSequence,
    intervals: ChangeIntervalList,
    passes: u64,
}

impl RenderSurface {
    /// Create a surface whose block group is appended to the document root.
    #[must_use]
    pub fn new(document: SharedDocument, config: PipelineConfig) -> Self {
        let block = SvgBlock::shared(document.clone(), &config);
        {
            let mut doc = document.borrow_mut();
            doc.set_journaling(config.journal_mutations);
            let root = doc.root();
            doc.append_child(root, block.borrow().group());
        }
        Self {
            intervals: ChangeIntervalList::new(config.interval_pool_capacity),
            document,
            config,
            block,
            sequence: DrawableSequence::new(),
            passes: 0,
        }
    }

    /// The output document.
    #[must_use]
    pub const fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// The configuration the surface was created with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The block drawables render into.
    #[must_use]
    pub const fn block(&self) -> &SharedBlock {
        &self.block
    }

    /// The drawable sequence.
    #[must_use]
    pub const fn sequence(&self) -> &DrawableSequence {
        &self.sequence
    }

    /// Change intervals recorded since the last pass.
    #[must_use]
    pub const fn intervals(&self) -> &ChangeIntervalList {
        &self.intervals
    }

    /// The drawable behind `id`.
    #[must_use]
    pub fn drawable(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.sequence.get(id)
    }

    // ========== edits ==========

    /// Insert `drawable` right after `previous` (first when `None`) and bind
    /// it to this surface's block.
    pub fn insert_drawable(
        &mut self,
        previous: Option<DrawableId>,
        drawable: impl Drawable + 'static,
    ) -> DrawableId {
        let mut drawable: Box<dyn Drawable> = Box::new(drawable);
        drawable.update_svg_block(Some(self.block.clone()));
        let id = self.sequence.insert(drawable);

        let after = match previous {
            Some(previous) => self.sequence.new_next(previous),
            None => self.sequence.new_first(),
        };
        self.sequence.insert_after(previous, id);
        let _ = self.intervals.new_change_interval(previous, after);
        id
    }

    /// Append `drawable` to the end of the sequence.
    pub fn push_drawable(&mut self, drawable: impl Drawable + 'static) -> DrawableId {
        let last = self.sequence.new_last();
        self.insert_drawable(last, drawable)
    }

    /// Move `id` right after `previous` (first when `None`).
    pub fn move_drawable(&mut self, id: DrawableId, previous: Option<DrawableId>) {
        if previous == Some(id) || !self.sequence.is_ordered(id) {
            return;
        }
        let (before, after) = (self.sequence.new_previous(id), self.sequence.new_next(id));
        let _ = self.intervals.new_change_interval(before, after);

        let _ = self.sequence.unlink(id);
        let after = match previous {
            Some(previous) => self.sequence.new_next(previous),
            None => self.sequence.new_first(),
        };
        self.sequence.insert_after(previous, id);
        let _ = self.intervals.new_change_interval(previous, after);
    }

    /// Remove and dispose the drawable behind `id`. Returns whether it
    /// existed.
    pub fn remove_drawable(&mut self, id: DrawableId) -> bool {
        if !self.sequence.contains(id) {
            return false;
        }
        if self.sequence.is_ordered(id) {
            let (before, after) = (self.sequence.new_previous(id), self.sequence.new_next(id));
            let _ = self.intervals.new_change_interval(before, after);
        }
        match self.sequence.remove(id) {
            Some(mut drawable) => {
                drawable.dispose();
                true
            }
            None => false,
        }
    }

    /// Move every drawable into a fresh block and dispose the old one.
    /// Paint references migrate with the drawables, so the old block is
    /// empty by the time it is torn down.
    pub fn replace_block(&mut self) -> SharedBlock {
        let block = SvgBlock::shared(self.document.clone(), &self.config);
        let (old_group, new_group) = (self.block.borrow().group(), block.borrow().group());
        {
            let mut doc = self.document.borrow_mut();
            let parent = doc.parent(old_group).unwrap_or_else(|| doc.root());
            doc.insert_before(parent, new_group, Some(old_group));
        }

        let ordered = self.sequence.new_order().to_vec();
        for id in ordered {
            let Some(drawable) = self.sequence.get_mut(id) else {
                continue;
            };
            drawable.update_svg_block(Some(block.clone()));
            let element = drawable.element();
            self.document.borrow_mut().append_child(new_group, element);
        }

        let old = std::mem::replace(&mut self.block, block.clone());
        old.borrow_mut().dispose();
        tracing::debug!(
            old = old.borrow().id().0,
            new = block.borrow().id().0,
            "replaced surface block"
        );
        block
    }

    // ========== synchronization ==========

    /// Run one synchronization pass.
    pub fn sync(&mut self) -> SyncReport {
        self.passes += 1;
        let writes_before = self.document.borrow().attribute_writes();
        let mut report = SyncReport {
            pass: self.passes,
            intervals: self.intervals.len(),
            ..SyncReport::default()
        };

        let _ = self.intervals.widen_all(&self.sequence);
        report.constricted = self.intervals.constrict_all(&self.sequence);
        report.combined = self.intervals.combine_adjacent();

        let mut changed: Vec<(Option<DrawableId>, Option<DrawableId>)> = self
            .intervals
            .iter()
            .filter_map(|(_, interval)| {
                if interval.is_empty() {
                    None
                } else {
                    Some((interval.drawable_before(), interval.drawable_after()))
                }
            })
            .collect();
        // Relinking in new-ordering order places every anchor before it is used.
        changed.sort_by_key(|(before, _)| before.and_then(|id| self.sequence.new_position(id)));
        report.empty_intervals = report.intervals - report.combined - changed.len();

        let (old_start, old_end) = (self.sequence.old_first(), self.sequence.old_last());
        let (new_start, new_end) = (self.sequence.new_first(), self.sequence.new_last());
        for (_, interval) in self.intervals.iter().filter(|(_, i)| !i.is_empty()) {
            report.old_internal_drawables +=
                interval.old_internal_drawable_count(&self.sequence, old_start, old_end);
            report.new_internal_drawables +=
                interval.new_internal_drawable_count(&self.sequence, new_start, new_end);
        }

        for (before, after) in changed {
            report.relinked += self.relink(before, after);
        }

        let ordered = self.sequence.new_order().to_vec();
        for id in ordered {
            if let Some(drawable) = self.sequence.get_mut(id) {
                if drawable.update() {
                    report.drawables_updated += 1;
                }
            }
        }

        report.stops_updated = self.block.borrow_mut().update();

        self.sequence.commit();
        let _ = self.intervals.dispose_all();

        report.attribute_writes = self.document.borrow().attribute_writes() - writes_before;
        tracing::debug!(
            pass = report.pass,
            intervals = report.intervals,
            relinked = report.relinked,
            updated = report.drawables_updated,
            "synchronized surface"
        );
        report
    }

    /// Dispose every drawable and the block.
    pub fn dispose(&mut self) {
        let ids: Vec<DrawableId> = self.sequence.new_order().to_vec();
        for id in ids {
            let _ = self.remove_drawable(id);
        }
        let _ = self.intervals.dispose_all();
        self.sequence.commit();
        self.block.borrow_mut().dispose();
    }

    /// Place the elements between `before` and `after` (new ordering)
    /// contiguously after `before`'s element. Boundaries whose elements are
    /// not placed yet are widened until a placed one is found. From `after`
    /// on, the walk continues until it meets an element already in place.
    /// Returns the number of elements moved.
    fn relink(&self, before: Option<DrawableId>, after: Option<DrawableId>) -> usize {
        let group = self.block.borrow().group();
        let defs = self.block.borrow().defs();
        let mut doc = self.document.borrow_mut();
        let element_of = |id: DrawableId| self.sequence.get(id).map(|drawable| drawable.element());
        let placed = |doc: &SvgDocument, id: DrawableId| {
            self.sequence.is_ordered(id)
                && element_of(id).is_some_and(|element| doc.parent(element) == Some(group))
        };

        let mut start = before;
        while let Some(id) = start {
            if placed(&doc, id) {
                break;
            }
            start = self.sequence.new_previous(id);
        }
        let mut anchor: ElementId = start.and_then(element_of).unwrap_or(defs);
        let mut current = match start {
            Some(id) => self.sequence.new_next(id),
            None => self.sequence.new_first(),
        };

        let mut moved = 0;
        let mut past_end = false;
        while let Some(id) = current {
            past_end |= Some(id) == after;
            let Some(element) = element_of(id) else {
                current = self.sequence.new_next(id);
                continue;
            };
            let reference = doc.next_sibling(anchor);
            if reference == Some(element) {
                if past_end {
                    break;
                }
            } else {
                doc.insert_before(group, element, reference);
                moved += 1;
            }
            anchor = element;
            current = self.sequence.new_next(id);
        }
        moved
    }
}
