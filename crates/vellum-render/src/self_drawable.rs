//! Self drawables: one leaf node mirrored into one SVG shape element.
//!
//! # State
//!
//! Inputs (fill, stroke, stroke options, cached paints, geometry) are set
//! through the setters below, which only raise [`DirtyFlags`]. Observed
//! paints raise them from listener callbacks. [`Drawable::update`] is the
//! only transition back to clean: it rebuilds exactly the flagged parts and
//! writes the `style` attribute once.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use vellum_common::PipelineConfig;
use vellum_dom::{ElementId, SharedDocument};
use vellum_paint::{
    LineCap, LineJoin, LineStyles, Paint, PaintLease, PaintObserver, PaintSpec, PaintState,
    SharedBlock,
};

use crate::dirty::{DirtyFlags, SharedDirty, mark};
use crate::drawable::Drawable;
use crate::shapes::SvgShape;

/// A drawable rendering one shape with fill, stroke and stroke options.
pub struct SvgSelfDrawable<S: SvgShape> {
    document: SharedDocument,
    element: ElementId,
    shape: S,
    fill: PaintSpec,
    stroke: PaintSpec,
    fill_observer: PaintObserver,
    stroke_observer: PaintObserver,
    line_styles: LineStyles,
    paint_state: PaintState,
    block: Option<SharedBlock>,
    /// Paints to keep alive in the block, as last requested.
    cached_paints: Vec<Paint>,
    /// Leases currently held for cached paints.
    cached_leases: Vec<(Paint, PaintLease)>,
    dirty: SharedDirty,
    keep_element: bool,
    disposed: bool,
}

impl<S: SvgShape> SvgSelfDrawable<S> {
    /// Create a drawable with a fresh, detached element for `shape`.
    ///
    /// With `keep_element`, disposal leaves the element allocated so it can
    /// be reused.
    pub fn new(document: SharedDocument, shape: S, keep_element: bool) -> Self {
        let element = document.borrow_mut().create_element(shape.tag_name());
        let dirty: SharedDirty = Rc::new(Cell::new(
            DirtyFlags::STYLE | DirtyFlags::GEOMETRY,
        ));
        let fill_dirty = Rc::clone(&dirty);
        let stroke_dirty = Rc::clone(&dirty);
        Self {
            document,
            element,
            shape,
            fill: PaintSpec::none(),
            stroke: PaintSpec::none(),
            fill_observer: PaintObserver::new(move || mark(&fill_dirty, DirtyFlags::FILL)),
            stroke_observer: PaintObserver::new(move || mark(&stroke_dirty, DirtyFlags::STROKE)),
            line_styles: LineStyles::default(),
            paint_state: PaintState::new(None),
            block: None,
            cached_paints: Vec::new(),
            cached_leases: Vec::new(),
            dirty,
            keep_element,
            disposed: false,
        }
    }

    /// Create a drawable taking the element retention policy from `config`.
    pub fn with_config(document: SharedDocument, shape: S, config: &PipelineConfig) -> Self {
        Self::new(document, shape, config.keep_elements)
    }

    fn mark_dirty(&self, flags: DirtyFlags) {
        debug_assert!(!self.disposed, "disposed drawable modified");
        mark(&self.dirty, flags);
    }

    // ========== inputs ==========

    /// The shape.
    pub const fn shape(&self) -> &S {
        &self.shape
    }

    /// Replace the shape geometry.
    pub fn set_shape(&mut self, shape: S) {
        debug_assert_eq!(
            shape.tag_name(),
            self.shape.tag_name(),
            "shape replaced with a different element type"
        );
        self.shape = shape;
        self.mark_dirty(DirtyFlags::GEOMETRY);
    }

    /// Current fill specification.
    pub const fn fill(&self) -> &PaintSpec {
        &self.fill
    }

    /// Set the fill, observing it if it can change.
    pub fn set_fill(&mut self, fill: impl Into<PaintSpec>) {
        self.fill = fill.into();
        self.fill_observer.set_primary(&self.fill);
        self.mark_dirty(DirtyFlags::FILL);
    }

    /// Current stroke specification.
    pub const fn stroke(&self) -> &PaintSpec {
        &self.stroke
    }

    /// Set the stroke, observing it if it can change.
    pub fn set_stroke(&mut self, stroke: impl Into<PaintSpec>) {
        self.stroke = stroke.into();
        self.stroke_observer.set_primary(&self.stroke);
        self.mark_dirty(DirtyFlags::STROKE);
    }

    /// Current stroke options.
    pub const fn line_styles(&self) -> &LineStyles {
        &self.line_styles
    }

    /// Set every stroke option, flagging only those that differ.
    pub fn set_line_styles(&mut self, styles: LineStyles) {
        let mut flags = DirtyFlags::empty();
        let current = &self.line_styles;
        if current.line_width != styles.line_width {
            flags |= DirtyFlags::LINE_WIDTH;
        }
        if current.line_cap != styles.line_cap {
            flags |= DirtyFlags::LINE_CAP;
        }
        if current.line_join != styles.line_join {
            flags |= DirtyFlags::LINE_JOIN;
        }
        if current.miter_limit != styles.miter_limit {
            flags |= DirtyFlags::MITER_LIMIT;
        }
        if current.line_dash != styles.line_dash || current.line_dash_offset != styles.line_dash_offset {
            flags |= DirtyFlags::LINE_DASH;
        }
        self.line_styles = styles;
        if !flags.is_empty() {
            self.mark_dirty(flags);
        }
    }

    /// Set the stroke width.
    pub fn set_line_width(&mut self, width: f64) {
        self.set_line_styles(LineStyles {
            line_width: width,
            ..self.line_styles.clone()
        });
    }

    /// Set the line cap.
    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.set_line_styles(LineStyles {
            line_cap: cap,
            ..self.line_styles.clone()
        });
    }

    /// Set the line join.
    pub fn set_line_join(&mut self, join: LineJoin) {
        self.set_line_styles(LineStyles {
            line_join: join,
            ..self.line_styles.clone()
        });
    }

    /// Set the miter limit.
    pub fn set_miter_limit(&mut self, limit: f64) {
        self.set_line_styles(LineStyles {
            miter_limit: limit,
            ..self.line_styles.clone()
        });
    }

    /// Set the dash pattern and offset.
    pub fn set_line_dash(&mut self, dash: Vec<f64>, offset: f64) {
        self.set_line_styles(LineStyles {
            line_dash: dash,
            line_dash_offset: offset,
            ..self.line_styles.clone()
        });
    }

    /// Paints this drawable keeps alive in its block on behalf of
    /// descendants. Order does not matter; duplicates hold one reference
    /// each.
    pub fn set_cached_paints(&mut self, paints: Vec<Paint>) {
        self.cached_paints = paints;
        self.mark_dirty(DirtyFlags::CACHED_PAINTS);
    }

    // ========== state ==========

    /// The bound block.
    pub const fn block(&self) -> Option<&SharedBlock> {
        self.block.as_ref()
    }

    /// Resolved styles and leases.
    pub const fn paint_state(&self) -> &PaintState {
        &self.paint_state
    }

    /// Pending dirty flags.
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty.get()
    }

    /// Number of block references held for cached paints.
    pub fn cached_lease_count(&self) -> usize {
        self.cached_leases.len()
    }

    // ========== updates ==========

    /// Diff the held cached-paint leases against the requested set. New
    /// leases are taken before stale ones are released, so a paint present
    /// in both sets never drops to zero references.
    fn update_cached_paints(&mut self) {
        let mut previous: Vec<Option<(Paint, PaintLease)>> =
            std::mem::take(&mut self.cached_leases).into_iter().map(Some).collect();
        let mut next = Vec::with_capacity(self.cached_paints.len());

        for paint in self.cached_paints.iter().filter(|paint| paint.is_shareable()) {
            let kept = previous
                .iter_mut()
                .find(|held| held.as_ref().is_some_and(|(held, _)| held == paint))
                .and_then(Option::take);
            if let Some(kept) = kept {
                next.push(kept);
            } else if let Some(block) = &self.block {
                if let Some(lease) = block.borrow_mut().acquire(paint) {
                    next.push((paint.clone(), lease));
                }
            }
        }

        let stale: Vec<PaintLease> = previous.into_iter().flatten().map(|(_, lease)| lease).collect();
        self.release_leases(stale);
        self.cached_leases = next;
    }

    fn release_leases(&self, leases: Vec<PaintLease>) {
        if leases.is_empty() {
            return;
        }
        debug_assert!(self.block.is_some(), "cached paint leases held without a block");
        if let Some(block) = &self.block {
            let mut block = block.borrow_mut();
            for lease in leases {
                block.release(lease);
            }
        }
    }

    fn acquire_cached_paints(&mut self) {
        let Some(block) = &self.block else {
            return;
        };
        let mut block = block.borrow_mut();
        self.cached_leases = self
            .cached_paints
            .iter()
            .filter_map(|paint| block.acquire(paint).map(|lease| (paint.clone(), lease)))
            .collect();
    }

    /// Rebuild the flagged parts of the fill, stroke and stroke option
    /// styles, then write the `style` attribute once.
    fn update_fill_stroke_style(&mut self, flags: DirtyFlags) {
        if flags.contains(DirtyFlags::FILL) {
            self.paint_state
                .update_fill(self.block.as_ref(), self.fill.resolve());
        }
        if flags.contains(DirtyFlags::STROKE) {
            self.paint_state
                .update_stroke(self.block.as_ref(), self.stroke.resolve());
        }
        if flags.intersects(DirtyFlags::LINE_OPTIONS) {
            self.paint_state.update_stroke_detail_style(&self.line_styles);
        }
        if flags.intersects(DirtyFlags::STYLE) {
            let style = self.paint_state.style();
            self.document
                .borrow_mut()
                .set_attribute(self.element, "style", &style);
        }
    }

    fn update_svg_self(&mut self, flags: DirtyFlags) {
        if flags.contains(DirtyFlags::GEOMETRY) {
            let mut document = self.document.borrow_mut();
            self.shape.write_geometry(&mut document, self.element);
        }
        self.update_fill_stroke_style(flags);
    }
}

impl<S: SvgShape> Drawable for SvgSelfDrawable<S> {
    fn element(&self) -> ElementId {
        self.element
    }

    fn is_dirty(&self) -> bool {
        !self.dirty.get().is_empty()
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn update(&mut self) -> bool {
        if self.disposed || !self.is_dirty() {
            return false;
        }
        let flags = self.dirty.get();

        if flags.contains(DirtyFlags::CACHED_PAINTS) {
            self.update_cached_paints();
        }
        if flags.intersects(DirtyFlags::STYLE | DirtyFlags::GEOMETRY) {
            self.update_svg_self(flags);
        }

        self.dirty.set(DirtyFlags::empty());
        true
    }

    /// Decrement cached and paint-state references in the old block,
    /// switch, then increment them in the new one. Fill and stroke are
    /// flagged because their references embed the block id.
    fn update_svg_block(&mut self, block: Option<SharedBlock>) {
        debug_assert!(!self.disposed, "disposed drawable moved between blocks");
        let unchanged = match (&self.block, &block) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        if unchanged {
            return;
        }

        let cached = std::mem::take(&mut self.cached_leases)
            .into_iter()
            .map(|(_, lease)| lease)
            .collect();
        self.release_leases(cached);
        self.paint_state.release_svg_block();

        self.block = block;
        self.acquire_cached_paints();
        self.paint_state.update_svg_block(self.block.clone());

        mark(&self.dirty, DirtyFlags::PAINT);
        tracing::trace!(element = self.element.0, "drawable moved to another block");
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.fill_observer.clean();
        self.stroke_observer.clean();
        let cached = std::mem::take(&mut self.cached_leases)
            .into_iter()
            .map(|(_, lease)| lease)
            .collect();
        self.release_leases(cached);
        self.paint_state.dispose();
        self.block = None;
        self.dirty.set(DirtyFlags::empty());

        let mut document = self.document.borrow_mut();
        if self.keep_element {
            document.detach(self.element);
        } else {
            document.free(self.element);
        }
    }
}

impl<S: SvgShape + fmt::Debug> fmt::Debug for SvgSelfDrawable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvgSelfDrawable")
            .field("element", &self.element)
            .field("shape", &self.shape)
            .field("dirty", &self.dirty.get())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
