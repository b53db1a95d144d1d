//! Per-drawable paint state.
//!
//! A [`PaintState`] owns the resolved `fill`/`stroke` style strings of one
//! drawable and the block leases of the shareable paints it uses. Every
//! gradient or pattern currently set as fill or stroke holds exactly one
//! lease in the bound block.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::block::{BlockId, PaintLease, SharedBlock};
use crate::line::{LineCap, LineJoin, LineStyles};
use crate::paint::Paint;
use crate::resolve::{format_fixed, paint_to_svg_style};

#[derive(Debug)]
struct PaintSlot {
    paint: Option<Paint>,
    style: String,
    lease: Option<PaintLease>,
}

impl Default for PaintSlot {
    fn default() -> Self {
        Self {
            paint: None,
            style: "none".to_string(),
            lease: None,
        }
    }
}

/// Resolved fill/stroke styles and block registrations of one drawable.
#[derive(Debug, Default)]
pub struct PaintState {
    fill: PaintSlot,
    stroke: PaintSlot,
    block: Option<SharedBlock>,
    /// `fill: ..; stroke: ..;`, rebuilt lazily when either style changes.
    base_style: Option<String>,
    stroke_detail_style: String,
}

fn block_id(block: Option<&SharedBlock>) -> Option<BlockId> {
    block.map(|block| block.borrow().id())
}

fn same_block(a: Option<&SharedBlock>, b: Option<&SharedBlock>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

fn acquire(block: Option<&SharedBlock>, paint: Option<&Paint>) -> Option<PaintLease> {
    let (block, paint) = (block?, paint?);
    if !paint.is_shareable() {
        return None;
    }
    block.borrow_mut().acquire(paint)
}

fn release(block: Option<&SharedBlock>, lease: Option<PaintLease>) {
    let Some(lease) = lease else {
        return;
    };
    debug_assert!(block.is_some(), "paint lease held without a bound block");
    if let Some(block) = block {
        block.borrow_mut().release(lease);
    }
}

impl PaintState {
    /// A state with no paints, bound to `block`.
    #[must_use]
    pub fn new(block: Option<SharedBlock>) -> Self {
        Self {
            block,
            ..Self::default()
        }
    }

    /// The bound block.
    #[must_use]
    pub const fn block(&self) -> Option<&SharedBlock> {
        self.block.as_ref()
    }

    /// Current fill.
    #[must_use]
    pub const fn fill(&self) -> Option<&Paint> {
        self.fill.paint.as_ref()
    }

    /// Current stroke.
    #[must_use]
    pub const fn stroke(&self) -> Option<&Paint> {
        self.stroke.paint.as_ref()
    }

    /// Resolved `fill` value.
    #[must_use]
    pub fn fill_style(&self) -> &str {
        &self.fill.style
    }

    /// Resolved `stroke` value.
    #[must_use]
    pub fn stroke_style(&self) -> &str {
        &self.stroke.style
    }

    /// Stroke options as style declarations.
    #[must_use]
    pub fn stroke_detail_style(&self) -> &str {
        &self.stroke_detail_style
    }

    /// Set the fill. `block` must be the block this state is bound to.
    pub fn update_fill(&mut self, block: Option<&SharedBlock>, fill: Option<Paint>) {
        debug_assert!(
            same_block(block, self.block.as_ref()),
            "fill updated against a block the paint state is not bound to"
        );
        if Self::update_slot(&mut self.fill, self.block.as_ref(), fill) {
            self.base_style = None;
        }
    }

    /// Set the stroke. `block` must be the block this state is bound to.
    pub fn update_stroke(&mut self, block: Option<&SharedBlock>, stroke: Option<Paint>) {
        debug_assert!(
            same_block(block, self.block.as_ref()),
            "stroke updated against a block the paint state is not bound to"
        );
        if Self::update_slot(&mut self.stroke, self.block.as_ref(), stroke) {
            self.base_style = None;
        }
    }

    /// Returns whether the slot's style string changed.
    fn update_slot(slot: &mut PaintSlot, block: Option<&SharedBlock>, paint: Option<Paint>) -> bool {
        let style = paint_to_svg_style(paint.as_ref(), block_id(block));

        if !Paint::same_identity(slot.paint.as_ref(), paint.as_ref()) {
            let lease = acquire(block, paint.as_ref());
            release(block, std::mem::replace(&mut slot.lease, lease));
        }
        slot.paint = paint;

        if slot.style == style {
            false
        } else {
            slot.style = style;
            true
        }
    }

    /// Rebuild the stroke detail declarations from `styles`. Values equal to
    /// the SVG initial value are omitted, except the miter limit.
    pub fn update_stroke_detail_style(&mut self, styles: &LineStyles) {
        let mut detail = String::new();
        if styles.line_width != 1.0 {
            let _ = write!(detail, "stroke-width: {};", format_fixed(styles.line_width));
        }
        if styles.line_cap != LineCap::Butt {
            let _ = write!(detail, "stroke-linecap: {};", styles.line_cap);
        }
        if styles.line_join != LineJoin::Miter {
            let _ = write!(detail, "stroke-linejoin: {};", styles.line_join);
        }
        let _ = write!(detail, "stroke-miterlimit: {};", format_fixed(styles.miter_limit));
        if styles.has_line_dash() {
            let dash: Vec<String> = styles.line_dash.iter().map(|&d| format_fixed(d)).collect();
            let _ = write!(
                detail,
                "stroke-dasharray: {};stroke-dashoffset: {};",
                dash.join(","),
                format_fixed(styles.line_dash_offset)
            );
        }
        self.stroke_detail_style = detail;
    }

    /// The `fill: ..; stroke: ..;` declarations.
    pub fn base_style(&mut self) -> &str {
        let (fill, stroke) = (&self.fill.style, &self.stroke.style);
        self.base_style
            .get_or_insert_with(|| format!("fill: {fill}; stroke: {stroke};"))
    }

    /// The full style attribute value.
    pub fn style(&mut self) -> String {
        let detail = self.stroke_detail_style.clone();
        format!("{}{detail}", self.base_style())
    }

    /// Move to another block: release every lease in the old block first,
    /// then switch and take the leases in the new one. Styles are rebuilt,
    /// since scoped references embed the block id.
    pub fn update_svg_block(&mut self, block: Option<SharedBlock>) {
        self.release_svg_block();
        self.block = block;

        for slot in [&mut self.fill, &mut self.stroke] {
            slot.lease = acquire(self.block.as_ref(), slot.paint.as_ref());
            slot.style = paint_to_svg_style(slot.paint.as_ref(), block_id(self.block.as_ref()));
        }
        self.base_style = None;
    }

    /// Release the leases held in the bound block, keeping the paints.
    pub fn release_svg_block(&mut self) {
        for slot in [&mut self.fill, &mut self.stroke] {
            release(self.block.as_ref(), slot.lease.take());
        }
    }

    /// Release everything and unbind.
    pub fn dispose(&mut self) {
        self.release_svg_block();
        self.fill = PaintSlot::default();
        self.stroke = PaintSlot::default();
        self.block = None;
        self.base_style = None;
    }
}
