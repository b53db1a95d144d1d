//! Dirty flags tracked per drawable.

use std::cell::Cell;
use std::rc::Rc;

bitflags::bitflags! {
    /// Aspects of a drawable that must be recomputed on its next update.
    ///
    /// Fill and stroke are tracked independently, and so is every stroke
    /// option, so an update only rebuilds what actually changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u16 {
        /// The fill paint or its current value.
        const FILL = 1 << 0;
        /// The stroke paint or its current value.
        const STROKE = 1 << 1;
        /// `stroke-width`
        const LINE_WIDTH = 1 << 2;
        /// `stroke-linecap`
        const LINE_CAP = 1 << 3;
        /// `stroke-linejoin`
        const LINE_JOIN = 1 << 4;
        /// `stroke-miterlimit`
        const MITER_LIMIT = 1 << 5;
        /// `stroke-dasharray` and `stroke-dashoffset`
        const LINE_DASH = 1 << 6;
        /// The set of paints kept alive for descendants.
        const CACHED_PAINTS = 1 << 7;
        /// Shape geometry attributes.
        const GEOMETRY = 1 << 8;

        /// Both paints.
        const PAINT = Self::FILL.bits() | Self::STROKE.bits();
        /// Every stroke option.
        const LINE_OPTIONS = Self::LINE_WIDTH.bits()
            | Self::LINE_CAP.bits()
            | Self::LINE_JOIN.bits()
            | Self::MITER_LIMIT.bits()
            | Self::LINE_DASH.bits();
        /// Everything that ends up in the `style` attribute.
        const STYLE = Self::PAINT.bits() | Self::LINE_OPTIONS.bits();
    }
}

/// Dirty flags shared with the listeners that set them.
pub type SharedDirty = Rc<Cell<DirtyFlags>>;

/// Set `flags` on `dirty`.
pub fn mark(dirty: &Cell<DirtyFlags>, flags: DirtyFlags) {
    dirty.set(dirty.get() | flags);
}
