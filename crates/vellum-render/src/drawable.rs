//! The drawable abstraction the render surface works with.

use std::cell::RefCell;
use std::rc::Rc;

use vellum_dom::ElementId;
use vellum_paint::SharedBlock;

/// The persistent output counterpart of one visual node.
///
/// A drawable owns one output element and keeps it in sync with its inputs.
/// Input changes only mark the drawable dirty; [`Drawable::update`] is the
/// single place where the element is written.
pub trait Drawable {
    /// The output element this drawable maintains.
    fn element(&self) -> ElementId;

    /// Whether an update has work to do.
    fn is_dirty(&self) -> bool;

    /// Whether [`Drawable::dispose`] has been called.
    fn is_disposed(&self) -> bool;

    /// Flush pending changes to the output element. Returns `false` without
    /// doing anything when the drawable is clean or disposed.
    fn update(&mut self) -> bool;

    /// Move the drawable into another block, migrating every paint
    /// reference it holds.
    fn update_svg_block(&mut self, block: Option<SharedBlock>);

    /// Release all references and, unless the element is kept for reuse,
    /// remove the element from the document. Repeated calls are ignored.
    fn dispose(&mut self);
}

/// A drawable shared between the surface and the code feeding it inputs.
pub type SharedDrawable<D> = Rc<RefCell<D>>;

impl<D: Drawable> Drawable for Rc<RefCell<D>> {
    fn element(&self) -> ElementId {
        self.borrow().element()
    }

    fn is_dirty(&self) -> bool {
        self.borrow().is_dirty()
    }

    fn is_disposed(&self) -> bool {
        self.borrow().is_disposed()
    }

    fn update(&mut self) -> bool {
        self.borrow_mut().update()
    }

    fn update_svg_block(&mut self, block: Option<SharedBlock>) {
        self.borrow_mut().update_svg_block(block);
    }

    fn dispose(&mut self) {
        self.borrow_mut().dispose();
    }
}
