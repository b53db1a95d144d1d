//! Change observation for fill and stroke specifications.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use vellum_common::{ListenerId, Property};

use crate::color::{ColorValue, MutableColor};
use crate::paint::{Paint, PaintSpec};

struct ObserverShared {
    on_change: Box<dyn Fn()>,
    secondary: RefCell<Option<(MutableColor, ListenerId)>>,
}

impl ObserverShared {
    fn attach_secondary(self: &Rc<Self>, paint: Option<&Paint>) {
        self.detach_secondary();
        let Some(Paint::Color(ColorValue::Mutable(color))) = paint else {
            return;
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        let id = color.on_change(move || {
            if let Some(shared) = weak.upgrade() {
                (shared.on_change)();
            }
        });
        *self.secondary.borrow_mut() = Some((color.clone(), id));
    }

    fn detach_secondary(&self) {
        if let Some((color, id)) = self.secondary.borrow_mut().take() {
            let _ = color.remove_listener(id);
        }
    }
}

/// Watches one paint specification and calls back when its rendered value
/// may have changed.
///
/// Two levels are observed: the container of a dynamic specification, and
/// the mutable color object it currently holds. Fixed immutable values need
/// no listener at all.
pub struct PaintObserver {
    shared: Rc<ObserverShared>,
    primary: Option<(Property<Option<Paint>>, ListenerId)>,
}

impl PaintObserver {
    /// An observer that calls `on_change` on every relevant change.
    pub fn new(on_change: impl Fn() + 'static) -> Self {
        Self {
            shared: Rc::new(ObserverShared {
                on_change: Box::new(on_change),
                secondary: RefCell::new(None),
            }),
            primary: None,
        }
    }

    /// Start observing `spec`, dropping whatever was observed before.
    pub fn set_primary(&mut self, spec: &PaintSpec) {
        self.clean();
        match spec {
            PaintSpec::Value(paint) => self.shared.attach_secondary(paint.as_ref()),
            PaintSpec::Dynamic(property) => {
                let weak = Rc::downgrade(&self.shared);
                let id = property.lazy_link(move |new, _old| {
                    if let Some(shared) = weak.upgrade() {
                        shared.attach_secondary(new.as_ref());
                        (shared.on_change)();
                    }
                });
                self.primary = Some((property.clone(), id));
                property.with(|paint| self.shared.attach_secondary(paint.as_ref()));
            }
        }
    }

    /// Detach every listener.
    pub fn clean(&mut self) {
        if let Some((property, id)) = self.primary.take() {
            let _ = property.unlink(id);
        }
        self.shared.detach_secondary();
    }

    /// Whether any listener is attached.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.primary.is_some() || self.shared.secondary.borrow().is_some()
    }
}

impl Drop for PaintObserver {
    fn drop(&mut self) {
        self.clean();
    }
}

impl fmt::Debug for PaintObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintObserver")
            .field("observing", &self.is_observing())
            .finish_non_exhaustive()
    }
}
