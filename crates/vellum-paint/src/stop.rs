//! Gradient stop proxies.
//!
//! [SVG 2 § 14.4 Gradient stops](https://www.w3.org/TR/SVG2/pservers.html#StopElement)
//!
//! One [`SvgGradientStop`] mirrors one color stop of a gradient into a
//! `<stop>` element. A stop whose color is observed keeps exactly one
//! listener on the observable container and, when the current value is a
//! [`MutableColor`], exactly one listener on that color object. The color
//! listener is tracked on its own so it can be detached even if the
//! container's change notification was missed.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use vellum_common::{ListenerId, Property};
use vellum_dom::{ElementId, SvgDocument};

use crate::color::{Color, ColorSpec, ColorValue, MutableColor};
use crate::defs::GradientSignal;
use crate::resolve::format_fixed;

/// State shared with the listeners a stop installs.
#[derive(Default)]
struct StopShared {
    dirty: Cell<bool>,
    gradient: RefCell<Option<Rc<GradientSignal>>>,
    tracked_color: RefCell<Option<(MutableColor, ListenerId)>>,
}

impl StopShared {
    fn mark_dirty(&self) {
        self.dirty.set(true);
        if let Some(gradient) = self.gradient.borrow().as_ref() {
            gradient.mark_dirty();
        }
    }

    fn attach_color(self: &Rc<Self>, value: Option<&ColorValue>) {
        let Some(color) = value.and_then(ColorValue::as_mutable) else {
            return;
        };
        // At most one color listener, even if a container notification was missed.
        self.detach_tracked_color();
        let weak: Weak<Self> = Rc::downgrade(self);
        let id = color.on_change(move || {
            if let Some(shared) = weak.upgrade() {
                shared.mark_dirty();
            }
        });
        *self.tracked_color.borrow_mut() = Some((color.clone(), id));
    }

    /// Detach from `value` if it is the color currently tracked.
    fn detach_color(&self, value: Option<&ColorValue>) {
        let Some(color) = value.and_then(ColorValue::as_mutable) else {
            return;
        };
        let mut tracked = self.tracked_color.borrow_mut();
        if tracked.as_ref().is_some_and(|(current, _)| current.ptr_eq(color)) {
            if let Some((current, id)) = tracked.take() {
                let _ = current.remove_listener(id);
            }
        }
    }

    fn detach_tracked_color(&self) {
        if let Some((color, id)) = self.tracked_color.borrow_mut().take() {
            let _ = color.remove_listener(id);
        }
    }

    fn on_property_change(self: &Rc<Self>, new: Option<&ColorValue>, old: Option<&ColorValue>) {
        self.detach_color(old);
        self.attach_color(new);
        self.mark_dirty();
    }
}

/// Renders one gradient stop as a `<stop>` element.
///
/// Stops are pooled by their block: [`SvgGradientStop::initialize`] re-arms a
/// recycled instance, reusing its element, and [`SvgGradientStop::dispose`]
/// detaches every listener before the instance goes back to the pool.
pub struct SvgGradientStop {
    element: ElementId,
    shared: Rc<StopShared>,
    ratio: f64,
    color: Option<ColorSpec>,
    container_listener: Option<(Property<Option<ColorValue>>, ListenerId)>,
    last_color: Option<Color>,
}

impl SvgGradientStop {
    /// Allocate a stop with a fresh, detached `<stop>` element.
    pub fn new(document: &mut SvgDocument) -> Self {
        Self {
            element: document.create_element("stop"),
            shared: Rc::new(StopShared::default()),
            ratio: 0.0,
            color: None,
            container_listener: None,
            last_color: None,
        }
    }

    /// Bind this stop to a gradient definition and a color.
    ///
    /// Writes `offset` once, attaches the needed listeners, then renders
    /// immediately so a freshly initialized stop is never stale.
    pub fn initialize(
        &mut self,
        document: &mut SvgDocument,
        gradient_element: ElementId,
        gradient: Rc<GradientSignal>,
        ratio: f64,
        color: ColorSpec,
    ) {
        debug_assert!(self.color.is_none(), "stop initialized twice without dispose");

        document.append_child(gradient_element, self.element);
        *self.shared.gradient.borrow_mut() = Some(gradient);
        self.ratio = ratio;
        document.set_attribute(self.element, "offset", &format_fixed(ratio));

        if let ColorSpec::Dynamic(property) = &color {
            let weak = Rc::downgrade(&self.shared);
            let id = property.lazy_link(move |new, old| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_property_change(new.as_ref(), old.as_ref());
                }
            });
            self.container_listener = Some((property.clone(), id));
        }
        self.shared.attach_color(color.current().as_ref());
        self.color = Some(color);

        self.shared.dirty.set(true);
        let _ = self.update(document);
    }

    /// The `<stop>` element this proxy writes.
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }

    /// The stop's fixed position along the gradient.
    #[must_use]
    pub const fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Whether the color changed since the last [`SvgGradientStop::update`].
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.get()
    }

    /// The color written by the last update.
    #[must_use]
    pub const fn last_color(&self) -> Option<Color> {
        self.last_color
    }

    /// Whether a listener is attached to a mutable color object.
    #[must_use]
    pub fn tracks_mutable_color(&self) -> bool {
        self.shared.tracked_color.borrow().is_some()
    }

    /// Write `stop-color`/`stop-opacity` if the color changed. Returns whether
    /// anything was written.
    pub fn update(&mut self, document: &mut SvgDocument) -> bool {
        if !self.shared.dirty.replace(false) {
            return false;
        }
        let color = self
            .color
            .as_ref()
            .map_or(Color::TRANSPARENT, ColorSpec::resolve);
        self.last_color = Some(color);

        let opacity = if color.a == 1.0 {
            String::new()
        } else {
            format!(";stop-opacity:{}", format_fixed(color.a))
        };
        let style = format!("stop-color:{}{opacity}", color.with_alpha(1.0).to_css());
        document.set_attribute(self.element, "style", &style);
        true
    }

    /// Detach all listeners, unbind from the gradient and detach the element.
    /// The element itself is kept for reuse.
    pub fn dispose(&mut self, document: &mut SvgDocument) {
        if let Some((property, id)) = self.container_listener.take() {
            let _ = property.unlink(id);
        }
        self.shared.detach_tracked_color();
        *self.shared.gradient.borrow_mut() = None;
        self.shared.dirty.set(false);
        self.color = None;
        self.last_color = None;
        document.detach(self.element);
    }
}

impl std::fmt::Debug for SvgGradientStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgGradientStop")
            .field("element", &self.element)
            .field("ratio", &self.ratio)
            .field("dirty", &self.is_dirty())
            .field("last_color", &self.last_color)
            .finish_non_exhaustive()
    }
}
