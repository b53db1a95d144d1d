//! Shared paint definitions rendered into a block's `<defs>`.
//!
//! [SVG 2 § 14 Paint Servers](https://www.w3.org/TR/SVG2/pservers.html)

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vellum_dom::{ElementId, SvgDocument};

use crate::paint::{Gradient, GradientKind, Paint, PaintId, Pattern};
use crate::resolve::format_fixed;
use crate::stop::SvgGradientStop;

/// Queue of gradients whose stops need re-rendering, drained by the block.
pub type DirtyQueue = Rc<RefCell<Vec<PaintId>>>;

/// Change signal shared between a gradient definition and its stops.
///
/// Stops mark it from inside listener callbacks, where the document is not
/// available; the owning block drains the queue on its next update.
#[derive(Debug)]
pub struct GradientSignal {
    paint_id: PaintId,
    dirty: Cell<bool>,
    queue: DirtyQueue,
}

impl GradientSignal {
    /// A clean signal that enqueues `paint_id` on `queue` when marked.
    #[must_use]
    pub fn new(paint_id: PaintId, queue: DirtyQueue) -> Rc<Self> {
        Rc::new(Self {
            paint_id,
            dirty: Cell::new(false),
            queue,
        })
    }

    /// Mark the gradient dirty, enqueuing it once until it is cleaned.
    pub fn mark_dirty(&self) {
        if !self.dirty.replace(true) {
            self.queue.borrow_mut().push(self.paint_id);
        }
    }

    /// Whether a stop changed since the gradient last updated.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }
}

/// A `<linearGradient>` or `<radialGradient>` definition with its stops.
#[derive(Debug)]
pub struct SvgGradient {
    element: ElementId,
    stops: Vec<SvgGradientStop>,
    signal: Rc<GradientSignal>,
}

impl SvgGradient {
    /// Render `gradient` under the definition id `def_id`, drawing stop
    /// proxies from `pool` before allocating new ones.
    pub fn create(
        document: &mut SvgDocument,
        gradient: &Gradient,
        def_id: &str,
        queue: DirtyQueue,
        pool: &mut Vec<SvgGradientStop>,
    ) -> Self {
        let element = match gradient.kind() {
            GradientKind::Linear { x1, y1, x2, y2 } => {
                let element = document.create_element("linearGradient");
                for (name, value) in [("x1", x1), ("y1", y1), ("x2", x2), ("y2", y2)] {
                    document.set_attribute(element, name, &format_fixed(value));
                }
                element
            }
            GradientKind::Radial {
                cx,
                cy,
                r,
                fx,
                fy,
                fr,
            } => {
                let element = document.create_element("radialGradient");
                for (name, value) in [
                    ("cx", cx),
                    ("cy", cy),
                    ("r", r),
                    ("fx", fx),
                    ("fy", fy),
                    ("fr", fr),
                ] {
                    document.set_attribute(element, name, &format_fixed(value));
                }
                element
            }
        };
        document.set_attribute(element, "id", def_id);
        document.set_attribute(element, "gradientUnits", "userSpaceOnUse");

        let signal = GradientSignal::new(gradient.id(), queue);
        let stops = gradient
            .stops()
            .iter()
            .map(|stop| {
                let mut proxy = pool
                    .pop()
                    .unwrap_or_else(|| SvgGradientStop::new(document));
                proxy.initialize(
                    document,
                    element,
                    Rc::clone(&signal),
                    stop.ratio,
                    stop.color.clone(),
                );
                proxy
            })
            .collect();

        Self {
            element,
            stops,
            signal,
        }
    }

    /// The gradient element.
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }

    /// The stop proxies, in ratio order.
    #[must_use]
    pub fn stops(&self) -> &[SvgGradientStop] {
        &self.stops
    }

    /// Re-render dirty stops. Returns how many were written.
    pub fn update(&mut self, document: &mut SvgDocument) -> usize {
        if !self.signal.take_dirty() {
            return 0;
        }
        self.stops
            .iter_mut()
            .map(|stop| usize::from(stop.update(document)))
            .sum()
    }

    fn dispose(self, document: &mut SvgDocument, pool: &mut Vec<SvgGradientStop>, capacity: usize) {
        for mut stop in self.stops {
            stop.dispose(document);
            if pool.len() < capacity {
                pool.push(stop);
            } else {
                document.free(stop.element());
            }
        }
        document.free(self.element);
    }
}

/// A `<pattern>` definition tiling one image.
#[derive(Debug)]
pub struct SvgPattern {
    element: ElementId,
}

impl SvgPattern {
    /// Render `pattern` under the definition id `def_id`.
    pub fn create(document: &mut SvgDocument, pattern: &Pattern, def_id: &str) -> Self {
        let (width, height) = pattern.size();
        let (width, height) = (format_fixed(width), format_fixed(height));

        let element = document.create_element("pattern");
        document.set_attribute(element, "id", def_id);
        document.set_attribute(element, "patternUnits", "userSpaceOnUse");
        document.set_attribute(element, "x", "0");
        document.set_attribute(element, "y", "0");
        document.set_attribute(element, "width", &width);
        document.set_attribute(element, "height", &height);

        let image = document.create_element("image");
        document.set_attribute(image, "href", pattern.href());
        document.set_attribute(image, "width", &width);
        document.set_attribute(image, "height", &height);
        document.append_child(element, image);

        Self { element }
    }

    /// The pattern element.
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }
}

/// The rendered definition of one shareable paint.
#[derive(Debug)]
pub enum SvgPaintDef {
    /// A gradient with stop proxies.
    Gradient(SvgGradient),
    /// An image pattern.
    Pattern(SvgPattern),
}

impl SvgPaintDef {
    /// Render the definition for a shareable paint, or `None` for paints
    /// that need no definition.
    pub fn create(
        document: &mut SvgDocument,
        paint: &Paint,
        def_id: &str,
        queue: DirtyQueue,
        pool: &mut Vec<SvgGradientStop>,
    ) -> Option<Self> {
        match paint {
            Paint::Gradient(gradient) => Some(Self::Gradient(SvgGradient::create(
                document, gradient, def_id, queue, pool,
            ))),
            Paint::Pattern(pattern) => Some(Self::Pattern(SvgPattern::create(
                document, pattern, def_id,
            ))),
            Paint::Color(_) | Paint::Token(_) => None,
        }
    }

    /// The definition's root element.
    #[must_use]
    pub const fn element(&self) -> ElementId {
        match self {
            Self::Gradient(gradient) => gradient.element(),
            Self::Pattern(pattern) => pattern.element(),
        }
    }

    /// Remove the definition from the document, returning stop proxies to
    /// `pool` up to `capacity`.
    pub fn dispose(
        self,
        document: &mut SvgDocument,
        pool: &mut Vec<SvgGradientStop>,
        capacity: usize,
    ) {
        match self {
            Self::Gradient(gradient) => gradient.dispose(document, pool, capacity),
            Self::Pattern(pattern) => document.free(pattern.element),
        }
    }
}
