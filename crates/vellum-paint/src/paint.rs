//! Paint specifications: colors, gradients, patterns and raw style tokens.
//!
//! [SVG 2 § 13.2 Specifying paint](https://www.w3.org/TR/SVG2/painting.html#SpecifyingPaint)

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use vellum_common::Property;

use crate::color::{Color, ColorSpec, ColorValue, MutableColor};

static NEXT_PAINT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a shareable paint (gradient or pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PaintId(pub u64);

impl PaintId {
    fn next() -> Self {
        Self(NEXT_PAINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "paint{}", self.0)
    }
}

/// One color stop of a gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient vector, in `[0, 1]`.
    pub ratio: f64,
    /// Stop color, possibly observed.
    pub color: ColorSpec,
}

impl GradientStop {
    /// A stop at `ratio` (clamped to `[0, 1]`).
    #[must_use]
    pub fn new(ratio: f64, color: impl Into<ColorSpec>) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            color: color.into(),
        }
    }
}

/// Geometry of a gradient, in the user space of the element it paints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientKind {
    /// [§ 14.2 Linear gradients](https://www.w3.org/TR/SVG2/pservers.html#LinearGradients)
    Linear {
        /// Start point x.
        x1: f64,
        /// Start point y.
        y1: f64,
        /// End point x.
        x2: f64,
        /// End point y.
        y2: f64,
    },
    /// [§ 14.3 Radial gradients](https://www.w3.org/TR/SVG2/pservers.html#RadialGradients)
    Radial {
        /// End circle center x.
        cx: f64,
        /// End circle center y.
        cy: f64,
        /// End circle radius.
        r: f64,
        /// Focal (start) circle center x.
        fx: f64,
        /// Focal (start) circle center y.
        fy: f64,
        /// Focal circle radius.
        fr: f64,
    },
}

#[derive(Debug)]
struct GradientInner {
    id: PaintId,
    kind: GradientKind,
    stops: Vec<GradientStop>,
}

/// A shareable gradient paint. Clones share identity.
#[derive(Debug, Clone)]
pub struct Gradient {
    inner: Rc<GradientInner>,
}

impl Gradient {
    /// A gradient with the given geometry and stops. Stops are sorted by ratio.
    #[must_use]
    pub fn new(kind: GradientKind, mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));
        Self {
            inner: Rc::new(GradientInner {
                id: PaintId::next(),
                kind,
                stops,
            }),
        }
    }

    /// A linear gradient from `(x1, y1)` to `(x2, y2)`.
    #[must_use]
    pub fn linear(x1: f64, y1: f64, x2: f64, y2: f64, stops: Vec<GradientStop>) -> Self {
        Self::new(GradientKind::Linear { x1, y1, x2, y2 }, stops)
    }

    /// A radial gradient whose focal circle sits at the center with zero radius.
    #[must_use]
    pub fn radial(cx: f64, cy: f64, r: f64, stops: Vec<GradientStop>) -> Self {
        Self::new(
            GradientKind::Radial {
                cx,
                cy,
                r,
                fx: cx,
                fy: cy,
                fr: 0.0,
            },
            stops,
        )
    }

    /// Identity of this gradient.
    #[must_use]
    pub fn id(&self) -> PaintId {
        self.inner.id
    }

    /// Geometry.
    #[must_use]
    pub fn kind(&self) -> GradientKind {
        self.inner.kind
    }

    /// Stops in ascending ratio order.
    #[must_use]
    pub fn stops(&self) -> &[GradientStop] {
        &self.inner.stops
    }
}

#[derive(Debug)]
struct PatternInner {
    id: PaintId,
    href: String,
    width: f64,
    height: f64,
}

/// A shareable image pattern paint. Clones share identity.
#[derive(Debug, Clone)]
pub struct Pattern {
    inner: Rc<PatternInner>,
}

impl Pattern {
    /// A pattern tiling the image at `href` in `width` x `height` cells.
    #[must_use]
    pub fn new(href: &str, width: f64, height: f64) -> Self {
        Self {
            inner: Rc::new(PatternInner {
                id: PaintId::next(),
                href: href.to_string(),
                width,
                height,
            }),
        }
    }

    /// Identity of this pattern.
    #[must_use]
    pub fn id(&self) -> PaintId {
        self.inner.id
    }

    /// Image reference.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.inner.href
    }

    /// Tile size.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.inner.width, self.inner.height)
    }
}

/// A concrete paint value.
#[derive(Debug, Clone)]
pub enum Paint {
    /// A solid color, immutable or mutable.
    Color(ColorValue),
    /// A shareable gradient definition.
    Gradient(Gradient),
    /// A shareable pattern definition.
    Pattern(Pattern),
    /// Any other style token, written through verbatim
    /// (e.g. `currentColor` or `context-fill`).
    Token(String),
}

impl Paint {
    /// A raw style token.
    #[must_use]
    pub fn token(token: &str) -> Self {
        Self::Token(token.to_string())
    }

    /// The identity under which this paint is registered in a resource
    /// block, or `None` if it is not shareable.
    #[must_use]
    pub fn shareable_id(&self) -> Option<PaintId> {
        match self {
            Self::Gradient(gradient) => Some(gradient.id()),
            Self::Pattern(pattern) => Some(pattern.id()),
            Self::Color(_) | Self::Token(_) => None,
        }
    }

    /// Whether this paint needs a definition in a resource block.
    #[must_use]
    pub fn is_shareable(&self) -> bool {
        self.shareable_id().is_some()
    }

    /// Reference identity: same shared object, or equal immutable value.
    ///
    /// A mutable color compares by object, so changing it in place keeps its
    /// identity while changing its style.
    #[must_use]
    pub fn same_identity(a: Option<&Self>, b: Option<&Self>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(Self::Color(ColorValue::Fixed(x))), Some(Self::Color(ColorValue::Fixed(y)))) => {
                x == y
            }
            (
                Some(Self::Color(ColorValue::Mutable(x))),
                Some(Self::Color(ColorValue::Mutable(y))),
            ) => x.ptr_eq(y),
            (Some(Self::Token(x)), Some(Self::Token(y))) => x == y,
            (Some(x), Some(y)) => x.shareable_id().is_some() && x.shareable_id() == y.shareable_id(),
            _ => false,
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Color(ColorValue::Fixed(color))
    }
}

impl From<MutableColor> for Paint {
    fn from(color: MutableColor) -> Self {
        Self::Color(ColorValue::Mutable(color))
    }
}

impl From<Gradient> for Paint {
    fn from(gradient: Gradient) -> Self {
        Self::Gradient(gradient)
    }
}

impl From<Pattern> for Paint {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl PartialEq for Paint {
    fn eq(&self, other: &Self) -> bool {
        Self::same_identity(Some(self), Some(other))
    }
}

/// A fill or stroke as the scene graph specifies it: either a value, or an
/// observable container whose contents may change.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintSpec {
    /// A fixed value; `None` means no paint.
    Value(Option<Paint>),
    /// A value read from an observable container.
    Dynamic(Property<Option<Paint>>),
}

impl PaintSpec {
    /// No paint.
    #[must_use]
    pub const fn none() -> Self {
        Self::Value(None)
    }

    /// The current paint, reading through the container if dynamic.
    #[must_use]
    pub fn resolve(&self) -> Option<Paint> {
        match self {
            Self::Value(paint) => paint.clone(),
            Self::Dynamic(property) => property.get(),
        }
    }
}

impl Default for PaintSpec {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Paint> for PaintSpec {
    fn from(paint: Paint) -> Self {
        Self::Value(Some(paint))
    }
}

impl From<Color> for PaintSpec {
    fn from(paint: Color) -> Self {
        Self::Value(Some(paint.into()))
    }
}

impl From<MutableColor> for PaintSpec {
    fn from(paint: MutableColor) -> Self {
        Self::Value(Some(paint.into()))
    }
}

impl From<Gradient> for PaintSpec {
    fn from(paint: Gradient) -> Self {
        Self::Value(Some(paint.into()))
    }
}

impl From<Pattern> for PaintSpec {
    fn from(paint: Pattern) -> Self {
        Self::Value(Some(paint.into()))
    }
}

impl From<Property<Option<Paint>>> for PaintSpec {
    fn from(property: Property<Option<Paint>>) -> Self {
        Self::Dynamic(property)
    }
}
