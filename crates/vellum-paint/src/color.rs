//! Colors, mutable colors and color specifications.
//!
//! [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use vellum_common::{Emitter, ListenerId, Property};

use crate::resolve::format_fixed;

/// Error returned by [`Color::from_css`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized color '{0}'")]
pub struct ColorParseError(pub String);

/// [§ 4 Color syntax](https://www.w3.org/TR/css-color-4/#color-syntax)
/// sRGB color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    /// "the red color channel" (0-255)
    pub r: u8,
    /// "the green color channel" (0-255)
    pub g: u8,
    /// "the blue color channel" (0-255)
    pub b: u8,
    /// "the alpha channel" (0.0-1.0, 1.0 = fully opaque)
    pub a: f64,
}

impl Color {
    /// Black (#000000)
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Fully transparent black, used wherever a color resolves to nothing.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    /// An opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// A color with alpha clamped to `[0, 1]`. NaN alpha becomes 0.
    #[must_use]
    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        let a = if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) };
        Self { r, g, b, a }
    }

    /// The same color with a different alpha.
    #[must_use]
    pub fn with_alpha(self, a: f64) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// CSS serialization: `rgb(r,g,b)` when opaque, `rgba(r,g,b,a)` otherwise.
    ///
    /// The alpha is written in fixed-point notation because SVG parsers do
    /// not accept exponents.
    #[must_use]
    pub fn to_css(&self) -> String {
        if self.a == 1.0 {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({},{},{},{})",
                self.r,
                self.g,
                self.b,
                format_fixed(self.a)
            )
        }
    }

    /// Parse a CSS color: hex notation, `rgb()`/`rgba()`, or a named color.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] if the string is none of those.
    pub fn from_css(text: &str) -> Result<Self, ColorParseError> {
        let trimmed = text.trim();
        let parsed = if trimmed.starts_with('#') {
            Self::from_hex(trimmed)
        } else if let Some(args) = trimmed
            .strip_prefix("rgba(")
            .or_else(|| trimmed.strip_prefix("rgb("))
        {
            args.strip_suffix(')').and_then(Self::from_rgb_args)
        } else {
            Self::from_named(trimmed)
        };
        parsed.ok_or_else(|| ColorParseError(text.to_string()))
    }

    /// [§ 5.1 The RGB functions](https://www.w3.org/TR/css-color-4/#rgb-functions)
    /// Legacy comma-separated syntax with integer channels.
    fn from_rgb_args(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let channel = |s: &str| s.parse::<u8>().ok();
        match parts.as_slice() {
            &[r, g, b] => Some(Self::rgb(channel(r)?, channel(g)?, channel(b)?)),
            &[r, g, b, a] => Some(Self::rgba(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                a.parse::<f64>().ok()?,
            )),
            _ => None,
        }
    }

    /// [§ 4.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    /// "The syntax of a <hex-color> is a <hash-token> token whose value consists of
    /// 3, 4, 6, or 8 hexadecimal digits."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let short = |i: usize| u8::from_str_radix(&hex[i..=i].repeat(2), 16).ok();
        let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            // [§ 4.2.1]
            // "The three-digit RGB notation (#RGB) is converted into six-digit form (#RRGGBB)
            // by replicating digits, not by adding zeros."
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            // Four-digit RGBA notation (#RGBA)
            4 => Some(Self::rgba(
                short(0)?,
                short(1)?,
                short(2)?,
                f64::from(short(3)?) / 255.0,
            )),
            // Six-digit RGB notation (#RRGGBB)
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            // Eight-digit RGBA notation (#RRGGBBAA)
            8 => Some(Self::rgba(
                long(0)?,
                long(2)?,
                long(4)?,
                f64::from(long(6)?) / 255.0,
            )),
            _ => None,
        }
    }

    /// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
    /// The basic sixteen HTML colors plus `orange` and `transparent`.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let color = match name.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "silver" => Self::rgb(192, 192, 192),
            "maroon" => Self::rgb(128, 0, 0),
            "purple" => Self::rgb(128, 0, 128),
            "fuchsia" | "magenta" => Self::rgb(255, 0, 255),
            "lime" => Self::rgb(0, 255, 0),
            "olive" => Self::rgb(128, 128, 0),
            "navy" => Self::rgb(0, 0, 128),
            "teal" => Self::rgb(0, 128, 128),
            "aqua" | "cyan" => Self::rgb(0, 255, 255),
            "orange" => Self::rgb(255, 165, 0),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

struct MutableColorInner {
    color: Cell<Color>,
    changed: Emitter<()>,
}

/// A color object that can change in place and notifies its own listeners.
///
/// Handles are shared: clones refer to the same color, and equality is
/// identity.
#[derive(Clone)]
pub struct MutableColor {
    inner: Rc<MutableColorInner>,
}

impl MutableColor {
    /// Create a mutable color starting at `color`.
    #[must_use]
    pub fn new(color: Color) -> Self {
        Self {
            inner: Rc::new(MutableColorInner {
                color: Cell::new(color),
                changed: Emitter::new(),
            }),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> Color {
        self.inner.color.get()
    }

    /// Change the color in place, notifying listeners if it differs.
    pub fn set(&self, color: Color) {
        if self.inner.color.replace(color) != color {
            self.inner.changed.emit(&());
        }
    }

    /// Attach a change listener.
    pub fn on_change(&self, listener: impl Fn() + 'static) -> ListenerId {
        self.inner.changed.add_listener(move |_| listener())
    }

    /// Detach a change listener. Returns whether it was attached.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.changed.remove_listener(id)
    }

    /// Whether the given listener is attached.
    #[must_use]
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner.changed.has_listener(id)
    }

    /// Number of attached change listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.changed.listener_count()
    }

    /// Whether two handles refer to the same color object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for MutableColor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MutableColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableColor")
            .field("color", &self.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A color that is either immutable or a [`MutableColor`] object.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    /// An immutable value; never needs observation.
    Fixed(Color),
    /// A shared color that may change in place.
    Mutable(MutableColor),
}

impl ColorValue {
    /// The color this value currently represents.
    #[must_use]
    pub fn color(&self) -> Color {
        match self {
            Self::Fixed(color) => *color,
            Self::Mutable(color) => color.get(),
        }
    }

    /// The mutable color object, if this is one.
    #[must_use]
    pub const fn as_mutable(&self) -> Option<&MutableColor> {
        match self {
            Self::Mutable(color) => Some(color),
            Self::Fixed(_) => None,
        }
    }
}

impl From<Color> for ColorValue {
    fn from(color: Color) -> Self {
        Self::Fixed(color)
    }
}

impl From<MutableColor> for ColorValue {
    fn from(color: MutableColor) -> Self {
        Self::Mutable(color)
    }
}

/// The color of a gradient stop: fixed, or read from an observable container
/// whose contents may be `None` (rendered as transparent).
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    /// A value known at construction time.
    Fixed(ColorValue),
    /// A value read from an observable container.
    Dynamic(Property<Option<ColorValue>>),
}

impl ColorSpec {
    /// The current color value, reading through the container if dynamic.
    #[must_use]
    pub fn current(&self) -> Option<ColorValue> {
        match self {
            Self::Fixed(value) => Some(value.clone()),
            Self::Dynamic(property) => property.get(),
        }
    }

    /// The concrete color to render; `None` resolves to transparent.
    #[must_use]
    pub fn resolve(&self) -> Color {
        self.current()
            .map_or(Color::TRANSPARENT, |value| value.color())
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        Self::Fixed(ColorValue::Fixed(color))
    }
}

impl From<MutableColor> for ColorSpec {
    fn from(color: MutableColor) -> Self {
        Self::Fixed(ColorValue::Mutable(color))
    }
}

impl From<Property<Option<ColorValue>>> for ColorSpec {
    fn from(property: Property<Option<ColorValue>>) -> Self {
        Self::Dynamic(property)
    }
}
