//! Paint handling for the Vellum rendering pipeline.
//!
//! This crate turns fill and stroke specifications into SVG output:
//! - **Paint values** - [`Color`], [`MutableColor`], [`Gradient`], [`Pattern`]
//!   and raw style tokens, wrapped in a [`PaintSpec`] that may be observed
//! - **Resolution** - [`paint_to_svg_style`] maps a paint to a `fill`/`stroke`
//!   value; shareable paints resolve to block-scoped `url(#..)` references
//! - **Blocks** - [`SvgBlock`] reference-counts shared definitions through
//!   typed [`PaintLease`] handles
//! - **Stops** - [`SvgGradientStop`] mirrors one, possibly dynamic, stop color
//! - **Paint state** - [`PaintState`] holds one drawable's resolved styles and
//!   leases
//!
//! # Threading
//!
//! Everything here is single-threaded. Listeners installed on observable
//! values only flip flags and enqueue work; document writes happen in the
//! explicit update methods, which take the document or borrow it from the
//! block.

pub mod block;
pub mod color;
pub mod defs;
pub mod line;
pub mod observer;
pub mod paint;
pub mod resolve;
pub mod state;
pub mod stop;

pub use block::{BlockId, PaintLease, SharedBlock, SvgBlock};
pub use color::{Color, ColorParseError, ColorSpec, ColorValue, MutableColor};
pub use defs::{GradientSignal, SvgGradient, SvgPaintDef, SvgPattern};
pub use line::{LineCap, LineJoin, LineStyles};
pub use observer::PaintObserver;
pub use paint::{Gradient, GradientKind, GradientStop, Paint, PaintId, PaintSpec, Pattern};
pub use resolve::{NO_BLOCK, definition_id, format_fixed, paint_to_svg_style};
pub use state::PaintState;
pub use stop::SvgGradientStop;
