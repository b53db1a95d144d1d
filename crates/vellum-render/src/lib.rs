//! Incremental SVG rendering for the Vellum pipeline.
//!
//! This crate keeps a persistent SVG output tree in sync with a changing set
//! of visual nodes without rebuilding it:
//! - **Drawables** - [`SvgSelfDrawable`] mirrors one shape into one element,
//!   tracking [`DirtyFlags`] and writing only what changed
//! - **Sequence** - [`DrawableSequence`] holds drawables with their old and
//!   new orderings
//! - **Change intervals** - [`ChangeInterval`] bounds one changed run of the
//!   sequence; [`ChangeIntervalList`] pools them per pass
//! - **Surface** - [`RenderSurface::sync`] runs one synchronization pass and
//!   reports what it did in a [`SyncReport`]

pub mod change_interval;
pub mod dirty;
pub mod drawable;
pub mod self_drawable;
pub mod sequence;
pub mod shapes;
pub mod surface;

pub use change_interval::{ChangeInterval, ChangeIntervalList, IntervalId};
pub use dirty::DirtyFlags;
pub use drawable::{Drawable, SharedDrawable};
pub use self_drawable::SvgSelfDrawable;
pub use sequence::{DrawableId, DrawableSequence};
pub use shapes::{Circle, Line, Path, Rectangle, SvgShape};
pub use surface::{RenderSurface, SyncReport};
