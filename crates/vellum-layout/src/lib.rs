//! Layout constraints for the Vellum scene graph.
//!
//! - **Nodes** - [`LayoutNode`] exposes observable bounds, visibility and
//!   optional minimum sizes, plus a single-owner claim marker
//! - **Constraints** - [`LayoutConstraint`] runs a [`LayoutAlgorithm`] over
//!   its nodes, coalescing layout attempts made during layout into bounded
//!   retries
//! - **Algorithms** - [`StackLayout`] stacks nodes along an axis

pub mod constraint;
pub mod error;
pub mod node;
pub mod stack;

pub use constraint::{LayoutAlgorithm, LayoutConstraint, LayoutState};
pub use error::LayoutError;
pub use node::{Bounds, LayoutNode, OwnerId, SharedNode, Sizing};
pub use stack::{Orientation, StackLayout};
