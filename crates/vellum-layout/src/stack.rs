//! A stacking layout: nodes placed one after another along an axis.

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::constraint::LayoutAlgorithm;
use crate::node::{Bounds, SharedNode};

/// Axis nodes are stacked along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

/// Stacks visible nodes along one axis with fixed spacing, aligned to the
/// start of the cross axis. Resizable nodes are grown to their minimum size;
/// hidden nodes are skipped and keep their bounds. The origin is relative
/// to the constraint's ancestor when it has one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StackLayout {
    /// Stacking axis.
    pub orientation: Orientation,
    /// Gap between consecutive nodes.
    pub spacing: f64,
    /// Top-left corner of the stack, in the ancestor's frame.
    pub origin: (f64, f64),
    /// Size covered by the last layout.
    content_size: (f64, f64),
}

impl StackLayout {
    /// A stack at the origin.
    #[must_use]
    pub fn new(orientation: Orientation, spacing: f64) -> Self {
        Self {
            orientation,
            spacing,
            ..Self::default()
        }
    }

    /// Width and height covered by the nodes placed in the last layout.
    #[must_use]
    pub const fn content_size(&self) -> (f64, f64) {
        self.content_size
    }
}

impl LayoutAlgorithm for StackLayout {
    fn layout(&mut self, nodes: &[SharedNode]) {
        self.layout_in(nodes, None);
    }

    fn layout_in(&mut self, nodes: &[SharedNode], frame: Option<Bounds>) {
        let (frame_x, frame_y) = frame.map_or((0.0, 0.0), |frame| (frame.x, frame.y));
        let (origin_x, origin_y) = (frame_x + self.origin.0, frame_y + self.origin.1);
        let mut cursor = 0.0;
        let mut cross: f64 = 0.0;
        let mut placed = 0usize;

        for node in nodes.iter().filter(|node| node.is_visible()) {
            if placed > 0 {
                cursor += self.spacing;
            }
            let (width, height) = node.preferred_size();
            let bounds = match self.orientation {
                Orientation::Horizontal => {
                    let bounds = Bounds::new(origin_x + cursor, origin_y, width, height);
                    cursor += width;
                    cross = cross.max(height);
                    bounds
                }
                Orientation::Vertical => {
                    let bounds = Bounds::new(origin_x, origin_y + cursor, width, height);
                    cursor += height;
                    cross = cross.max(width);
                    bounds
                }
            };
            node.set_bounds(bounds);
            placed += 1;
        }

        self.content_size = match self.orientation {
            Orientation::Horizontal => (cursor, cross),
            Orientation::Vertical => (cross, cursor),
        };
        tracing::trace!(placed, width = self.content_size.0, height = self.content_size.1, "stacked nodes");
    }
}
