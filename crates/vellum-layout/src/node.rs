//! Nodes positioned by layout constraints.
//!
//! A [`LayoutNode`] exposes its bounds and visibility as observable
//! [`Property`] values, and optionally a [`Sizing`] with minimum sizes and a
//! resizability switch. It also carries a claim marker: at most one
//! constraint may manage a node's position at a time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use vellum_common::Property;

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a layout constraint, used to claim nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OwnerId(pub u64);

impl OwnerId {
    /// A process-unique owner id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constraint{}", self.0)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// A rectangle from position and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The same size at another position.
    #[must_use]
    pub const fn moved_to(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }
}

/// Minimum-size information of a node that layout may resize.
#[derive(Debug, Clone)]
pub struct Sizing {
    /// Smallest width layout may give the node.
    pub min_width: Property<f64>,
    /// Smallest height layout may give the node.
    pub min_height: Property<f64>,
    /// Whether layout may resize the node at all.
    pub resizable: Property<bool>,
}

/// A node whose position is managed by a layout constraint.
pub struct LayoutNode {
    name: String,
    bounds: Property<Bounds>,
    visible: Property<bool>,
    sizing: Option<Sizing>,
    owner: Cell<Option<OwnerId>>,
}

/// Nodes are shared between their container and the scene.
pub type SharedNode = Rc<LayoutNode>;

impl LayoutNode {
    /// A visible, fixed-size node.
    #[must_use]
    pub fn new(name: &str, bounds: Bounds) -> Self {
        Self {
            name: name.to_string(),
            bounds: Property::new(bounds),
            visible: Property::new(true),
            sizing: None,
            owner: Cell::new(None),
        }
    }

    /// A visible, resizable node with minimum sizes.
    #[must_use]
    pub fn resizable(name: &str, bounds: Bounds, min_width: f64, min_height: f64) -> Self {
        Self {
            sizing: Some(Sizing {
                min_width: Property::new(min_width),
                min_height: Property::new(min_height),
                resizable: Property::new(true),
            }),
            ..Self::new(name, bounds)
        }
    }

    /// Wrap the node for sharing.
    #[must_use]
    pub fn shared(self) -> SharedNode {
        Rc::new(self)
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The observable bounds.
    #[must_use]
    pub const fn bounds_property(&self) -> &Property<Bounds> {
        &self.bounds
    }

    /// Current bounds.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds.get()
    }

    /// Replace the bounds, notifying listeners if they changed.
    pub fn set_bounds(&self, bounds: Bounds) {
        self.bounds.set(bounds);
    }

    /// The observable visibility.
    #[must_use]
    pub const fn visible_property(&self) -> &Property<bool> {
        &self.visible
    }

    /// Whether the node takes part in layout.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Show or hide the node.
    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    /// Sizing information, for nodes that support resizing.
    #[must_use]
    pub const fn sizing(&self) -> Option<&Sizing> {
        self.sizing.as_ref()
    }

    /// The size layout should give the node: its current size, grown to
    /// the minimum size when the node is resizable.
    #[must_use]
    pub fn preferred_size(&self) -> (f64, f64) {
        let bounds = self.bounds();
        match &self.sizing {
            Some(sizing) if sizing.resizable.get() => (
                bounds.width.max(sizing.min_width.get()),
                bounds.height.max(sizing.min_height.get()),
            ),
            _ => (bounds.width, bounds.height),
        }
    }

    // ========== claim ==========

    /// The constraint currently managing this node.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner.get()
    }

    /// Claim management for `owner`. Fails if another owner holds it.
    #[must_use]
    pub fn claim(&self, owner: OwnerId) -> bool {
        match self.owner.get() {
            Some(current) if current != owner => false,
            _ => {
                self.owner.set(Some(owner));
                true
            }
        }
    }

    /// Give up management. Only the current claimant can release; returns
    /// whether the claim was released.
    pub fn release(&self, owner: OwnerId) -> bool {
        if self.owner.get() == Some(owner) {
            self.owner.set(None);
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutNode")
            .field("name", &self.name)
            .field("bounds", &self.bounds())
            .field("visible", &self.is_visible())
            .field("owner", &self.owner.get())
            .finish_non_exhaustive()
    }
}
