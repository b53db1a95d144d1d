//! Layout constraints with reentrancy protection.
//!
//! A [`LayoutConstraint`] positions a set of tracked nodes with a
//! [`LayoutAlgorithm`]. Layout writes node bounds, and bounds changes are
//! exactly what a constraint listens to, so a pass routinely re-triggers
//! itself. Those nested attempts never run layout recursively: while the
//! constraint is locked they only record that another pass is needed, and
//! the running pass loops until no attempt arrived during it.
//!
//! # State
//!
//! ```text
//!   Idle ──update_layout──▶ Running ──nested attempt──▶ RunningWithPendingRetry
//!    ▲                         │  ▲                             │
//!    └──────── no attempt ─────┘  └────────── next pass ────────┘
//! ```
//!
//! The loop is bounded by `max_layout_retries`; a constraint that keeps
//! re-triggering itself fails with [`LayoutError::RunawayLayout`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;
use strum_macros::Display;
use vellum_common::{Emitter, ListenerId, PipelineConfig};

use crate::error::LayoutError;
use crate::node::{Bounds, OwnerId, SharedNode};

/// Where a constraint is in its update loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LayoutState {
    /// No layout pass is running.
    Idle,
    /// A layout pass is running.
    Running,
    /// A layout pass is running and another one was requested during it.
    RunningWithPendingRetry,
}

/// Computes positions for the nodes of one container.
pub trait LayoutAlgorithm {
    /// Position `nodes`. Setting node bounds from here re-triggers the
    /// constraint, which coalesces the attempt into another pass.
    fn layout(&mut self, nodes: &[SharedNode]);

    /// Position `nodes` inside `frame`, the bounds of the constraint's
    /// ancestor node. Algorithms without a notion of frame ignore it.
    fn layout_in(&mut self, nodes: &[SharedNode], _frame: Option<Bounds>) {
        self.layout(nodes);
    }
}

impl<F: FnMut(&[SharedNode])> LayoutAlgorithm for F {
    fn layout(&mut self, nodes: &[SharedNode]) {
        self(nodes);
    }
}

/// Listeners attached to one tracked node.
struct Tracked {
    node: SharedNode,
    bounds: ListenerId,
    visible: ListenerId,
    sizing: Option<[ListenerId; 3]>,
    claimed: bool,
}

impl Tracked {
    fn detach(&self, owner: OwnerId) {
        let _ = self.node.bounds_property().unlink(self.bounds);
        let _ = self.node.visible_property().unlink(self.visible);
        if let (Some(sizing), Some([min_width, min_height, resizable])) =
            (self.node.sizing(), self.sizing)
        {
            let _ = sizing.min_width.unlink(min_width);
            let _ = sizing.min_height.unlink(min_height);
            let _ = sizing.resizable.unlink(resizable);
        }
        if self.claimed {
            let _ = self.node.release(owner);
        }
    }
}

struct ConstraintInner<A> {
    owner: OwnerId,
    algorithm: RefCell<A>,
    tracked: RefCell<Vec<Tracked>>,
    ancestor: RefCell<Option<(SharedNode, ListenerId)>>,
    lock_depth: Cell<usize>,
    running: Cell<bool>,
    attempted_during_lock: Cell<bool>,
    enabled: Cell<bool>,
    passes: Cell<usize>,
    finished_layout: Emitter<()>,
    max_retries: usize,
    strict: bool,
    disposed: Cell<bool>,
}

impl<A: LayoutAlgorithm> ConstraintInner<A> {
    fn is_locked(&self) -> bool {
        self.lock_depth.get() > 0
    }

    fn nodes(&self) -> Vec<SharedNode> {
        self.tracked
            .borrow()
            .iter()
            .map(|tracked| Rc::clone(&tracked.node))
            .collect()
    }

    fn frame(&self) -> Option<Bounds> {
        self.ancestor.borrow().as_ref().map(|(node, _)| node.bounds())
    }

    fn detach_ancestor(&self) {
        let previous = self.ancestor.borrow_mut().take();
        if let Some((node, listener)) = previous {
            let _ = node.bounds_property().unlink(listener);
        }
    }

    fn update_layout(&self) -> Result<(), LayoutError> {
        if self.disposed.get() {
            return Ok(());
        }
        if self.is_locked() {
            self.attempted_during_lock.set(true);
            return Ok(());
        }

        self.lock_depth.set(self.lock_depth.get() + 1);
        self.running.set(true);
        let mut attempts = 0;
        let result = loop {
            if attempts >= self.max_retries {
                break Err(LayoutError::RunawayLayout { attempts });
            }
            self.attempted_during_lock.set(false);
            let nodes = self.nodes();
            let frame = self.frame();
            self.algorithm.borrow_mut().layout_in(&nodes, frame);
            attempts += 1;
            self.passes.set(self.passes.get() + 1);

            if !self.attempted_during_lock.get() {
                break Ok(());
            }
            tracing::trace!(owner = self.owner.0, attempts, "layout attempted during lock, retrying");
        };
        self.running.set(false);
        self.attempted_during_lock.set(false);
        self.lock_depth.set(self.lock_depth.get() - 1);

        if result.is_ok() {
            tracing::debug!(owner = self.owner.0, attempts, "layout finished");
            self.finished_layout.emit(&());
        }
        result
    }

    fn update_layout_automatically(&self) {
        if !self.enabled.get() {
            return;
        }
        if let Err(error) = self.update_layout() {
            tracing::error!(owner = self.owner.0, %error, "automatic layout failed");
        }
    }
}

/// Positions a set of nodes and keeps them positioned as they change.
pub struct LayoutConstraint<A: LayoutAlgorithm + 'static> {
    inner: Rc<ConstraintInner<A>>,
}

impl<A: LayoutAlgorithm + 'static> LayoutConstraint<A> {
    /// An enabled constraint with no nodes.
    #[must_use]
    pub fn new(algorithm: A, config: &PipelineConfig) -> Self {
        Self {
            inner: Rc::new(ConstraintInner {
                owner: OwnerId::next(),
                algorithm: RefCell::new(algorithm),
                tracked: RefCell::new(Vec::new()),
                ancestor: RefCell::new(None),
                lock_depth: Cell::new(0),
                running: Cell::new(false),
                attempted_during_lock: Cell::new(false),
                enabled: Cell::new(true),
                passes: Cell::new(0),
                finished_layout: Emitter::new(),
                max_retries: config.max_layout_retries,
                strict: config.strict_assertions,
                disposed: Cell::new(false),
            }),
        }
    }

    /// The id this constraint claims nodes with.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.inner.owner
    }

    /// Current loop state.
    #[must_use]
    pub fn state(&self) -> LayoutState {
        match (self.inner.running.get(), self.inner.attempted_during_lock.get()) {
            (false, _) => LayoutState::Idle,
            (true, false) => LayoutState::Running,
            (true, true) => LayoutState::RunningWithPendingRetry,
        }
    }

    /// Whether layout is locked, by a running pass or by [`Self::lock`].
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Total layout passes run so far.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.inner.passes.get()
    }

    /// Emits after every completed [`Self::update_layout`].
    #[must_use]
    pub fn finished_layout(&self) -> &Emitter<()> {
        &self.inner.finished_layout
    }

    /// The tracked nodes, in the order they were added.
    #[must_use]
    pub fn nodes(&self) -> Vec<SharedNode> {
        self.inner.nodes()
    }

    /// Change the algorithm's parameters, then lay out again.
    ///
    /// Must not be called from within a layout pass.
    pub fn with_algorithm_mut<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        let result = f(&mut self.inner.algorithm.borrow_mut());
        self.inner.update_layout_automatically();
        result
    }

    // ========== nodes ==========

    /// Track `node`: its bounds, visibility and sizing changes re-trigger
    /// layout. With `add_lock`, also claim sole management of the node.
    ///
    /// # Errors
    ///
    /// [`LayoutError::AlreadyListened`] if the node is already tracked, and
    /// [`LayoutError::AlreadyManaged`] if `add_lock` is set and another
    /// constraint holds the node. Both are detected before any listener is
    /// attached.
    pub fn add_node(&self, node: &SharedNode, add_lock: bool) -> Result<(), LayoutError> {
        let inner = &self.inner;
        let listened = inner
            .tracked
            .borrow()
            .iter()
            .any(|tracked| Rc::ptr_eq(&tracked.node, node));
        if listened {
            debug_assert!(!inner.strict, "node is already listened to by this constraint");
            return Err(LayoutError::AlreadyListened {
                node: node.name().to_string(),
            });
        }
        if add_lock && !node.claim(inner.owner) {
            debug_assert!(!inner.strict, "node is already managed by another layout constraint");
            return Err(LayoutError::AlreadyManaged {
                node: node.name().to_string(),
            });
        }

        let weak = Rc::downgrade(inner);
        let bounds = node.bounds_property().lazy_link(trigger(&weak));
        let visible = node.visible_property().lazy_link(trigger(&weak));
        let sizing = node.sizing().map(|sizing| {
            [
                sizing.min_width.lazy_link(trigger(&weak)),
                sizing.min_height.lazy_link(trigger(&weak)),
                sizing.resizable.lazy_link(trigger(&weak)),
            ]
        });

        inner.tracked.borrow_mut().push(Tracked {
            node: Rc::clone(node),
            bounds,
            visible,
            sizing,
            claimed: add_lock,
        });
        tracing::trace!(owner = inner.owner.0, node = node.name(), "tracking layout node");
        Ok(())
    }

    /// Stop tracking `node`, releasing the claim if this constraint holds it.
    ///
    /// # Errors
    ///
    /// [`LayoutError::NotListened`] if the node is not tracked.
    pub fn remove_node(&self, node: &SharedNode) -> Result<(), LayoutError> {
        let removed = {
            let mut tracked = self.inner.tracked.borrow_mut();
            let position = tracked
                .iter()
                .position(|tracked| Rc::ptr_eq(&tracked.node, node));
            position.map(|position| tracked.remove(position))
        };
        let Some(removed) = removed else {
            return Err(LayoutError::NotListened {
                node: node.name().to_string(),
            });
        };
        removed.detach(self.inner.owner);
        Ok(())
    }

    // ========== coordinate frame ==========

    /// Lay out in the coordinate frame of `ancestor`, or in absolute
    /// coordinates with `None`. The ancestor is listened to but never
    /// claimed: moving it lays the tracked nodes out again.
    pub fn set_ancestor(&self, ancestor: Option<&SharedNode>) {
        let inner = &self.inner;
        if inner.disposed.get() {
            return;
        }
        inner.detach_ancestor();
        if let Some(node) = ancestor {
            let listener = node.bounds_property().lazy_link(trigger(&Rc::downgrade(inner)));
            *inner.ancestor.borrow_mut() = Some((Rc::clone(node), listener));
        }
        inner.update_layout_automatically();
    }

    /// The node whose bounds set the coordinate frame, if any.
    #[must_use]
    pub fn ancestor(&self) -> Option<SharedNode> {
        self.inner
            .ancestor
            .borrow()
            .as_ref()
            .map(|(node, _)| Rc::clone(node))
    }

    // ========== layout ==========

    /// Lay out now, unless a pass is already running or the constraint is
    /// locked, in which case the attempt is recorded and served by the
    /// running pass or by the final [`Self::unlock`].
    ///
    /// # Errors
    ///
    /// [`LayoutError::RunawayLayout`] if layout was still being
    /// re-triggered after `max_layout_retries` passes.
    pub fn update_layout(&self) -> Result<(), LayoutError> {
        self.inner.update_layout()
    }

    /// [`Self::update_layout`] if the constraint is enabled, logging
    /// failures instead of returning them.
    pub fn update_layout_automatically(&self) {
        self.inner.update_layout_automatically();
    }

    /// Whether automatic layout is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Enable or disable automatic layout. Enabling lays out immediately.
    pub fn set_enabled(&self, enabled: bool) {
        if self.inner.enabled.replace(enabled) != enabled && enabled {
            self.inner.update_layout_automatically();
        }
    }

    /// Defer layout until the matching [`Self::unlock`]. Locks nest.
    pub fn lock(&self) {
        self.inner.lock_depth.set(self.inner.lock_depth.get() + 1);
    }

    /// Release one [`Self::lock`]. Releasing the last one runs the layout
    /// that was attempted while locked, if any.
    ///
    /// # Errors
    ///
    /// Whatever that deferred [`Self::update_layout`] returns.
    pub fn unlock(&self) -> Result<(), LayoutError> {
        let inner = &self.inner;
        debug_assert!(inner.lock_depth.get() > 0, "unlocked a layout constraint that was not locked");
        inner.lock_depth.set(inner.lock_depth.get().saturating_sub(1));
        if !inner.is_locked() && !inner.running.get() && inner.attempted_during_lock.replace(false) {
            return inner.update_layout();
        }
        Ok(())
    }

    // ========== disposal ==========

    /// Detach from every node and the ancestor, release claims and dispose
    /// the finished layout emitter. Repeated calls are ignored.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.replace(true) {
            return;
        }
        let tracked = std::mem::take(&mut *inner.tracked.borrow_mut());
        for node in &tracked {
            node.detach(inner.owner);
        }
        inner.detach_ancestor();
        inner.finished_layout.dispose();
        tracing::debug!(owner = inner.owner.0, nodes = tracked.len(), "disposed layout constraint");
    }

    /// Whether [`Self::dispose`] has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<A: LayoutAlgorithm + 'static> Drop for LayoutConstraint<A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<A: LayoutAlgorithm + 'static> std::fmt::Debug for LayoutConstraint<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutConstraint")
            .field("owner", &self.inner.owner)
            .field("nodes", &self.inner.tracked.borrow().len())
            .field("ancestor", &self.ancestor().map(|node| node.name().to_string()))
            .field("state", &self.state())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

/// A property listener that re-triggers automatic layout while the
/// constraint is alive.
fn trigger<A: LayoutAlgorithm + 'static, T: 'static>(
    weak: &Weak<ConstraintInner<A>>,
) -> impl Fn(&T, &T) + 'static {
    let weak = Weak::clone(weak);
    move |_, _| {
        if let Some(inner) = weak.upgrade() {
            inner.update_layout_automatically();
        }
    }
}
