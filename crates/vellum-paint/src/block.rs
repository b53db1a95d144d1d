//! SVG blocks: reference-counted scopes for shared paint definitions.
//!
//! A block owns a `<g>` group with a `<defs>` child. Every drawable rendered
//! inside the group that uses a gradient or pattern holds a [`PaintLease`]
//! on it; the definition is created on the first lease and removed when the
//! last lease is released.
//!
//! # Ordering
//!
//! Callers that swap one set of paints for an overlapping one must acquire
//! the new leases before releasing the old ones, otherwise a paint used by
//! both sets would be torn down and rebuilt in between. Dropping a lease
//! releases it, so the same holds for leases that simply go out of scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use vellum_common::PipelineConfig;
use vellum_common::warning::warn_once;
use vellum_dom::{ElementId, SharedDocument};

use crate::defs::{DirtyQueue, SvgPaintDef};
use crate::paint::{Paint, PaintId};
use crate::resolve::definition_id;
use crate::stop::SvgGradientStop;

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`SvgBlock`], embedded in scoped paint references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block shared by the drawables rendered into it.
pub type SharedBlock = Rc<RefCell<SvgBlock>>;

/// One reference to a shareable paint held in a specific block.
///
/// Leases are not `Clone`: each one accounts for exactly one reference. It
/// is handed back with [`SvgBlock::release`], or by dropping the lease,
/// which releases it in the block it came from if that block is still
/// alive and not borrowed.
#[must_use = "dropping a paint lease releases its reference"]
#[derive(Debug)]
pub struct PaintLease {
    paint: PaintId,
    block: BlockId,
    scope: Weak<RefCell<SvgBlock>>,
    released: bool,
}

impl PaintLease {
    /// The leased paint.
    #[must_use]
    pub const fn paint_id(&self) -> PaintId {
        self.paint
    }

    /// The block the reference is held in.
    #[must_use]
    pub const fn block_id(&self) -> BlockId {
        self.block
    }
}

impl PartialEq for PaintLease {
    fn eq(&self, other: &Self) -> bool {
        self.paint == other.paint && self.block == other.block
    }
}

impl Eq for PaintLease {}

impl Drop for PaintLease {
    fn drop(&mut self) {
        if self.released || std::thread::panicking() {
            return;
        }
        self.released = true;
        // A block that is gone or disposed has already removed its definitions.
        let Some(scope) = self.scope.upgrade() else {
            return;
        };
        let Ok(mut block) = scope.try_borrow_mut() else {
            let _ = warn_once(
                "Paint",
                &format!(
                    "lease on {} dropped while block {} was borrowed; the definition will leak",
                    self.paint, self.block
                ),
            );
            return;
        };
        if !block.disposed {
            block.decrement(self.paint);
        }
    }
}

#[derive(Debug)]
struct PaintEntry {
    count: usize,
    def: SvgPaintDef,
}

/// A resource scope holding reference-counted paint definitions.
#[derive(Debug)]
pub struct SvgBlock {
    id: BlockId,
    this: Weak<RefCell<SvgBlock>>,
    document: SharedDocument,
    group: ElementId,
    defs: ElementId,
    entries: HashMap<PaintId, PaintEntry>,
    dirty_gradients: DirtyQueue,
    stop_pool: Vec<SvgGradientStop>,
    stop_pool_capacity: usize,
    disposed: bool,
}

impl SvgBlock {
    /// Create a block with a detached `<g>` group and its `<defs>`.
    #[must_use]
    pub fn new(document: SharedDocument, config: &PipelineConfig) -> Self {
        let id = BlockId(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed));
        let (group, defs) = {
            let mut doc = document.borrow_mut();
            let group = doc.create_element("g");
            doc.set_attribute(group, "data-block", &id.to_string());
            let defs = doc.create_element("defs");
            doc.append_child(group, defs);
            (group, defs)
        };
        tracing::debug!(block = id.0, "created svg block");
        Self {
            id,
            this: Weak::new(),
            document,
            group,
            defs,
            entries: HashMap::new(),
            dirty_gradients: DirtyQueue::default(),
            stop_pool: Vec::new(),
            stop_pool_capacity: config.stop_pool_capacity,
            disposed: false,
        }
    }

    /// Create a block behind a shared handle. Leases taken from a shared
    /// block release themselves when dropped.
    #[must_use]
    pub fn shared(document: SharedDocument, config: &PipelineConfig) -> SharedBlock {
        Rc::new_cyclic(|this| {
            let mut block = Self::new(document, config);
            block.this = this.clone();
            RefCell::new(block)
        })
    }

    /// This block's identity.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// The `<g>` element drawables of this block render into.
    #[must_use]
    pub const fn group(&self) -> ElementId {
        self.group
    }

    /// The `<defs>` element holding shared definitions.
    #[must_use]
    pub const fn defs(&self) -> ElementId {
        self.defs
    }

    /// The document this block writes into.
    #[must_use]
    pub const fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Take one reference to a shareable paint, creating its definition on
    /// the first reference. Returns `None` for paints that need no
    /// definition (colors and raw tokens).
    pub fn acquire(&mut self, paint: &Paint) -> Option<PaintLease> {
        debug_assert!(!self.disposed, "paint acquired in a disposed block");
        let paint_id = paint.shareable_id()?;

        if let Some(entry) = self.entries.get_mut(&paint_id) {
            entry.count += 1;
        } else {
            let def_id = definition_id(paint_id, Some(self.id));
            let mut doc = self.document.borrow_mut();
            let def = SvgPaintDef::create(
                &mut doc,
                paint,
                &def_id,
                Rc::clone(&self.dirty_gradients),
                &mut self.stop_pool,
            )?;
            doc.append_child(self.defs, def.element());
            drop(doc);

            tracing::debug!(block = self.id.0, paint = paint_id.0, "added paint definition");
            let _ = self.entries.insert(paint_id, PaintEntry { count: 1, def });
        }

        Some(PaintLease {
            paint: paint_id,
            block: self.id,
            scope: self.this.clone(),
            released: false,
        })
    }

    /// Return one reference, removing the definition with the last one.
    pub fn release(&mut self, mut lease: PaintLease) {
        lease.released = true;
        debug_assert_eq!(lease.block, self.id, "lease released into the wrong block");
        self.decrement(lease.paint);
    }

    fn decrement(&mut self, paint: PaintId) {
        debug_assert!(
            self.entries.contains_key(&paint),
            "released a paint with no references"
        );

        let Some(entry) = self.entries.get_mut(&paint) else {
            return;
        };
        entry.count -= 1;
        if entry.count > 0 {
            return;
        }
        if let Some(entry) = self.entries.remove(&paint) {
            let mut doc = self.document.borrow_mut();
            entry
                .def
                .dispose(&mut doc, &mut self.stop_pool, self.stop_pool_capacity);
            tracing::debug!(block = self.id.0, paint = paint.0, "removed paint definition");
        }
    }

    /// Number of references currently held on `paint`.
    #[must_use]
    pub fn ref_count(&self, paint: PaintId) -> usize {
        self.entries.get(&paint).map_or(0, |entry| entry.count)
    }

    /// Number of distinct paints with a definition in this block.
    #[must_use]
    pub fn paint_count(&self) -> usize {
        self.entries.len()
    }

    /// The rendered definition of `paint`, if it is referenced here.
    #[must_use]
    pub fn definition(&self, paint: PaintId) -> Option<&SvgPaintDef> {
        self.entries.get(&paint).map(|entry| &entry.def)
    }

    /// Number of stop proxies waiting in the pool.
    #[must_use]
    pub fn pooled_stops(&self) -> usize {
        self.stop_pool.len()
    }

    /// Re-render gradients whose stop colors changed. Returns the number of
    /// stops written.
    pub fn update(&mut self) -> usize {
        let dirty = std::mem::take(&mut *self.dirty_gradients.borrow_mut());
        if dirty.is_empty() {
            return 0;
        }
        let mut doc = self.document.borrow_mut();
        let mut written = 0;
        for paint in dirty {
            // Definitions removed since they were queued are skipped.
            if let Some(PaintEntry {
                def: SvgPaintDef::Gradient(gradient),
                ..
            }) = self.entries.get_mut(&paint)
            {
                written += gradient.update(&mut doc);
            }
        }
        tracing::trace!(block = self.id.0, written, "flushed dirty gradients");
        written
    }

    /// Tear down the block. Outstanding definitions are removed with a
    /// warning; leases still held afterwards drop without effect.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if !self.entries.is_empty() {
            let _ = warn_once(
                "Paint",
                &format!(
                    "block {} disposed with {} referenced paints",
                    self.id,
                    self.entries.len()
                ),
            );
        }
        let mut doc = self.document.borrow_mut();
        for (_, entry) in self.entries.drain() {
            entry.def.dispose(&mut doc, &mut self.stop_pool, 0);
        }
        for stop in self.stop_pool.drain(..) {
            doc.free(stop.element());
        }
        doc.free(self.group);
        tracing::debug!(block = self.id.0, "disposed svg block");
    }

    /// Whether [`SvgBlock::dispose`] has been called.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }
}
