//! Observable values and notification channels.
//!
//! The rendering core consumes two small interfaces from the surrounding
//! application: an observable value container ([`Property`]) that reports
//! `(new, old)` pairs to its listeners, and an argument-carrying notification
//! channel ([`Emitter`]).
//!
//! # Reentrancy
//!
//! Everything here is single-threaded. Listeners are invoked from a snapshot
//! of the listener list taken when notification starts, and no interior
//! borrow is held while a listener runs, so a listener may freely read or
//! write the value that notified it, or attach and detach other listeners.
//! A listener removed mid-notification is not invoked afterwards.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

thread_local! {
    static NEXT_LISTENER_ID: Cell<u64> = const { Cell::new(1) };
}

/// Handle returned when attaching a listener; used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        NEXT_LISTENER_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

/// Ordered listener storage shared by [`Property`] and [`Emitter`].
struct ListenerList<F: ?Sized> {
    entries: RefCell<Vec<(ListenerId, Rc<F>)>>,
}

impl<F: ?Sized> ListenerList<F> {
    const fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, listener: Rc<F>) -> ListenerId {
        let id = ListenerId::next();
        self.entries.borrow_mut().push((id, listener));
        id
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.entries.borrow().iter().any(|(entry, _)| *entry == id)
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn snapshot(&self) -> Vec<(ListenerId, Rc<F>)> {
        self.entries.borrow().clone()
    }
}

// ========== Emitter ==========

/// A notification channel carrying an argument of type `A`.
pub struct Emitter<A: 'static = ()> {
    listeners: ListenerList<dyn Fn(&A)>,
    disposed: Cell<bool>,
}

impl<A: 'static> Emitter<A> {
    /// Create an emitter with no listeners.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            listeners: ListenerList::new(),
            disposed: Cell::new(false),
        }
    }

    /// Attach a listener, returning the handle needed to detach it.
    pub fn add_listener(&self, listener: impl Fn(&A) + 'static) -> ListenerId {
        debug_assert!(!self.disposed.get(), "listener added to a disposed emitter");
        self.listeners.add(Rc::new(listener))
    }

    /// Detach a listener. Returns whether it was attached.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Whether the given listener is currently attached.
    #[must_use]
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify every attached listener.
    pub fn emit(&self, args: &A) {
        for (id, listener) in self.listeners.snapshot() {
            if self.listeners.contains(id) {
                listener(args);
            }
        }
    }

    /// Detach all listeners and refuse new ones.
    pub fn dispose(&self) {
        self.listeners.clear();
        self.disposed.set(true);
    }

    /// Whether [`Emitter::dispose`] has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl<A: 'static> Default for Emitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Emitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

// ========== Property ==========

struct PropertyInner<T: 'static> {
    value: RefCell<T>,
    listeners: ListenerList<dyn Fn(&T, &T)>,
}

/// A shared, observable value container.
///
/// Cloning a `Property` clones the handle, not the value: all clones observe
/// and mutate the same container. Equality between two handles is identity.
pub struct Property<T: 'static> {
    inner: Rc<PropertyInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// Create a container holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                value: RefCell::new(value),
                listeners: ListenerList::new(),
            }),
        }
    }

    /// Read the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value, notifying listeners with `(new, old)` if it changed.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        let old = self.inner.value.replace(value);
        let new = self.get();
        for (id, listener) in self.inner.listeners.snapshot() {
            if self.inner.listeners.contains(id) {
                listener(&new, &old);
            }
        }
    }

    /// Attach a listener that fires on future changes only.
    pub fn lazy_link(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.inner.listeners.add(Rc::new(listener))
    }

    /// Detach a listener. Returns whether it was attached.
    pub fn unlink(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Whether the given listener is currently attached.
    #[must_use]
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.contains(id)
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<T: 'static> Property<T> {
    /// Whether two handles refer to the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}
