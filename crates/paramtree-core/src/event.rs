//! Change notification bus
//!
//! Every leaf and every group owns a [`Notifier`]. Emitting an event calls the
//! node's own listeners in registration order, then hands a key-qualified copy
//! of the event to the parent node's notifier, all the way up to the root.
//!
//! ```text
//! leaf.assign(v) → leaf listeners → group listeners ("key") → root listeners ("group.key")
//! ```
//!
//! Dispatch is synchronous and re-entrant: a listener may write to the tree
//! while it is being notified. The listener list is snapshotted before each
//! dispatch, so listeners added or removed during a dispatch take effect from
//! the next one. Nothing here breaks a listener → write → listener cycle; that
//! is what the provenance tag on [`ChangeEvent`] is for.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::value::Value;

/// Nested dispatch depth past which a warning is logged
const REENTRY_WARN_DEPTH: usize = 32;

/// A change notification
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Path of the changed leaf relative to the node being observed
    ///
    /// Empty when observed on the leaf itself.
    pub key: String,
    /// New value of the leaf
    pub value: Value,
    /// Provenance tag of the write (empty by default)
    ///
    /// Writers that also listen (remote surfaces, storage sync) tag their own
    /// writes so they can recognize and skip the echo.
    pub origin: String,
}

impl ChangeEvent {
    /// Create an event with an empty key
    pub fn new(value: Value, origin: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            value,
            origin: origin.into(),
        }
    }

    /// Copy of this event as seen one level up, under `key`
    pub fn qualified(&self, key: &str) -> Self {
        let key = if self.key.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", key, self.key)
        };
        Self {
            key,
            value: self.value.clone(),
            origin: self.origin.clone(),
        }
    }
}

/// Change listener
///
/// Listeners are compared by identity: unsubscribing requires the same `Rc`
/// (or a clone of it) that was used to subscribe.
pub type Listener = Rc<dyn Fn(&ChangeEvent)>;

/// Wrap a closure as a [`Listener`]
pub fn listener(f: impl Fn(&ChangeEvent) + 'static) -> Listener {
    Rc::new(f)
}

/// Link from a node's notifier to its parent's
struct Upstream {
    parent: Rc<Notifier>,
    key: String,
}

/// Per-node observer list plus the link to the parent node
pub(crate) struct Notifier {
    listeners: RefCell<Vec<Listener>>,
    upstream: RefCell<Option<Upstream>>,
    depth: Cell<usize>,
}

impl Notifier {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            listeners: RefCell::new(Vec::new()),
            upstream: RefCell::new(None),
            depth: Cell::new(0),
        })
    }

    pub fn subscribe(&self, listener: &Listener) {
        self.listeners.borrow_mut().push(Rc::clone(listener));
    }

    /// Remove a listener by identity. Returns true if it was registered.
    pub fn unsubscribe(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| !Rc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Forward every event emitted here to `parent`, qualified by `key`
    pub fn attach(&self, parent: &Rc<Notifier>, key: &str) {
        *self.upstream.borrow_mut() = Some(Upstream {
            parent: Rc::clone(parent),
            key: key.to_string(),
        });
    }

    pub fn emit(&self, event: &ChangeEvent) {
        let guard = DepthGuard::enter(&self.depth);
        let depth = guard.depth;
        if depth == REENTRY_WARN_DEPTH {
            log::warn!(
                "notify: re-entrant dispatch reached depth {} (key '{}', origin '{}'); \
                 a listener may be writing back without checking the origin tag",
                depth,
                event.key,
                event.origin
            );
        }

        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in &listeners {
            listener(event);
        }

        let upstream = self
            .upstream
            .borrow()
            .as_ref()
            .map(|u| (Rc::clone(&u.parent), u.key.clone()));
        if let Some((parent, key)) = upstream {
            parent.emit(&event.qualified(&key));
        }
    }
}

/// Holds one level of dispatch depth; released on drop, including unwinds
struct DepthGuard<'a> {
    counter: &'a Cell<usize>,
    depth: usize,
}

impl<'a> DepthGuard<'a> {
    fn enter(counter: &'a Cell<usize>) -> Self {
        let depth = counter.get() + 1;
        counter.set(depth);
        Self { counter, depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.counter.set(self.depth - 1);
    }
}
