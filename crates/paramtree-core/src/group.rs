//! Parameter groups: the tree nodes
//!
//! A [`ParamGroup`] owns an ordered mapping of keys to leaves and nested
//! groups. At construction it names every leaf after its key and links every
//! entry's notifier to its own, so a change anywhere below is re-emitted at
//! this level with the key qualified relative to this group.
//!
//! # Lifecycle
//!
//! ```text
//! GroupBuilder (unattached) ──build()──► Attached ──destroy()/drop──► Destroyed
//! ```
//!
//! Entries are fixed once built; only leaf values change afterwards. Because
//! entries are moved into their group, a group can never contain itself and
//! no entry has two parents.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{validate_key, TreeError, TreeResult};
use crate::event::{Listener, Notifier};
use crate::extension::{Extension, ExtensionRegistry};
use crate::history::UndoHistory;
use crate::param::{ColorParam, NumberParam, Param};
use crate::path::{self, join_path, Node};
use crate::value::{Value, ValueNode, ValueTree};

/// Provenance tag of writes made by undo and redo
pub const HISTORY_ORIGIN: &str = "history";

/// A group entry: leaf or nested group
#[derive(Debug)]
pub enum Entry {
    Param(Param),
    Group(ParamGroup),
}

impl From<Param> for Entry {
    fn from(p: Param) -> Self {
        Self::Param(p)
    }
}

impl From<NumberParam> for Entry {
    fn from(p: NumberParam) -> Self {
        Self::Param(Param::Number(p))
    }
}

impl From<ColorParam> for Entry {
    fn from(p: ColorParam) -> Self {
        Self::Param(Param::Color(p))
    }
}

impl From<ParamGroup> for Entry {
    fn from(g: ParamGroup) -> Self {
        Self::Group(g)
    }
}

/// Lifecycle state of a constructed group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Listeners wired, history and extensions active
    Attached,
    /// Extensions detached; history operations are no-ops
    Destroyed,
}

/// Ordered definition of a group, before it is attached
#[derive(Debug, Default)]
pub struct GroupBuilder {
    entries: Vec<(String, Entry)>,
    history_limit: Option<usize>,
}

impl GroupBuilder {
    /// Add an entry of any kind
    pub fn entry(mut self, key: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.entries.push((key.into(), entry.into()));
        self
    }

    pub fn number(self, key: impl Into<String>, param: NumberParam) -> Self {
        self.entry(key, param)
    }

    pub fn color(self, key: impl Into<String>, param: ColorParam) -> Self {
        self.entry(key, param)
    }

    pub fn group(self, key: impl Into<String>, group: ParamGroup) -> Self {
        self.entry(key, group)
    }

    /// Keep at most `limit` undo frames
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Attach every entry and produce the group
    ///
    /// Fails on an empty key, a key containing `.`, or a repeated key.
    pub fn build(self) -> TreeResult<ParamGroup> {
        let history = match self.history_limit {
            Some(limit) => UndoHistory::with_limit(limit),
            None => UndoHistory::new(),
        };
        ParamGroup::attach_entries(self.entries, history)
    }
}

/// A tree node holding leaves and nested groups
pub struct ParamGroup {
    entries: IndexMap<String, Entry>,
    notifier: Rc<Notifier>,
    history: RefCell<UndoHistory>,
    extensions: RefCell<ExtensionRegistry>,
    state: Cell<GroupState>,
}

impl ParamGroup {
    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
    }

    /// Build a group from an ordered definition
    pub fn new<K, E>(def: impl IntoIterator<Item = (K, E)>) -> TreeResult<Self>
    where
        K: Into<String>,
        E: Into<Entry>,
    {
        let entries = def.into_iter().map(|(k, e)| (k.into(), e.into())).collect();
        Self::attach_entries(entries, UndoHistory::new())
    }

    fn attach_entries(def: Vec<(String, Entry)>, history: UndoHistory) -> TreeResult<Self> {
        let notifier = Notifier::new();
        let mut entries = IndexMap::with_capacity(def.len());

        for (key, mut entry) in def {
            validate_key(&key)?;
            if entries.contains_key(&key) {
                return Err(TreeError::DuplicateKey(key));
            }
            match &mut entry {
                Entry::Param(p) => p.attach(&key, &notifier),
                Entry::Group(g) => g.notifier.attach(&notifier, &key),
            }
            entries.insert(key, entry);
        }

        Ok(Self {
            entries,
            notifier,
            history: RefCell::new(history),
            extensions: RefCell::new(ExtensionRegistry::default()),
            state: Cell::new(GroupState::Attached),
        })
    }

    pub fn state(&self) -> GroupState {
        self.state.get()
    }

    /// Direct entry under a single key
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Read/write surface ────────────────────────────────────────────

    /// Resolve a dotted path to a leaf or a group
    pub fn get(&self, path: &str) -> Option<Node<'_>> {
        path::resolve(self, path)
    }

    pub fn param(&self, path: &str) -> Option<&Param> {
        self.get(path).and_then(Node::as_param)
    }

    pub fn number(&self, path: &str) -> Option<&NumberParam> {
        self.param(path).and_then(Param::as_number)
    }

    pub fn color(&self, path: &str) -> Option<&ColorParam> {
        self.param(path).and_then(Param::as_color)
    }

    pub fn group(&self, path: &str) -> Option<&ParamGroup> {
        self.get(path).and_then(Node::as_group)
    }

    /// Property-style write of the leaf at `path`; always notifies
    ///
    /// A path that does not resolve to a leaf is a no-op. Returns true if a
    /// leaf was written.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> bool {
        match self.param(path) {
            Some(param) => param.assign(value.into()),
            None => {
                log::debug!("tree: set('{}') does not resolve to a leaf, ignored", path);
                false
            }
        }
    }

    /// Controller write of the leaf at `path`, tagged with `origin`
    ///
    /// Notifies only if the value changes. Returns true if it changed.
    pub fn set_tagged(&self, path: &str, value: impl Into<Value>, origin: &str) -> bool {
        match self.param(path) {
            Some(param) => param.set_value(value.into(), origin),
            None => {
                log::debug!("tree: set('{}') does not resolve to a leaf, ignored", path);
                false
            }
        }
    }

    /// Apply a partial value tree; returns the number of leaves that changed
    ///
    /// Leaves are written with change detection, so applying the tree's own
    /// `values()` emits nothing. Keys missing from the definition, and nodes
    /// whose shape does not match (a subtree for a leaf or the reverse), are
    /// ignored.
    pub fn set_values(&self, update: &ValueTree) -> usize {
        self.set_values_tagged(update, "")
    }

    /// [`set_values`](Self::set_values) with a provenance tag
    pub fn set_values_tagged(&self, update: &ValueTree, origin: &str) -> usize {
        let mut changed = 0;
        for (key, node) in update.iter() {
            match (self.entries.get(key.as_str()), node) {
                (Some(Entry::Param(param)), ValueNode::Leaf(value)) => {
                    if param.set_value(value.clone(), origin) {
                        changed += 1;
                    }
                }
                (Some(Entry::Group(group)), ValueNode::Group(tree)) => {
                    changed += group.set_values_tagged(tree, origin);
                }
                (Some(_), _) => {
                    log::debug!("tree: shape mismatch for key '{}', ignored", key);
                }
                (None, _) => {
                    log::debug!("tree: unknown key '{}', ignored", key);
                }
            }
        }
        changed
    }

    /// Plain values mirroring the definition shape
    pub fn values(&self) -> ValueTree {
        self.entries
            .iter()
            .map(|(key, entry)| {
                let node = match entry {
                    Entry::Param(p) => ValueNode::Leaf(p.value()),
                    Entry::Group(g) => ValueNode::Group(g.values()),
                };
                (key.clone(), node)
            })
            .collect()
    }

    /// Normalized `[0, 1]` readings of numeric leaves
    ///
    /// Same shape as [`values`](Self::values), except non-numeric leaves are
    /// left out. Nested groups are always present, possibly empty.
    pub fn values_normalized(&self) -> ValueTree {
        self.entries
            .iter()
            .filter_map(|(key, entry)| {
                let node = match entry {
                    Entry::Param(Param::Number(p)) => ValueNode::Leaf(Value::Number(p.normalized())),
                    Entry::Param(Param::Color(_)) => return None,
                    Entry::Group(g) => ValueNode::Group(g.values_normalized()),
                };
                Some((key.clone(), node))
            })
            .collect()
    }

    /// Every leaf with its path relative to this group, depth-first
    pub fn leaves(&self) -> Vec<(String, &Param)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Param)>) {
        for (key, entry) in &self.entries {
            let path = join_path(prefix, key);
            match entry {
                Entry::Param(p) => out.push((path, p)),
                Entry::Group(g) => g.collect_leaves(&path, out),
            }
        }
    }

    // ── Change subscription surface ───────────────────────────────────

    /// Subscribe to every change in this group's subtree
    pub fn on_change(&self, listener: &Listener) {
        self.notifier.subscribe(listener);
    }

    /// Remove a listener by identity. Returns true if it was registered.
    pub fn off_change(&self, listener: &Listener) -> bool {
        self.notifier.unsubscribe(listener)
    }

    /// Number of listeners subscribed on this group itself
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    // ── History surface ───────────────────────────────────────────────

    /// Snapshot `values()` onto the undo stack and discard redo frames
    pub fn push_undo_frame(&self) {
        if self.is_destroyed("push_undo_frame") {
            return;
        }
        let frame = self.values();
        self.history.borrow_mut().push(frame);
    }

    /// Restore the previous frame. Returns false at the baseline.
    pub fn undo(&self) -> bool {
        if self.is_destroyed("undo") {
            return false;
        }
        let frame = self.history.borrow_mut().undo();
        match frame {
            Some(frame) => {
                self.set_values_tagged(&frame, HISTORY_ORIGIN);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone frame. Returns false if there is none.
    pub fn redo(&self) -> bool {
        if self.is_destroyed("redo") {
            return false;
        }
        let frame = self.history.borrow_mut().redo();
        match frame {
            Some(frame) => {
                self.set_values_tagged(&frame, HISTORY_ORIGIN);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.state() == GroupState::Attached && self.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state() == GroupState::Attached && self.history.borrow().can_redo()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    fn is_destroyed(&self, op: &str) -> bool {
        if self.state() == GroupState::Destroyed {
            log::debug!("tree: {} on destroyed group ignored", op);
            return true;
        }
        false
    }

    // ── Extension surface ─────────────────────────────────────────────

    /// Attach and register extensions in order
    ///
    /// Stops at the first failure; the failing extension and those after it
    /// are not registered. Extensions attached before the failure stay.
    pub fn plugins(&self, extensions: Vec<Box<dyn Extension>>) -> TreeResult<()> {
        for extension in extensions {
            self.register(extension)?;
        }
        Ok(())
    }

    /// Attach and register one extension
    pub fn register(&self, mut extension: Box<dyn Extension>) -> TreeResult<()> {
        if self.state() == GroupState::Destroyed {
            return Err(TreeError::Destroyed);
        }
        let name = extension.name().to_string();
        if self.extensions.borrow().contains(&name) {
            return Err(TreeError::DuplicateExtension(name));
        }

        extension
            .attach(self)
            .map_err(|source| TreeError::ExtensionFailed {
                name: name.clone(),
                source,
            })?;

        log::debug!("tree: extension '{}' attached", name);
        self.extensions.borrow_mut().insert(extension);
        Ok(())
    }

    /// Borrow a registered extension by name and concrete type
    pub fn extension<T: Extension>(&self, name: &str) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.extensions.borrow(), |r| r.get::<T>(name)).ok()
    }

    /// Mutably borrow a registered extension by name and concrete type
    ///
    /// The registry stays borrowed while the guard lives, so the guard must
    /// not be held across writes to the tree: a listener touching the
    /// registry would find it borrowed. Use
    /// [`with_extension_mut`](Self::with_extension_mut) for that.
    pub fn extension_mut<T: Extension>(&self, name: &str) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.extensions.borrow_mut(), |r| r.get_mut::<T>(name)).ok()
    }

    /// Run `f` on a registered extension with the registry released
    ///
    /// The extension is taken out of the registry for the duration of `f`
    /// and put back at its place afterwards, so `f` may write to the tree and
    /// listeners may use the registry. While `f` runs the extension is not
    /// listed. If the group is destroyed during `f`, the extension is
    /// detached instead of put back. Returns `None` if no extension of type
    /// `T` is registered under `name`.
    pub fn with_extension_mut<T: Extension, R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let (index, mut extension) = self.extensions.borrow_mut().take(name)?;
        let result = extension.as_any_mut().downcast_mut::<T>().map(f);

        if self.state() == GroupState::Destroyed {
            log::debug!("tree: detaching extension '{}'", name);
            extension.detach(self);
        } else if self.extensions.borrow().contains(name) {
            log::warn!("tree: extension '{}' was replaced while in use, detaching it", name);
            extension.detach(self);
        } else {
            self.extensions.borrow_mut().put_back(index, extension);
        }
        result
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.borrow().names()
    }

    /// Detach every extension here and in nested groups
    ///
    /// Idempotent. Leaf values stay readable and writable afterwards.
    pub fn destroy(&self) {
        if self.state.replace(GroupState::Destroyed) == GroupState::Destroyed {
            return;
        }

        let extensions = self.extensions.borrow_mut().take_all();
        for mut extension in extensions {
            log::debug!("tree: detaching extension '{}'", extension.name());
            extension.detach(self);
        }

        for entry in self.entries.values() {
            if let Entry::Group(g) = entry {
                g.destroy();
            }
        }
    }
}

impl Drop for ParamGroup {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for ParamGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamGroup")
            .field("entries", &self.entries)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
