//! Persistence extension
//!
//! Keeps a mirror of the tree's values (seeded at attach, updated from root
//! change events) and writes it to a [`Storage`] on demand or, with autosave,
//! on every change through a [`Throttle`]. Restored state is applied with the
//! `"persistence"` origin, and changes carrying that origin never trigger a
//! save.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use paramtree_core::{listener, ChangeEvent, Extension, Listener, ParamGroup, ValueTree};

use crate::config::PersistenceConfig;
use crate::format::StorageFormat;
use crate::storage::Storage;
use crate::throttle::Throttle;

/// Registry name of the persistence extension
pub const PERSISTENCE_NAME: &str = "persistence";

/// Provenance tag of writes made when restoring saved state
pub const PERSISTENCE_ORIGIN: &str = "persistence";

/// State shared between the extension handle and its tree listener
struct SyncState {
    storage: Box<dyn Storage>,
    key: String,
    format: StorageFormat,
    mirror: ValueTree,
    throttle: Throttle,
    autosave: bool,
    attached: bool,
}

impl SyncState {
    fn write(&mut self) -> Result<()> {
        let data = self.format.encode(&self.mirror)?;
        self.storage.write(&self.key, &data)?;
        self.throttle.mark_written(Instant::now());
        log::debug!("persistence: saved state under '{}'", self.key);
        Ok(())
    }

    fn on_change(&mut self, event: &ChangeEvent) {
        if !self.attached {
            return;
        }
        self.mirror.insert_path(&event.key, event.value.clone());

        if !self.autosave || event.origin == PERSISTENCE_ORIGIN {
            return;
        }
        if self.throttle.on_change(Instant::now()) {
            if let Err(e) = self.write() {
                log::warn!("persistence: autosave failed: {:#}", e);
            }
        }
    }
}

/// Storage-backed save/restore for a tree
pub struct PersistencePlugin {
    state: Rc<RefCell<SyncState>>,
    restore_on_attach: bool,
    /// Root subscription, held so it can be removed on detach
    listener: Option<Listener>,
}

impl PersistencePlugin {
    pub fn new(storage: impl Storage + 'static, config: PersistenceConfig) -> Self {
        let state = SyncState {
            storage: Box::new(storage),
            throttle: Throttle::new(config.throttle()),
            key: config.key,
            format: config.format,
            mirror: ValueTree::new(),
            autosave: config.autosave,
            attached: false,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            restore_on_attach: config.restore_on_attach,
            listener: None,
        }
    }

    /// Write the current values to storage now
    pub fn save(&self) -> Result<()> {
        self.state.borrow_mut().write()
    }

    /// Saved values, if any were saved
    pub fn saved(&self) -> Result<Option<ValueTree>> {
        let state = self.state.borrow();
        match state.storage.read(&state.key)? {
            Some(data) => Ok(Some(state.format.decode(&data)?)),
            None => Ok(None),
        }
    }

    /// Apply saved values to `tree`; returns false if nothing was saved
    ///
    /// Keys in the saved state that the tree no longer defines are ignored.
    pub fn restore_saved(&self, tree: &ParamGroup) -> Result<bool> {
        let Some(values) = self.saved()? else {
            return Ok(false);
        };
        let changed = tree.set_values_tagged(&values, PERSISTENCE_ORIGIN);
        log::info!("persistence: restored saved state ({} values changed)", changed);
        Ok(true)
    }

    /// Remove the saved state from storage
    pub fn clear_saved(&self) -> Result<()> {
        let state = self.state.borrow();
        state.storage.remove(&state.key)
    }

    pub fn enable_autosave(&self) {
        self.state.borrow_mut().autosave = true;
    }

    /// Stop saving on change; a pending trailing write is kept for `flush`
    pub fn disable_autosave(&self) {
        self.state.borrow_mut().autosave = false;
    }

    pub fn autosave_enabled(&self) -> bool {
        self.state.borrow().autosave
    }

    /// True if a throttled change has not been written yet
    pub fn is_dirty(&self) -> bool {
        self.state.borrow().throttle.is_dirty()
    }

    /// Write a pending throttled change; returns true if anything was written
    pub fn flush(&self) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        if !state.throttle.is_dirty() {
            return Ok(false);
        }
        state.write()?;
        Ok(true)
    }

    /// Values as last seen by the extension
    pub fn mirror(&self) -> ValueTree {
        self.state.borrow().mirror.clone()
    }
}

impl Extension for PersistencePlugin {
    fn name(&self) -> &str {
        PERSISTENCE_NAME
    }

    fn attach(&mut self, tree: &ParamGroup) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            state.mirror = tree.values();
            state.attached = true;
        }

        let shared = Rc::clone(&self.state);
        let subscription = listener(move |event| shared.borrow_mut().on_change(event));
        tree.on_change(&subscription);
        self.listener = Some(subscription);

        if self.restore_on_attach {
            if let Err(e) = self.restore_saved(tree) {
                log::warn!("persistence: could not restore saved state: {:#}", e);
            }
        }
        Ok(())
    }

    fn detach(&mut self, tree: &ParamGroup) {
        if let Some(subscription) = self.listener.take() {
            tree.off_change(&subscription);
        }
        if let Err(e) = self.flush() {
            log::warn!("persistence: final write failed: {:#}", e);
        }
        self.state.borrow_mut().attached = false;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
