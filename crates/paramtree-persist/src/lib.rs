//! Paramtree Persist - save and restore tree state
//!
//! ```ignore
//! use paramtree_persist::{FileStorage, PersistenceConfig, PersistencePlugin, PERSISTENCE_NAME};
//!
//! let config = PersistenceConfig { autosave: true, restore_on_attach: true, ..Default::default() };
//! tree.register(Box::new(PersistencePlugin::new(FileStorage::default_location(), config)))?;
//!
//! // later; restoring writes to the tree, so run it with the registry released
//! tree.with_extension_mut::<PersistencePlugin, _>(PERSISTENCE_NAME, |p| p.restore_saved(&tree));
//! if let Some(persistence) = tree.extension::<PersistencePlugin>(PERSISTENCE_NAME) {
//!     persistence.flush()?;
//! }
//! ```

pub mod config;
pub mod format;
pub mod paths;
pub mod plugin;
pub mod storage;
pub mod throttle;

pub use config::PersistenceConfig;
pub use format::StorageFormat;
pub use paths::default_state_dir;
pub use plugin::{PersistencePlugin, PERSISTENCE_NAME, PERSISTENCE_ORIGIN};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use throttle::Throttle;
