//! Storage media for saved tree state
//!
//! A [`Storage`] is a flat key → text store. The persistence extension only
//! ever reads, writes and removes whole documents, one per key.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use crate::paths::default_state_dir;

/// Flat key → document store
pub trait Storage {
    /// Document saved under `key`, or `None` if there is none
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document under `key`
    fn write(&self, key: &str, data: &str) -> Result<()>;

    /// Remove the document under `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process storage
///
/// Clones share the same map, so a host (or a test) can keep a handle and
/// inspect what the extension wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), data.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One file per key under a directory
///
/// Key `params` with extension `yaml` lives at `<dir>/params.yaml`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    extension: String,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "yaml".to_string(),
        }
    }

    /// Storage under the platform data directory (`<data_dir>/paramtree`)
    pub fn default_location() -> Self {
        Self::new(default_state_dir())
    }

    /// Use a different file extension (without the dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            bail!("Storage key is empty");
        }
        if key.contains(['/', '\\']) || key == "." || key == ".." {
            bail!("Storage key '{}' is not a plain file name", key);
        }
        Ok(self.dir.join(format!("{}.{}", key, self.extension)))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read saved state: {:?}", path))?;
        Ok(Some(data))
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create state directory: {:?}", self.dir))?;
        std::fs::write(&path, data)
            .with_context(|| format!("Failed to write saved state: {:?}", path))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove saved state: {:?}", path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_shares_clones() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.write("params", "gain: 0.5").unwrap();
        assert_eq!(handle.read("params").unwrap().as_deref(), Some("gain: 0.5"));
        handle.remove("params").unwrap();
        assert!(storage.read("params").unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));

        assert!(storage.read("params").unwrap().is_none());
        storage.write("params", "gain: 0.5\n").unwrap();
        assert!(dir.path().join("state").join("params.yaml").exists());
        assert_eq!(storage.read("params").unwrap().as_deref(), Some("gain: 0.5\n"));

        storage.remove("params").unwrap();
        storage.remove("params").unwrap();
        assert!(storage.read("params").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).with_extension("json");
        assert!(storage.path_for("../escape").is_err());
        assert!(storage.path_for("").is_err());
        assert!(storage.write("a/b", "{}").is_err());
        assert!(storage.path_for("params").unwrap().ends_with("params.json"));
    }
}
