//! YAML file I/O for option structs and value snapshots
//!
//! Loading never fails: a missing or unreadable file yields `T::default()`
//! with a logged warning, so hosts can always start. Saving reports errors.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a YAML document into `T`, falling back to defaults
///
/// ```ignore
/// let opts: PersistenceConfig = load_config(Path::new("persistence.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("config: {:?} not found, using defaults", path);
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("config: failed to read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::debug!("config: loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("config: failed to parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Write `config` to `path` as YAML, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::debug!("config: saved {:?}", path);
    Ok(())
}
