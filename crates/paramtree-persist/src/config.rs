//! Persistence options

use std::path::Path;
use std::time::Duration;

use paramtree_core::config::load_config;
use serde::{Deserialize, Serialize};

use crate::format::StorageFormat;

/// Options for [`PersistencePlugin`](crate::PersistencePlugin)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Storage key the state is saved under
    pub key: String,
    /// Document encoding
    pub format: StorageFormat,
    /// Minimum time between autosave writes, in milliseconds
    pub throttle_ms: u64,
    /// Save on every change (throttled) from the moment of attach
    pub autosave: bool,
    /// Apply the saved state when the extension is attached
    pub restore_on_attach: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            key: "params".to_string(),
            format: StorageFormat::Yaml,
            throttle_ms: 100,
            autosave: false,
            restore_on_attach: false,
        }
    }
}

impl PersistenceConfig {
    /// Load options from a YAML file, defaulting anything missing
    pub fn load(path: &Path) -> Self {
        load_config(path)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramtree_core::config::save_config;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persistence.yaml");
        std::fs::write(&path, "format: json\nautosave: true\n").unwrap();

        let config = PersistenceConfig::load(&path);
        assert_eq!(config.format, StorageFormat::Json);
        assert!(config.autosave);
        assert_eq!(config.key, "params");
        assert_eq!(config.throttle(), Duration::from_millis(100));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persistence.yaml");
        let config = PersistenceConfig {
            key: "sketch".to_string(),
            throttle_ms: 250,
            restore_on_attach: true,
            ..Default::default()
        };
        save_config(&config, &path).unwrap();
        assert_eq!(PersistenceConfig::load(&path), config);
    }
}
