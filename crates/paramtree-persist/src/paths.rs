//! Standard locations for saved state

use std::path::PathBuf;

/// Default state directory: `<data_dir>/paramtree`
///
/// Falls back to `./paramtree` on platforms without a data directory.
pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paramtree")
}

/// Default location of the persistence options file inside `state_dir`
pub fn config_path(state_dir: &std::path::Path) -> PathBuf {
    state_dir.join("persistence.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_dir_ends_with_paramtree() {
        assert!(default_state_dir().ends_with("paramtree"));
    }

    #[test]
    fn test_config_path() {
        assert!(config_path(&default_state_dir()).ends_with("paramtree/persistence.yaml"));
    }
}
