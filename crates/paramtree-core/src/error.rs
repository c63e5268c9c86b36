//! Error types for parameter tree construction and extension setup
//!
//! Reads and writes on a constructed tree never fail: path misses and kind
//! mismatches are no-ops. Only building a tree, loading a schema and attaching
//! extensions can produce an error.

use thiserror::Error;

/// Errors that can occur while building or extending a parameter tree
#[derive(Debug, Error)]
pub enum TreeError {
    /// Two entries in one group share a key
    #[error("Duplicate key '{0}' in parameter group")]
    DuplicateKey(String),

    /// A key cannot be used as a path segment
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// An extension with the same name is already registered on the group
    #[error("Extension '{0}' is already registered")]
    DuplicateExtension(String),

    /// An extension's attach entry point failed
    #[error("Extension '{name}' failed to attach: {source}")]
    ExtensionFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The group has been destroyed and accepts no new extensions
    #[error("Parameter group has been destroyed")]
    Destroyed,

    /// A tree schema could not be parsed
    #[error("Invalid tree schema: {0}")]
    Schema(String),
}

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Check that `key` can be used as a single path segment
pub(crate) fn validate_key(key: &str) -> TreeResult<()> {
    if key.is_empty() {
        return Err(TreeError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty".to_string(),
        });
    }
    if key.contains('.') {
        return Err(TreeError::InvalidKey {
            key: key.to_string(),
            reason: "key contains the path separator '.'".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TreeError::DuplicateKey("gain".to_string());
        assert!(err.to_string().contains("gain"));

        let err = TreeError::ExtensionFailed {
            name: "persistence".to_string(),
            source: anyhow::anyhow!("storage unavailable"),
        };
        assert!(err.to_string().contains("persistence"));
        assert!(err.to_string().contains("storage unavailable"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("gain").is_ok());
        assert!(validate_key("").is_err());
        assert!(matches!(
            validate_key("a.b"),
            Err(TreeError::InvalidKey { .. })
        ));
    }
}
