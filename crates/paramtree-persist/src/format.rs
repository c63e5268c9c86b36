//! Text encodings of a value snapshot

use anyhow::{Context, Result};
use paramtree_core::ValueTree;
use serde::{Deserialize, Serialize};

/// Document encoding used for saved state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Yaml,
    Json,
}

impl StorageFormat {
    /// File extension conventionally used for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    pub fn encode(self, values: &ValueTree) -> Result<String> {
        match self {
            Self::Yaml => serde_yaml::to_string(values).context("Failed to encode state as YAML"),
            Self::Json => serde_json::to_string(values).context("Failed to encode state as JSON"),
        }
    }

    pub fn decode(self, data: &str) -> Result<ValueTree> {
        match self {
            Self::Yaml => serde_yaml::from_str(data).context("Failed to decode YAML state"),
            Self::Json => serde_json::from_str(data).context("Failed to decode JSON state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramtree_core::Value;

    #[test]
    fn test_json_shape_matches_values() {
        let values = ValueTree::new()
            .with("foo", 1.5)
            .with_group("nested", ValueTree::new().with("bgColor", "#fff"));
        let json = StorageFormat::Json.encode(&values).unwrap();
        assert_eq!(json, r##"{"foo":1.5,"nested":{"bgColor":"#fff"}}"##);
        assert_eq!(StorageFormat::Json.decode(&json).unwrap(), values);
    }

    #[test]
    fn test_yaml_decode_and_errors() {
        let values = StorageFormat::Yaml.decode("foo: 2\nnested:\n  bar: 0.25\n").unwrap();
        assert_eq!(values.value_at("nested.bar"), Some(&Value::Number(0.25)));
        assert!(StorageFormat::Yaml.decode("- not\n- a map\n").is_err());
        assert!(StorageFormat::Json.decode("{").is_err());
    }
}
