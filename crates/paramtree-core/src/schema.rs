//! YAML tree schemas
//!
//! A schema describes a tree definition in a file, so hosts can build a tree
//! without code. Each mapping entry is one of:
//!
//! ```yaml
//! gain: 0.5                  # number leaf, range [0, 1]
//! tint: "#ffd332"            # color leaf
//! cutoff:                    # number leaf with explicit range
//!   value: 800
//!   min: 20
//!   max: 20000
//!   step: 1
//! accent: { color: "#fff" }  # color leaf, long form
//! fx:                        # nested group
//!   mix: 0.1
//! ```
//!
//! A mapping whose only keys are `value`/`min`/`max`/`step` (with `value`
//! present), or exactly `color`, is read as a leaf. Any other mapping is a
//! group.

use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::group::{Entry, GroupBuilder, ParamGroup};
use crate::param::{ColorParam, NumberParam, Param, DEFAULT_MAX, DEFAULT_MIN, DEFAULT_STEP};

fn default_min() -> f64 {
    DEFAULT_MIN
}

fn default_max() -> f64 {
    DEFAULT_MAX
}

fn default_step() -> f64 {
    DEFAULT_STEP
}

/// Long form of a number leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberSchema {
    pub value: f64,
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
}

/// Long form of a color leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorSchema {
    pub color: String,
}

/// One schema entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySchema {
    Number(f64),
    Color(String),
    RangedNumber(NumberSchema),
    LongColor(ColorSchema),
    Group(TreeSchema),
}

/// Schema of a whole tree (or of one group)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSchema(IndexMap<String, EntrySchema>);

impl TreeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, entry: EntrySchema) -> Self {
        self.0.insert(key.into(), entry);
        self
    }

    pub fn get(&self, key: &str) -> Option<&EntrySchema> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a schema from YAML text
    pub fn from_yaml(yaml: &str) -> TreeResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| TreeError::Schema(e.to_string()))
    }

    pub fn to_yaml(&self) -> TreeResult<String> {
        serde_yaml::to_string(self).map_err(|e| TreeError::Schema(e.to_string()))
    }

    /// Construct the tree this schema describes
    pub fn build(&self) -> TreeResult<ParamGroup> {
        self.builder()?.build()
    }

    fn builder(&self) -> TreeResult<GroupBuilder> {
        let mut builder = ParamGroup::builder();
        for (key, entry) in &self.0 {
            let entry: Entry = match entry {
                EntrySchema::Number(v) => NumberParam::new(*v).into(),
                EntrySchema::Color(c) => ColorParam::new(c.clone()).into(),
                EntrySchema::RangedNumber(n) => NumberParam::new(n.value)
                    .with_range(n.min, n.max)
                    .with_step(n.step)
                    .into(),
                EntrySchema::LongColor(c) => ColorParam::new(c.color.clone()).into(),
                EntrySchema::Group(schema) => schema.build()?.into(),
            };
            builder = builder.entry(key.clone(), entry);
        }
        Ok(builder)
    }

    /// Schema describing `tree`'s current definition and values
    ///
    /// Numbers are written in long form so ranges survive.
    pub fn describe(tree: &ParamGroup) -> Self {
        let entries = tree
            .entries()
            .map(|(key, entry)| {
                let schema = match entry {
                    Entry::Param(Param::Number(p)) => EntrySchema::RangedNumber(NumberSchema {
                        value: p.value(),
                        min: p.min(),
                        max: p.max(),
                        step: p.step(),
                    }),
                    Entry::Param(Param::Color(p)) => EntrySchema::Color(p.value()),
                    Entry::Group(g) => EntrySchema::Group(Self::describe(g)),
                };
                (key.to_string(), schema)
            })
            .collect();
        Self(entries)
    }
}

/// Read and parse a schema file
pub fn load_schema(path: &Path) -> anyhow::Result<TreeSchema> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree schema: {:?}", path))?;
    let schema = TreeSchema::from_yaml(&yaml)
        .with_context(|| format!("Failed to parse tree schema: {:?}", path))?;
    log::debug!("schema: loaded {} top-level entries from {:?}", schema.len(), path);
    Ok(schema)
}
