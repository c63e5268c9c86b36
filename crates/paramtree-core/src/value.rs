//! Plain parameter values and value trees
//!
//! [`Value`] is what a single leaf holds. [`ValueTree`] mirrors the shape of a
//! parameter group with every leaf replaced by its value; it is the canonical
//! serialization shape for persistence and display, and the frame type of the
//! undo/redo history.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path::split_path;

/// A single leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric leaf value
    Number(f64),
    /// String-encoded color (e.g. `"#ffd332"`)
    Color(String),
}

impl Value {
    /// Numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Color(_) => None,
        }
    }

    /// Color string, if this is a color
    pub fn as_color(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Color(c) => Some(c),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Color(c) => f.write_str(c),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Color(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Color(v)
    }
}

/// One entry of a [`ValueTree`]: a leaf value or a nested tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueNode {
    Leaf(Value),
    Group(ValueTree),
}

impl ValueNode {
    /// Leaf value, if this node is a leaf
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Leaf(v) => Some(v),
            Self::Group(_) => None,
        }
    }

    /// Nested tree, if this node is a group
    pub fn as_tree(&self) -> Option<&ValueTree> {
        match self {
            Self::Leaf(_) => None,
            Self::Group(t) => Some(t),
        }
    }
}

impl From<Value> for ValueNode {
    fn from(v: Value) -> Self {
        Self::Leaf(v)
    }
}

impl From<ValueTree> for ValueNode {
    fn from(t: ValueTree) -> Self {
        Self::Group(t)
    }
}

impl From<f64> for ValueNode {
    fn from(v: f64) -> Self {
        Self::Leaf(v.into())
    }
}

impl From<i32> for ValueNode {
    fn from(v: i32) -> Self {
        Self::Leaf(v.into())
    }
}

impl From<&str> for ValueNode {
    fn from(v: &str) -> Self {
        Self::Leaf(v.into())
    }
}

/// Ordered, deeply nested mapping of plain values
///
/// Two trees are equal iff they have the same keys in the same order and every
/// leaf value matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueTree(IndexMap<String, ValueNode>);

impl ValueTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a leaf or subtree
    pub fn with(mut self, key: impl Into<String>, node: impl Into<ValueNode>) -> Self {
        self.0.insert(key.into(), node.into());
        self
    }

    /// Builder-style insert of a nested tree
    pub fn with_group(self, key: impl Into<String>, tree: ValueTree) -> Self {
        self.with(key, ValueNode::Group(tree))
    }

    /// Insert a node under a single key, returning the previous node
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<ValueNode>) -> Option<ValueNode> {
        self.0.insert(key.into(), node.into())
    }

    /// Node stored under a single key
    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.0.get(key)
    }

    /// Resolve a dotted path to a node
    ///
    /// Missing intermediate segments and paths that descend through a leaf
    /// resolve to `None`.
    pub fn get_path(&self, path: &str) -> Option<&ValueNode> {
        let mut segments = split_path(path);
        let first = segments.next()?;
        let mut node = self.0.get(first)?;
        for segment in segments {
            node = match node {
                ValueNode::Group(tree) => tree.0.get(segment)?,
                ValueNode::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    /// Leaf value at a dotted path
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        self.get_path(path).and_then(ValueNode::as_value)
    }

    /// Write a leaf value at a dotted path, creating intermediate groups
    ///
    /// An intermediate segment that currently holds a leaf is replaced by a
    /// group.
    pub fn insert_path(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = split_path(path).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut tree = self;
        for segment in parents {
            let entry = tree
                .0
                .entry((*segment).to_string())
                .or_insert_with(|| ValueNode::Group(ValueTree::new()));
            if let ValueNode::Leaf(_) = entry {
                *entry = ValueNode::Group(ValueTree::new());
            }
            let ValueNode::Group(next) = entry else {
                return;
            };
            tree = next;
        }
        tree.0.insert((*last).to_string(), ValueNode::Leaf(value));
    }

    /// Flatten into `(dotted path, value)` pairs in depth-first order
    pub fn flatten(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, Value)>) {
        for (key, node) in &self.0 {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match node {
                ValueNode::Leaf(v) => out.push((path, v.clone())),
                ValueNode::Group(tree) => tree.flatten_into(&path, out),
            }
        }
    }

    /// Iterate top-level entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueNode)> {
        self.0.iter()
    }

    /// Number of top-level entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the tree has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ValueNode)> for ValueTree {
    fn from_iter<I: IntoIterator<Item = (String, ValueNode)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValueTree {
        ValueTree::new().with("foo", 1.0).with_group(
            "nested",
            ValueTree::new()
                .with("bgColor", "#fff")
                .with_group("deep", ValueTree::new().with("baz", 3.0)),
        )
    }

    #[test]
    fn test_get_path() {
        let tree = sample();
        assert_eq!(tree.value_at("foo"), Some(&Value::Number(1.0)));
        assert_eq!(
            tree.value_at("nested.bgColor"),
            Some(&Value::Color("#fff".to_string()))
        );
        assert_eq!(tree.value_at("nested.deep.baz"), Some(&Value::Number(3.0)));
        assert!(tree.get_path("nested.deep").unwrap().as_tree().is_some());
        assert!(tree.get_path("nested.missing").is_none());
        assert!(tree.get_path("foo.bar").is_none());
    }

    #[test]
    fn test_insert_path_creates_groups() {
        let mut tree = ValueTree::new();
        tree.insert_path("a.b.c", Value::Number(5.0));
        tree.insert_path("a.d", Value::Number(6.0));
        assert_eq!(tree.value_at("a.b.c"), Some(&Value::Number(5.0)));
        assert_eq!(tree.value_at("a.d"), Some(&Value::Number(6.0)));

        // Leaf in the way is replaced by a group
        tree.insert_path("a.d.e", Value::Number(7.0));
        assert_eq!(tree.value_at("a.d.e"), Some(&Value::Number(7.0)));
    }

    #[test]
    fn test_flatten_order() {
        let flat = sample().flatten();
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["foo", "nested.bgColor", "nested.deep.baz"]);
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = serde_yaml::to_string(&sample()).unwrap();
        let parsed: ValueTree = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, sample());

        // Integers in hand-written files still load as numbers
        let parsed: ValueTree = serde_yaml::from_str("foo: 42\nnested:\n  bgColor: '#000'\n").unwrap();
        assert_eq!(parsed.value_at("foo"), Some(&Value::Number(42.0)));
        assert_eq!(
            parsed.value_at("nested.bgColor"),
            Some(&Value::Color("#000".to_string()))
        );
    }
}
