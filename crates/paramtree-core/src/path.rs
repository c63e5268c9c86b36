//! Dotted-path resolution
//!
//! A path is a `.`-separated list of keys. Resolution walks the tree one
//! segment at a time, asking each group for its own entry, and descends into a
//! leaf only at the terminal segment. A missing segment yields `None`.
//!
//! Paths must be non-empty. An empty path never matches because keys are
//! non-empty by construction; it is not checked separately.

use crate::group::{Entry, ParamGroup};
use crate::param::Param;

/// Path segment separator
pub const SEPARATOR: char = '.';

/// Split a dotted path into its segments
pub fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.split(SEPARATOR)
}

/// Join a parent path and a key
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, key)
    }
}

/// A resolved node: a leaf or a group
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Param(&'a Param),
    Group(&'a ParamGroup),
}

impl<'a> Node<'a> {
    pub fn as_param(self) -> Option<&'a Param> {
        match self {
            Self::Param(p) => Some(p),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(self) -> Option<&'a ParamGroup> {
        match self {
            Self::Param(_) => None,
            Self::Group(g) => Some(g),
        }
    }
}

impl<'a> From<&'a Entry> for Node<'a> {
    fn from(entry: &'a Entry) -> Self {
        match entry {
            Entry::Param(p) => Self::Param(p),
            Entry::Group(g) => Self::Group(g),
        }
    }
}

/// Resolve `path` starting at `root`
pub fn resolve<'a>(root: &'a ParamGroup, path: &str) -> Option<Node<'a>> {
    let mut node = Node::Group(root);
    for segment in split_path(path) {
        node = match node {
            Node::Group(group) => group.entry(segment)?.into(),
            Node::Param(_) => return None,
        };
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::NumberParam;

    fn tree() -> ParamGroup {
        ParamGroup::builder()
            .number("a", NumberParam::new(1.0))
            .group(
                "b",
                ParamGroup::builder()
                    .number("c", NumberParam::new(2.0))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_leaf_and_group() {
        let t = tree();
        assert_eq!(resolve(&t, "b.c").and_then(Node::as_param).unwrap().name(), "c");
        assert!(resolve(&t, "b").and_then(Node::as_group).is_some());
        assert!(resolve(&t, "a").and_then(Node::as_param).is_some());
    }

    #[test]
    fn test_resolve_misses() {
        let t = tree();
        assert!(resolve(&t, "b.x").is_none());
        assert!(resolve(&t, "z").is_none());
        assert!(resolve(&t, "z.y.x").is_none());
        // Leaves are only entered at the terminal segment
        assert!(resolve(&t, "a.c").is_none());
        assert!(resolve(&t, "").is_none());
        assert!(resolve(&t, "b.").is_none());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a.b", "c"), "a.b.c");
    }
}
