//! Renderer-facing view of a tree
//!
//! Control panels do not walk the tree themselves. They take the flat,
//! depth-first list produced here (one entry per group and per leaf, in
//! definition order) and map each entry to a widget, using `path` to read and
//! write through [`ParamGroup::get`]/[`ParamGroup::set`].

use std::fmt;

use crate::group::{Entry, ParamGroup};
use crate::param::Param;
use crate::path::join_path;

/// Widget kind for one control
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// Collapsible folder for a nested group
    Folder,
    /// Numeric slider over the leaf's range
    Slider { min: f64, max: f64, step: f64 },
    /// Color picker
    ColorPicker,
}

/// One control in a panel
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    /// Full dotted path from the enumerated group
    pub path: String,
    /// Display label (the entry's key)
    pub label: String,
    /// Folder nesting depth, 0 for top-level entries
    pub depth: usize,
    pub kind: ControlKind,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "  ".repeat(self.depth);
        match &self.kind {
            ControlKind::Folder => write!(f, "{}[{}]", indent, self.label),
            ControlKind::Slider { min, max, step } => {
                write!(f, "{}{} slider {}..{} step {}", indent, self.label, min, max, step)
            }
            ControlKind::ColorPicker => write!(f, "{}{} color", indent, self.label),
        }
    }
}

/// Enumerate the controls for `root`, depth-first
pub fn controls(root: &ParamGroup) -> Vec<Control> {
    let mut out = Vec::new();
    collect(root, "", 0, &mut out);
    out
}

fn collect(group: &ParamGroup, prefix: &str, depth: usize, out: &mut Vec<Control>) {
    for (key, entry) in group.entries() {
        let path = join_path(prefix, key);
        let kind = match entry {
            Entry::Param(Param::Number(p)) => ControlKind::Slider {
                min: p.min(),
                max: p.max(),
                step: p.step(),
            },
            Entry::Param(Param::Color(_)) => ControlKind::ColorPicker,
            Entry::Group(_) => ControlKind::Folder,
        };
        out.push(Control {
            path: path.clone(),
            label: key.to_string(),
            depth,
            kind,
        });
        if let Entry::Group(child) = entry {
            collect(child, &path, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ColorParam, NumberParam};

    #[test]
    fn test_controls_order_and_kinds() {
        let tree = ParamGroup::builder()
            .number("gain", NumberParam::new(0.5))
            .group(
                "look",
                ParamGroup::builder()
                    .color("tint", ColorParam::new("#ffd332"))
                    .number("blur", NumberParam::new(2.0).with_range(0.0, 10.0).with_step(0.5))
                    .build()
                    .unwrap(),
            )
            .number("mix", NumberParam::new(0.1))
            .build()
            .unwrap();

        let list = controls(&tree);
        let paths: Vec<&str> = list.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["gain", "look", "look.tint", "look.blur", "mix"]);

        assert_eq!(list[1].kind, ControlKind::Folder);
        assert_eq!(list[2].kind, ControlKind::ColorPicker);
        assert_eq!(list[2].depth, 1);
        assert_eq!(
            list[3].kind,
            ControlKind::Slider {
                min: 0.0,
                max: 10.0,
                step: 0.5
            }
        );
        assert_eq!(list[3].label, "blur");
        assert_eq!(list[3].to_string(), "  blur slider 0..10 step 0.5");

        // Every leaf path resolves back into the tree
        for control in &list {
            assert!(tree.get(&control.path).is_some());
        }
    }
}
