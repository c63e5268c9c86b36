//! Extension registry
//!
//! Extensions are how collaborators (control panels, storage sync, remote
//! surfaces) attach behavior to a tree without the core depending on them.
//! A group holds its extensions by name; they are attached once on
//! registration and detached when the group is destroyed.

use std::any::Any;

use crate::group::ParamGroup;

/// Behavior attached to a parameter group
///
/// `attach` is called exactly once, before the extension is stored in the
/// group's registry, so it may freely read the tree and subscribe listeners.
/// `detach` is called once when the group is destroyed, with the same tree,
/// so listeners subscribed in `attach` can be removed.
pub trait Extension: Any {
    /// Registry name; unique per group
    fn name(&self) -> &str;

    /// Attach to `tree`. An error aborts registration and is propagated.
    fn attach(&mut self, tree: &ParamGroup) -> anyhow::Result<()>;

    /// Release resources held by the extension
    fn detach(&mut self, _tree: &ParamGroup) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Name-ordered storage of attached extensions
#[derive(Default)]
pub(crate) struct ExtensionRegistry {
    entries: Vec<Box<dyn Extension>>,
}

impl ExtensionRegistry {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name() == name)
    }

    pub fn insert(&mut self, extension: Box<dyn Extension>) {
        self.entries.push(extension);
    }

    pub fn get<T: Extension>(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|e| e.name() == name)
            .and_then(|e| e.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Extension>(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|e| e.name() == name)
            .and_then(|e| e.as_any_mut().downcast_mut::<T>())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name().to_string()).collect()
    }

    /// Remove one extension, with its position in registration order
    pub fn take(&mut self, name: &str) -> Option<(usize, Box<dyn Extension>)> {
        let index = self.entries.iter().position(|e| e.name() == name)?;
        Some((index, self.entries.remove(index)))
    }

    /// Reinsert an extension removed with [`take`](Self::take)
    pub fn put_back(&mut self, index: usize, extension: Box<dyn Extension>) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, extension);
    }

    /// Remove every extension, in registration order
    pub fn take_all(&mut self) -> Vec<Box<dyn Extension>> {
        std::mem::take(&mut self.entries)
    }
}
