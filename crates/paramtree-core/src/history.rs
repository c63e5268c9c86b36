//! Snapshot-based undo/redo history
//!
//! Linear history of whole-tree value snapshots. The oldest undo frame is the
//! baseline and is never undone past; pushing a new frame discards any redo
//! frames.
//!
//! ```text
//! push F0, F1, F2      undo: [F0 F1 F2]  redo: []
//! undo → applies F1    undo: [F0 F1]     redo: [F2]
//! undo → applies F0    undo: [F0]        redo: [F2 F1]
//! redo → applies F1    undo: [F0 F1]     redo: [F2]
//! ```

use crate::value::ValueTree;

/// Undo and redo stacks of value snapshots
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    undo: Vec<ValueTree>,
    redo: Vec<ValueTree>,
    /// Maximum undo frames kept (oldest dropped first); `None` is unbounded
    limit: Option<usize>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undo frames
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Push a frame and invalidate the redo stack
    pub fn push(&mut self, frame: ValueTree) {
        self.undo.push(frame);
        self.redo.clear();
        if let Some(limit) = self.limit {
            if self.undo.len() > limit {
                let excess = self.undo.len() - limit;
                self.undo.drain(..excess);
            }
        }
    }

    /// Step back: returns the frame to apply, or `None` at the baseline
    pub fn undo(&mut self) -> Option<ValueTree> {
        if self.undo.len() <= 1 {
            return None;
        }
        let top = self.undo.pop()?;
        self.redo.push(top);
        self.undo.last().cloned()
    }

    /// Step forward: returns the frame to apply, or `None` if nothing was undone
    pub fn redo(&mut self) -> Option<ValueTree> {
        let frame = self.redo.pop()?;
        self.undo.push(frame.clone());
        Some(frame)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(v: f64) -> ValueTree {
        ValueTree::new().with("x", v)
    }

    #[test]
    fn test_baseline_is_never_undone() {
        let mut h = UndoHistory::new();
        assert!(h.undo().is_none());
        h.push(frame(0.0));
        assert!(h.undo().is_none());
        assert!(!h.can_undo());
    }

    #[test]
    fn test_undo_redo_sequence() {
        let mut h = UndoHistory::new();
        h.push(frame(0.0));
        h.push(frame(1.0));
        h.push(frame(2.0));

        assert_eq!(h.undo(), Some(frame(1.0)));
        assert_eq!(h.undo(), Some(frame(0.0)));
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), Some(frame(1.0)));
        assert_eq!(h.redo(), Some(frame(2.0)));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut h = UndoHistory::new();
        h.push(frame(0.0));
        h.push(frame(1.0));
        h.undo();
        assert!(h.can_redo());
        h.push(frame(5.0));
        assert!(!h.can_redo());
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut h = UndoHistory::with_limit(2);
        h.push(frame(0.0));
        h.push(frame(1.0));
        h.push(frame(2.0));
        assert_eq!(h.undo_len(), 2);
        assert_eq!(h.undo(), Some(frame(1.0)));
        assert_eq!(h.undo(), None);
    }
}
