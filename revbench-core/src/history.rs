//! Linear undo/redo history for the active file.
//!
//! The history is a sequence of full-content snapshots plus a pointer. The
//! snapshot at the pointer is always the content on screen. Recording an edit
//! after an undo discards the redo branch; there is no history tree.
//!
//! History is transient: it is rebuilt from the file content whenever the
//! active file changes and is never persisted.

/// Undo/redo stack of content snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHistory {
    entries: Vec<String>,
    pointer: usize,
    /// Maximum number of entries kept; `None` means unbounded.
    capacity: Option<usize>,
}

impl EditHistory {
    /// Starts a history whose only entry is `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self { entries: vec![content.into()], pointer: 0, capacity: None }
    }

    /// Like [`EditHistory::new`] but drops the oldest entries once more than
    /// `capacity` are held. A capacity of zero is treated as unbounded.
    pub fn with_capacity(content: impl Into<String>, capacity: usize) -> Self {
        let mut history = Self::new(content);
        history.capacity = (capacity > 0).then_some(capacity);
        history
    }

    /// Content at the history pointer.
    pub fn current(&self) -> &str {
        &self.entries[self.pointer]
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    /// Records `content` as the newest entry.
    ///
    /// No-op when `content` equals the current entry. Otherwise everything
    /// after the pointer is discarded, `content` is appended, and the pointer
    /// moves to it. Returns `true` if the history grew.
    pub fn record_edit(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.entries[self.pointer] {
            return false;
        }
        self.entries.truncate(self.pointer + 1);
        self.entries.push(content);
        self.pointer = self.entries.len() - 1;

        if let Some(cap) = self.capacity {
            if self.entries.len() > cap {
                let excess = self.entries.len() - cap;
                self.entries.drain(..excess);
                self.pointer -= excess;
            }
        }
        true
    }

    /// Steps back one entry and returns its content, or `None` at the start.
    pub fn undo(&mut self) -> Option<&str> {
        if self.pointer == 0 {
            return None;
        }
        self.pointer -= 1;
        Some(self.current())
    }

    /// Steps forward one entry and returns its content, or `None` at the tail.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.pointer += 1;
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edit_grows_once() {
        let mut h = EditHistory::new("a");
        assert!(h.record_edit("b"));
        assert!(!h.record_edit("b"));
        assert_eq!(h.len(), 2);
        assert_eq!(h.current(), "b");
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut h = EditHistory::new("v0");
        for v in ["v1", "v2", "v3"] {
            h.record_edit(v);
        }
        for _ in 0..3 {
            let before = h.current().to_owned();
            h.undo();
            h.redo();
            assert_eq!(h.current(), before);
            h.undo();
        }
        assert_eq!(h.current(), "v0");
    }

    #[test]
    fn boundaries_are_no_ops() {
        let mut h = EditHistory::new("only");
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        assert_eq!(h.pointer(), 0);
        assert_eq!(h.current(), "only");
    }

    #[test]
    fn edit_after_undo_discards_redo_branch() {
        let mut h = EditHistory::new("a");
        h.record_edit("b");
        h.record_edit("c");
        assert_eq!(h.undo(), Some("b"));
        h.record_edit("d");
        assert_eq!(h.len(), 3);
        assert!(!h.can_redo());
        assert_eq!(h.undo(), Some("b"));
        assert_eq!(h.undo(), Some("a"));
    }

    #[test]
    fn edit_equal_to_current_after_undo_keeps_redo() {
        let mut h = EditHistory::new("a");
        h.record_edit("b");
        h.undo();
        assert!(!h.record_edit("a"));
        assert_eq!(h.redo(), Some("b"));
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut h = EditHistory::with_capacity("0", 3);
        for v in ["1", "2", "3", "4"] {
            h.record_edit(v);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.current(), "4");
        assert_eq!(h.undo(), Some("3"));
        assert_eq!(h.undo(), Some("2"));
        assert_eq!(h.undo(), None);
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let mut h = EditHistory::with_capacity("0", 0);
        for i in 1..50 {
            h.record_edit(i.to_string());
        }
        assert_eq!(h.len(), 50);
    }
}
