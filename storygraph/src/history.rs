use crate::json::Snapshot;
use std::collections::VecDeque;

/// Bounded undo/redo ring of persisted snapshots.
///
/// `index` points at the snapshot matching the live document. Entries after
/// it are the redo tail; pushing a new snapshot discards them. When full,
/// the oldest entry is evicted first.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<Snapshot>,
    index: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        History { entries: VecDeque::new(), index: 0, limit: limit.max(1) }
    }

    /// Drops everything and starts over from `baseline`.
    pub fn reset(&mut self, baseline: Snapshot) {
        self.entries.clear();
        self.entries.push_back(baseline);
        self.index = 0;
    }

    pub fn head(&self) -> Option<&Snapshot> {
        self.entries.get(self.index)
    }

    /// Appends `snap` unless it equals the current head. Returns whether it
    /// was recorded.
    pub fn push(&mut self, snap: Snapshot) -> bool {
        if self.head() == Some(&snap) {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push_back(snap);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Steps back and returns an independent copy of the new head.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.head().cloned()
    }

    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.head().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
