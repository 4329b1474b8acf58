#![forbid(unsafe_code)]

//! Snapshot-based undo/redo.
//!
//! ```text
//!   prepare()  ──► pending = current
//!   (mutate)
//!   commit()   ──► undo.push(pending), redo.clear()
//!
//!   undo(current) ──► redo.push(current), return undo.pop()
//!   redo(current) ──► undo.push(current), return redo.pop()
//! ```
//!
//! Whole `{nodes, edges}` collections are stored rather than deltas. The
//! undo stack is bounded by [`HistoryConfig::max_depth`]; the oldest entry
//! is evicted first.
//!
//! # Invariants
//!
//! - A commit without a matching prepare is ignored.
//! - A prepare followed by another prepare keeps only the latest capture.
//! - Every commit clears the redo stack.

use std::collections::VecDeque;

use arbor_core::GraphSnapshot;

/// History bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of undo entries kept.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 50 }
    }
}

/// Undo and redo stacks of graph snapshots.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    config: HistoryConfig,
    undo: VecDeque<GraphSnapshot>,
    redo: Vec<GraphSnapshot>,
    pending: Option<GraphSnapshot>,
}

impl HistoryManager {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config: HistoryConfig {
                max_depth: config.max_depth.max(1),
            },
            ..Self::default()
        }
    }

    /// Capture the pre-mutation state.
    pub fn prepare(&mut self, before: GraphSnapshot) {
        self.pending = Some(before);
    }

    /// Drop a capture whose mutation was abandoned.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Push the captured pre-state onto the undo stack. Returns whether an
    /// entry was pushed.
    pub fn commit(&mut self) -> bool {
        let Some(before) = self.pending.take() else {
            return false;
        };
        if self.undo.len() == self.config.max_depth {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
        self.redo.clear();
        true
    }

    /// Step back. `current` goes onto the redo stack; the returned snapshot
    /// should be restored by the caller.
    pub fn undo(&mut self, current: GraphSnapshot) -> Option<GraphSnapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        self.pending = None;
        Some(previous)
    }

    /// Step forward again.
    pub fn redo(&mut self, current: GraphSnapshot) -> Option<GraphSnapshot> {
        let next = self.redo.pop()?;
        if self.undo.len() == self.config.max_depth {
            self.undo.pop_front();
        }
        self.undo.push_back(current);
        self.pending = None;
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    #[must_use]
    pub const fn config(&self) -> HistoryConfig {
        self.config
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.pending = None;
    }
}
