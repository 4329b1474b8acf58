#![forbid(unsafe_code)]

//! Edit results.
//!
//! Structural edits distinguish three outcomes:
//!
//! | Outcome | Meaning | Graph |
//! |---------|---------|-------|
//! | `Ok(EditOutcome::Applied)` | Edit took effect | Changed, one undo step |
//! | `Ok(EditOutcome::Skipped(_))` | Stale or empty request | Unchanged, logged |
//! | `Err(EditError)` | Would break the forest | Unchanged |
//!
//! Stale ids are expected when UI events race a reload, so they are not
//! errors.

use std::fmt;

use arbor_core::{NodeId, Side};

/// Rejected structural edit. The graph is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Reparenting `source` under `target` would make a node its own
    /// ancestor.
    WouldCreateCycle { source: NodeId, target: NodeId },
    /// A node cannot be reparented onto itself.
    SameNode(NodeId),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::WouldCreateCycle { source, target } => write!(
                f,
                "cannot move {source} under {target}: {target} is a descendant of {source}"
            ),
            EditError::SameNode(id) => write!(f, "cannot move {id} under itself"),
        }
    }
}

impl std::error::Error for EditError {}

/// Why an edit did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The id is not in the live collections.
    MissingNode(NodeId),
    /// The node is flagged for deletion and waiting to be removed.
    Deleting(NodeId),
    /// Nothing is stored on that side.
    NothingCollapsed { node: NodeId, side: Side },
    /// The node has no live descendants on that side.
    NothingToCollapse { node: NodeId, side: Side },
    /// No node is selected / marked.
    EmptySelection,
    /// The request would not change anything.
    NoChange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingNode(id) => write!(f, "node {id} not found"),
            SkipReason::Deleting(id) => write!(f, "node {id} is being deleted"),
            SkipReason::NothingCollapsed { node, side } => {
                write!(f, "node {node} has nothing collapsed on the {side} side")
            }
            SkipReason::NothingToCollapse { node, side } => {
                write!(f, "node {node} has no descendants on the {side} side")
            }
            SkipReason::EmptySelection => f.write_str("nothing selected"),
            SkipReason::NoChange => f.write_str("no change"),
        }
    }
}

/// Result of an accepted edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Skipped(SkipReason),
}

impl EditOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}
