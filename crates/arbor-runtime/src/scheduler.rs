//! Deferred work driven by frame ticks.
//!
//! Two kinds of work wait on the renderer rather than running inline:
//!
//! - **Relayout** after an insertion, so the new node can be measured first.
//!   Requests for the same root coalesce (latest wins: the deadline moves
//!   out by `relayout_delay` on every request). A second, hard deadline
//!   bounds how long a steady stream of requests can postpone the pass.
//! - **Deletion finalize** after the exit animation window.
//!
//! ```text
//!   schedule ──► pending ──tick(dt)──► elapsed ≥ due ──► drained as DueTask
//!                   │
//!                   └── cancel_all() (undo/redo) ──► dropped
//! ```
//!
//! # Invariants
//!
//! - Time only advances through [`DeferredTasks::tick`]; identical call
//!   sequences drain identical tasks.
//! - At most one relayout is pending per root.
//! - Due tasks drain in scheduling order.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Zero delay | Due on the next tick |
//! | Root deleted before due | Task still drains; the session skips it |
//! | Undo/redo while pending | Dropped by `cancel_all` |

#![forbid(unsafe_code)]

use std::time::Duration;

use arbor_core::NodeId;

/// Multiple of the relayout delay after which a coalesced relayout runs
/// regardless of newer requests.
const HARD_DEADLINE_FACTOR: u32 = 4;

/// Work whose deadline has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueTask {
    /// Relayout the tree under this root.
    Relayout { root: NodeId },
    /// Remove nodes previously marked for deletion.
    FinalizeDeletion { ids: Vec<NodeId> },
}

#[derive(Debug, Clone)]
struct Pending {
    task: DueTask,
    seq: u64,
    due: Duration,
    hard: Duration,
}

/// Tick-driven deferred task queue.
#[derive(Debug, Clone, Default)]
pub struct DeferredTasks {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

impl DeferredTasks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a relayout of `root` after `delay`. A pending request for the
    /// same root is pushed back instead of duplicated.
    pub fn schedule_relayout(&mut self, root: NodeId, delay: Duration) {
        let now = self.now;
        if let Some(existing) = self.pending.iter_mut().find(
            |p| matches!(&p.task, DueTask::Relayout { root: r } if *r == root),
        ) {
            existing.due = (now + delay).min(existing.hard);
            tracing::trace!(root = %root, "relayout coalesced");
            return;
        }
        tracing::trace!(root = %root, "relayout scheduled");
        self.push(DueTask::Relayout { root }, delay, delay * HARD_DEADLINE_FACTOR);
    }

    /// Request removal of `ids` after `delay`.
    pub fn schedule_deletion(&mut self, ids: Vec<NodeId>, delay: Duration) {
        self.push(DueTask::FinalizeDeletion { ids }, delay, delay);
    }

    fn push(&mut self, task: DueTask, delay: Duration, hard: Duration) {
        self.seq += 1;
        self.pending.push(Pending {
            task,
            seq: self.seq,
            due: self.now + delay,
            hard: self.now + hard,
        });
    }

    /// Advance time by `dt` and drain every task whose deadline passed.
    pub fn tick(&mut self, dt: Duration) -> Vec<DueTask> {
        self.now += dt;
        let now = self.now;
        let (mut due, rest): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by_key(|p| p.seq);
        due.into_iter().map(|p| p.task).collect()
    }

    /// Drop everything pending. Returns how many tasks were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Drop pending deletion finalizes, returning their id sets.
    pub fn take_deletions(&mut self) -> Vec<Vec<NodeId>> {
        let mut taken = Vec::new();
        self.pending.retain(|p| match &p.task {
            DueTask::FinalizeDeletion { ids } => {
                taken.push(ids.clone());
                false
            }
            DueTask::Relayout { .. } => true,
        });
        taken
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether a relayout of `root` is waiting.
    #[must_use]
    pub fn has_relayout(&self, root: &NodeId) -> bool {
        self.pending
            .iter()
            .any(|p| matches!(&p.task, DueTask::Relayout { root: r } if r == root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);

    fn root(id: &str) -> NodeId {
        NodeId::from(id)
    }

    #[test]
    fn relayout_fires_after_delay() {
        let mut tasks = DeferredTasks::new();
        tasks.schedule_relayout(root("r"), MS_200);
        assert!(tasks.tick(MS_100).is_empty());
        assert_eq!(
            tasks.tick(MS_100),
            vec![DueTask::Relayout { root: root("r") }]
        );
        assert!(tasks.is_idle());
    }

    #[test]
    fn relayouts_for_one_root_coalesce() {
        let mut tasks = DeferredTasks::new();
        tasks.schedule_relayout(root("r"), MS_200);
        tasks.tick(MS_100);
        tasks.schedule_relayout(root("r"), MS_200);
        assert_eq!(tasks.pending_len(), 1);
        // Pushed back: not due at the original deadline.
        assert!(tasks.tick(MS_100).is_empty());
        assert_eq!(tasks.tick(MS_100).len(), 1);
    }

    #[test]
    fn coalescing_is_bounded_by_hard_deadline() {
        let mut tasks = DeferredTasks::new();
        tasks.schedule_relayout(root("r"), MS_200);
        let mut fired_at = None;
        for step in 1..=20 {
            if !tasks.tick(MS_100).is_empty() {
                fired_at = Some(step);
                break;
            }
            tasks.schedule_relayout(root("r"), MS_200);
        }
        assert_eq!(fired_at, Some(8));
    }

    #[test]
    fn distinct_roots_and_order() {
        let mut tasks = DeferredTasks::new();
        tasks.schedule_deletion(vec![root("x")], MS_100);
        tasks.schedule_relayout(root("a"), MS_100);
        tasks.schedule_relayout(root("b"), Duration::ZERO);
        assert!(tasks.has_relayout(&root("a")));
        let due = tasks.tick(MS_100);
        assert_eq!(
            due,
            vec![
                DueTask::FinalizeDeletion {
                    ids: vec![root("x")]
                },
                DueTask::Relayout { root: root("a") },
                DueTask::Relayout { root: root("b") },
            ]
        );
    }

    #[test]
    fn cancel_and_take() {
        let mut tasks = DeferredTasks::new();
        tasks.schedule_relayout(root("r"), MS_200);
        tasks.schedule_deletion(vec![root("d")], MS_200);
        assert_eq!(tasks.take_deletions(), vec![vec![root("d")]]);
        assert_eq!(tasks.pending_len(), 1);
        assert_eq!(tasks.cancel_all(), 1);
        assert!(tasks.tick(MS_200).is_empty());
    }
}
