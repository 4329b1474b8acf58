//! Property tests for editing sessions.
//!
//! Random edit sequences are replayed against a session with animation and
//! deletion delays turned off, so every accepted edit lands immediately.
//! The forest property is also checked with a deletion delay, where edits
//! and ticks interleave with marked nodes still waiting for removal.
//!
//! 1. The live graph stays a forest: parents are live, levels step by one,
//!    each branch has exactly one incoming edge from its parent, and stashed
//!    records never share ids with live ones or with each other.
//! 2. Collapsing a side and expanding it again restores the same records.
//! 3. Moves keep levels consistent; cyclic moves change nothing.
//! 4. Identical edit sequences produce identical graphs.
//! 5. Undo and redo restore the exact snapshots around an edit.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use arbor_core::{Edge, GraphSnapshot, LayoutType, Node, NodeId, Point, Side};
use arbor_runtime::{EditError, EngineConfig, Session};
use proptest::prelude::*;
use proptest::sample::Index;

fn instant() -> EngineConfig {
    EngineConfig::default()
        .with_animation_duration(Duration::ZERO)
        .with_deletion_delay(Duration::ZERO)
}

fn delayed() -> EngineConfig {
    EngineConfig::default()
        .with_animation_duration(Duration::ZERO)
        .with_deletion_delay(Duration::from_millis(300))
}

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    AddRoot,
    AddChild(Index, Option<Side>),
    Move(Index, Index),
    Delete(Index),
    Collapse(Index, Side),
    Expand(Index, Side),
    SetLayout(Index, LayoutType),
    Undo,
    Tick(u16),
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop::sample::select(vec![Side::Left, Side::Right, Side::Top, Side::Bottom])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::AddRoot),
        6 => (any::<Index>(), prop::option::of(side_strategy()))
            .prop_map(|(i, side)| Op::AddChild(i, side)),
        3 => (any::<Index>(), any::<Index>()).prop_map(|(a, b)| Op::Move(a, b)),
        2 => any::<Index>().prop_map(Op::Delete),
        2 => (any::<Index>(), side_strategy()).prop_map(|(i, s)| Op::Collapse(i, s)),
        2 => (any::<Index>(), side_strategy()).prop_map(|(i, s)| Op::Expand(i, s)),
        1 => (any::<Index>(), prop::sample::select(LayoutType::ALL.to_vec()))
            .prop_map(|(i, l)| Op::SetLayout(i, l)),
        1 => Just(Op::Undo),
        2 => (16u16..400).prop_map(Op::Tick),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..60)
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn pick(session: &Session, index: &Index) -> Option<NodeId> {
    let nodes = session.nodes();
    if nodes.is_empty() {
        return None;
    }
    Some(nodes[index.index(nodes.len())].id.clone())
}

/// Apply one op. Returns whether it changed the graph through an edit.
fn apply(session: &mut Session, op: &Op) -> bool {
    match op {
        Op::AddRoot => {
            let n = session.nodes().len() as f64;
            session.add_root("Root", Point::new(n * 1000.0, 0.0));
            true
        }
        Op::AddChild(i, side) => match pick(session, i) {
            Some(parent) => session.add_child(&parent, *side).is_some(),
            None => false,
        },
        Op::Move(a, b) => match (pick(session, a), pick(session, b)) {
            (Some(source), Some(target)) => session
                .move_to_child(&source, &target, None)
                .is_ok_and(|outcome| outcome.is_applied()),
            _ => false,
        },
        Op::Delete(i) => match pick(session, i) {
            Some(id) => {
                session.select([&id]);
                session.mark_for_deletion().is_applied()
            }
            None => false,
        },
        Op::Collapse(i, side) => match pick(session, i) {
            Some(id) => session.collapse(&id, *side).is_applied(),
            None => false,
        },
        Op::Expand(i, side) => match pick(session, i) {
            Some(id) => session.expand(&id, *side).is_applied(),
            None => false,
        },
        Op::SetLayout(i, layout) => {
            let root = pick(session, i)
                .and_then(|id| session.store().get_root_of(&id).cloned());
            match root {
                Some(root) => session.set_layout_type(&root, *layout).is_applied(),
                None => false,
            }
        }
        Op::Undo => session.undo(),
        Op::Tick(ms) => {
            session.tick(Duration::from_millis(u64::from(*ms)));
            false
        }
    }
}

fn check_forest(session: &Session) -> Result<(), TestCaseError> {
    let by_id: HashMap<&NodeId, &Node> = session.nodes().iter().map(|n| (&n.id, n)).collect();
    prop_assert_eq!(by_id.len(), session.nodes().len(), "duplicate live ids");

    for node in session.nodes() {
        let root = session.store().get_root_of(&node.id);
        prop_assert!(root.is_some(), "{} has no root", node.id);
        match &node.parent_id {
            None => {
                prop_assert!(node.is_root(), "{} has no parent but is a branch", node.id);
                prop_assert_eq!(node.level, 0);
            }
            Some(parent) => {
                prop_assert!(!node.is_root(), "{} is a root with a parent", node.id);
                let parent = by_id.get(parent);
                prop_assert!(parent.is_some(), "{} has a dead parent", node.id);
                prop_assert_eq!(node.level, parent.unwrap().level + 1);
            }
        }
        let incoming: Vec<&Edge> = session
            .edges()
            .iter()
            .filter(|e| e.target == node.id)
            .collect();
        match &node.parent_id {
            None => prop_assert!(incoming.is_empty(), "root {} has an incoming edge", node.id),
            Some(parent) => {
                prop_assert_eq!(incoming.len(), 1, "{} incoming edges", node.id);
                prop_assert_eq!(&incoming[0].source, parent);
            }
        }
    }
    for edge in session.edges() {
        prop_assert!(by_id.contains_key(&edge.source), "dangling edge {}", edge.id);
        prop_assert!(by_id.contains_key(&edge.target), "dangling edge {}", edge.id);
    }

    let mut stashed = Vec::new();
    for node in session.nodes() {
        if let Some(subtree) = &node.collapsed_subtree {
            subtree.for_each_node(&mut |hidden| stashed.push(hidden.id.clone()));
        }
    }
    for id in &stashed {
        prop_assert!(!by_id.contains_key(id), "{} is both live and stashed", id);
    }
    let unique: HashSet<&NodeId> = stashed.iter().collect();
    prop_assert_eq!(unique.len(), stashed.len(), "a node is stashed twice");
    Ok(())
}

fn sorted(snapshot: GraphSnapshot) -> (Vec<Node>, Vec<Edge>) {
    let GraphSnapshot {
        mut nodes,
        mut edges,
    } = snapshot;
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    (nodes, edges)
}

/// A session holding one right-only tree with a branch per entry of
/// `parents`, each hung under an earlier node.
fn grown(parents: &[Index]) -> (Session, NodeId) {
    let mut session = Session::new(instant().with_default_layout_type(LayoutType::RightOnly));
    let root = session.add_root("Root", Point::ZERO);
    let mut ids = vec![root.clone()];
    for parent in parents {
        let parent = ids[parent.index(ids.len())].clone();
        if let Some(child) = session.add_child(&parent, None) {
            ids.push(child);
        }
    }
    (session, root)
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn edits_preserve_the_forest(ops in ops_strategy()) {
        let mut session = Session::new(instant());
        session.add_root("Root", Point::ZERO);
        for op in &ops {
            apply(&mut session, op);
            check_forest(&session)?;
        }
    }

    #[test]
    fn edits_preserve_the_forest_during_deletion_windows(ops in ops_strategy()) {
        let mut session = Session::new(delayed());
        session.add_root("Root", Point::ZERO);
        for op in &ops {
            apply(&mut session, op);
            check_forest(&session)?;
        }
        // Whatever is still marked goes once the window closes.
        session.finalize_deletion();
        check_forest(&session)?;
        prop_assert!(session.nodes().iter().all(|n| !n.is_deleting()));
    }

    #[test]
    fn collapse_then_expand_restores_records(
        parents in prop::collection::vec(any::<Index>(), 1..25),
        pick_owner in any::<Index>(),
    ) {
        let (mut session, _) = grown(&parents);
        let owners: Vec<NodeId> = session
            .nodes()
            .iter()
            .filter(|n| !session.store().children(&n.id).is_empty())
            .map(|n| n.id.clone())
            .collect();
        prop_assume!(!owners.is_empty());
        let owner = owners[pick_owner.index(owners.len())].clone();

        let before = sorted(session.snapshot());
        prop_assert!(session.collapse(&owner, Side::Right).is_applied());
        prop_assert!(session.node(&owner).unwrap().has_collapsed(Side::Right));
        prop_assert!(session.store().children(&owner).is_empty());
        prop_assert!(session.expand(&owner, Side::Right).is_applied());
        let after = sorted(session.snapshot());
        prop_assert_eq!(before, after);
    }

    #[test]
    fn moves_keep_levels_consistent(
        parents in prop::collection::vec(any::<Index>(), 2..25),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let (mut session, _) = grown(&parents);
        let n = session.nodes().len();
        let source = session.nodes()[a.index(n)].id.clone();
        let target = session.nodes()[b.index(n)].id.clone();
        let before = session.snapshot();
        let depth = session.history().undo_depth();

        match session.move_to_child(&source, &target, None) {
            Ok(_) => {
                let mut moved = session.store().descendants(&source);
                moved.push(source.clone());
                for id in &moved {
                    let node = session.node(id).unwrap();
                    let parent = session.node(node.parent_id.as_ref().unwrap()).unwrap();
                    prop_assert_eq!(node.level, parent.level + 1);
                }
                check_forest(&session)?;
            }
            Err(EditError::SameNode(_)) => prop_assert_eq!(&source, &target),
            Err(EditError::WouldCreateCycle { .. }) => {
                prop_assert!(session.store().is_descendant(&source, &target));
                prop_assert_eq!(session.snapshot(), before);
                prop_assert_eq!(session.history().undo_depth(), depth);
            }
        }
    }

    #[test]
    fn cyclic_moves_are_rejected(parents in prop::collection::vec(any::<Index>(), 2..25)) {
        let (mut session, root) = grown(&parents);
        let before = session.snapshot();
        for target in session.store().descendants(&root) {
            let result = session.move_to_child(&root, &target, None);
            let is_cycle = matches!(result, Err(EditError::WouldCreateCycle { .. }));
            prop_assert!(is_cycle);
        }
        prop_assert_eq!(session.snapshot(), before);
        prop_assert!(!session.can_redo());
    }

    #[test]
    fn identical_edits_give_identical_graphs(ops in ops_strategy()) {
        let mut first = Session::new(instant());
        let mut second = Session::new(instant());
        first.add_root("Root", Point::ZERO);
        second.add_root("Root", Point::ZERO);
        for op in &ops {
            apply(&mut first, op);
            apply(&mut second, op);
        }
        prop_assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn undo_redo_restore_exact_snapshots(ops in ops_strategy(), last in op_strategy()) {
        let mut session = Session::new(instant());
        session.add_root("Root", Point::ZERO);
        for op in &ops {
            apply(&mut session, op);
        }
        prop_assume!(!matches!(last, Op::Undo));

        // Selection is not an edit; take the "before" picture after it.
        if let Op::Delete(i) = &last {
            if let Some(id) = pick(&session, i) {
                session.select([&id]);
            }
        }
        let before = session.snapshot();
        prop_assume!(apply(&mut session, &last));
        let after = session.snapshot();

        prop_assert!(session.undo());
        prop_assert_eq!(session.snapshot(), before);
        prop_assert!(session.redo());
        prop_assert_eq!(session.snapshot(), after);
    }
}
