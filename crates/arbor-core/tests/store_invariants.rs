//! Property tests for the graph state store.
//!
//! 1. Selection always equals the set of nodes carrying `SELECTED`.
//! 2. Every node with an intact chain resolves to a root-kind node.
//! 3. `descendants(r)` of every root covers exactly the nodes resolving to r
//!    (minus r itself) in a well-formed forest.
//! 4. `is_descendant` agrees with `descendants`.

use std::collections::BTreeSet;

use arbor_core::{GraphStore, Node, NodeFlags, NodeId, Side};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

/// A random forest: node `i > 0` either becomes a new root or attaches to an
/// earlier node, so the result never contains a cycle.
fn forest_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec((any::<bool>(), any::<prop::sample::Index>(), any::<bool>()), 1..40)
        .prop_map(|draws| {
            let mut nodes: Vec<Node> = Vec::with_capacity(draws.len());
            for (i, (new_root, parent, selected)) in draws.into_iter().enumerate() {
                let id = format!("n{i}");
                let mut node = if i == 0 || new_root {
                    Node::root(id.as_str())
                } else {
                    let parent = &nodes[parent.index(i)];
                    Node::branch(id.as_str(), parent.id.clone())
                        .with_level(parent.level + 1)
                        .with_side(Side::Right)
                };
                if selected {
                    node.flags.insert(NodeFlags::SELECTED);
                }
                nodes.push(node);
            }
            nodes
        })
}

proptest! {
    #[test]
    fn selection_tracks_flags(nodes in forest_strategy()) {
        let store = GraphStore::from_parts(nodes.clone(), Vec::new());
        let expected: BTreeSet<NodeId> = nodes
            .iter()
            .filter(|n| n.flags.contains(NodeFlags::SELECTED))
            .map(|n| n.id.clone())
            .collect();
        prop_assert_eq!(store.selected_nodes(), &expected);
    }

    #[test]
    fn every_node_resolves_to_a_root(nodes in forest_strategy()) {
        let store = GraphStore::from_parts(nodes, Vec::new());
        for node in store.nodes() {
            let root = store.get_root_of(&node.id);
            prop_assert!(root.is_some());
            let root_node = store.node(root.unwrap()).unwrap();
            prop_assert!(root_node.is_root());
        }
    }

    #[test]
    fn descendants_partition_the_forest(nodes in forest_strategy()) {
        let store = GraphStore::from_parts(nodes, Vec::new());
        let mut covered = 0usize;
        for root in store.roots() {
            let below = store.descendants(&root.id);
            for id in &below {
                prop_assert_eq!(store.get_root_of(id), Some(&root.id));
                prop_assert!(store.is_descendant(&root.id, id));
            }
            covered += below.len() + 1;
        }
        prop_assert_eq!(covered, store.nodes().len());
    }
}
