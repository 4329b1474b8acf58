#![forbid(unsafe_code)]

//! Top-level layout entry points.
//!
//! [`layout_tree`] lays out one tree: it resolves sibling order from the
//! current positions and then runs the strategy named by the root.
//! [`layout_forest`] does the same for every root in a flat collection and
//! passes everything that does not belong to exactly one tree through
//! untouched.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Node with broken or cyclic parent chain | Returned unmoved, counted as orphan |
//! | Edge touching an orphan | Returned unchanged |
//! | Unmeasured node | Laid out with the fallback size |
//! | Empty input | Empty output |

use std::collections::HashMap;

use arbor_core::model::DEFAULT_LAYOUT_TYPE;
use arbor_core::{Edge, GraphStore, LayoutType, Node, NodeId};

use crate::options::LayoutOptions;
use crate::sibling_order;
use crate::strategy::{LayoutResult, strategy_for};

/// Layout type configured on a root node.
#[must_use]
pub fn layout_type_of(root: &Node) -> LayoutType {
    root.kind
        .settings()
        .map_or(DEFAULT_LAYOUT_TYPE, |settings| settings.layout_type())
}

/// Resolve sibling order, then lay out one tree with its root's strategy.
///
/// The returned nodes carry both the new positions and the refreshed
/// `sibling_order`.
#[must_use]
pub fn layout_tree(
    root: &Node,
    descendants: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
) -> LayoutResult {
    let layout = layout_type_of(root);
    let mut ordered = Vec::with_capacity(descendants.len() + 1);
    ordered.push(root.clone());
    ordered.extend(descendants.iter().cloned());
    sibling_order::resolve_in_place(&mut ordered, layout);

    let Some((root, rest)) = ordered.split_first() else {
        return LayoutResult::default();
    };
    strategy_for(layout).calculate(root, rest, edges, options)
}

/// Result of laying out a whole forest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForestLayout {
    /// All input nodes in input order; tree members repositioned.
    pub nodes: Vec<Node>,
    /// All input edges, unchanged.
    pub edges: Vec<Edge>,
    /// Nodes that belong to no tree and were passed through.
    pub orphans: Vec<NodeId>,
}

/// Lay out every tree in `nodes`.
#[must_use]
pub fn layout_forest(nodes: &[Node], edges: &[Edge], options: &LayoutOptions) -> ForestLayout {
    let store = GraphStore::from_parts(nodes.to_vec(), Vec::new());

    let mut members: HashMap<&NodeId, Vec<Node>> = HashMap::new();
    let mut orphans = Vec::new();
    for node in nodes {
        match store.get_root_of(&node.id) {
            Some(root) if root != &node.id => {
                members.entry(root).or_default().push(node.clone());
            }
            Some(_) => {}
            None => orphans.push(node.id.clone()),
        }
    }

    let mut placed: HashMap<NodeId, Node> = HashMap::with_capacity(nodes.len());
    for root in store.roots() {
        let descendants = members.remove(&root.id).unwrap_or_default();
        let result = layout_tree(root, &descendants, &[], options);
        for node in result.nodes {
            placed.insert(node.id.clone(), node);
        }
    }

    if !orphans.is_empty() {
        arbor_core::warn!(
            count = orphans.len(),
            "layout passed through nodes not reachable from any root"
        );
    }

    let nodes = nodes
        .iter()
        .map(|node| placed.get(&node.id).cloned().unwrap_or_else(|| node.clone()))
        .collect();
    ForestLayout {
        nodes,
        edges: edges.to_vec(),
        orphans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{Point, Side};

    #[test]
    fn layout_tree_resolves_order_from_positions() {
        let root = Node::root("r").with_layout_type(LayoutType::RightOnly);
        // b was dragged above a.
        let kids = vec![
            Node::branch("a", "r").at(380.0, 100.0).with_sibling_order(0),
            Node::branch("b", "r").at(380.0, -100.0).with_sibling_order(1),
        ];
        let result = layout_tree(&root, &kids, &[], &LayoutOptions::default());
        let a = result.nodes.iter().find(|n| n.id.as_str() == "a").unwrap();
        let b = result.nodes.iter().find(|n| n.id.as_str() == "b").unwrap();
        assert_eq!(b.sibling_order, Some(0));
        assert_eq!(a.sibling_order, Some(1));
        assert!(b.position.y < a.position.y);
    }

    #[test]
    fn forest_lays_out_each_tree_and_keeps_orphans() {
        let nodes = vec![
            Node::root("r1").at(0.0, 0.0).with_layout_type(LayoutType::RightOnly),
            Node::branch("a", "r1").with_side(Side::Right),
            Node::root("r2").at(5000.0, 0.0).with_layout_type(LayoutType::LeftOnly),
            Node::branch("b", "r2").with_side(Side::Left),
            Node::branch("ghost", "nobody").at(1.0, 2.0),
        ];
        let edges = vec![Edge::new("e1", "r1", "a"), Edge::new("e9", "nobody", "ghost")];
        let out = layout_forest(&nodes, &edges, &LayoutOptions::default());

        assert_eq!(out.nodes.len(), nodes.len());
        assert_eq!(out.edges, edges);
        assert_eq!(out.orphans, vec![NodeId::from("ghost")]);
        assert_eq!(out.nodes[1].position, Point::new(380.0, 0.0));
        assert_eq!(out.nodes[3].position, Point::new(5000.0 - 380.0, 0.0));
        assert_eq!(out.nodes[4].position, Point::new(1.0, 2.0));
    }
}
