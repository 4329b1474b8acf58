#![forbid(unsafe_code)]

//! Sibling-order resolution.
//!
//! Before every layout pass the rank of each node among its siblings is
//! re-derived from where the node currently sits on the canvas. An author
//! who drags a branch above its sibling therefore sees that order survive
//! the next automatic layout instead of being snapped back.
//!
//! # Ordering rules
//!
//! | Layout | Primary key | Grouping |
//! |--------|-------------|----------|
//! | right-only / left-only | `y` ascending | none |
//! | top-only / bottom-only | `x` ascending | none |
//! | horizontal-balanced | `y` ascending | left of parent first |
//! | vertical-balanced | `x` ascending | above parent first |
//!
//! Ties keep the previous `sibling_order` (unranked last), then collection
//! order, so resolution is deterministic.
//!
//! Roots are never ranked. Nodes whose parent is not in the input keep
//! their existing rank.

use std::cmp::Ordering;
use std::collections::HashMap;

use arbor_core::{Flow, LayoutType, Node, NodeId, Point};

/// Return a copy of `nodes` with `sibling_order` rewritten from positions.
#[must_use]
pub fn resolve(nodes: &[Node], layout: LayoutType) -> Vec<Node> {
    let mut out = nodes.to_vec();
    resolve_in_place(&mut out, layout);
    out
}

/// Rewrite `sibling_order` of every non-root node from its position.
pub fn resolve_in_place(nodes: &mut [Node], layout: LayoutType) {
    let ranks = rank(nodes, layout);
    for (slot, rank) in ranks {
        nodes[slot].sibling_order = Some(rank);
    }
}

/// Compute `(slot, rank)` pairs without mutating anything.
fn rank(nodes: &[Node], layout: LayoutType) -> Vec<(usize, u32)> {
    let positions: HashMap<&NodeId, Point> = nodes.iter().map(|n| (&n.id, n.position)).collect();

    let mut groups: Vec<(&NodeId, Vec<usize>)> = Vec::new();
    let mut group_of: HashMap<&NodeId, usize> = HashMap::new();
    for (slot, node) in nodes.iter().enumerate() {
        if node.is_root() {
            continue;
        }
        let Some(parent) = node.parent_id.as_ref() else {
            continue;
        };
        if !positions.contains_key(parent) {
            continue;
        }
        let group = *group_of.entry(parent).or_insert_with(|| {
            groups.push((parent, Vec::new()));
            groups.len() - 1
        });
        groups[group].1.push(slot);
    }

    let mut ranks = Vec::with_capacity(nodes.len());
    for (parent, mut slots) in groups {
        let anchor = positions[parent];
        slots.sort_by(|&a, &b| compare(&nodes[a], a, &nodes[b], b, anchor, layout));
        for (rank, slot) in slots.into_iter().enumerate() {
            ranks.push((slot, u32::try_from(rank).unwrap_or(u32::MAX)));
        }
    }
    ranks
}

fn compare(
    a: &Node,
    a_slot: usize,
    b: &Node,
    b_slot: usize,
    parent: Point,
    layout: LayoutType,
) -> Ordering {
    let a_key = sort_key(a.position, parent, layout);
    let b_key = sort_key(b.position, parent, layout);
    a_key
        .0
        .cmp(&b_key.0)
        .then_with(|| a_key.1.total_cmp(&b_key.1))
        .then_with(|| previous_rank(a).cmp(&previous_rank(b)))
        .then_with(|| a_slot.cmp(&b_slot))
}

/// `(group, coordinate)`: lower group sorts first, then the coordinate.
fn sort_key(position: Point, parent: Point, layout: LayoutType) -> (u8, f64) {
    match layout {
        LayoutType::HorizontalBalanced => (u8::from(position.x >= parent.x), position.y),
        LayoutType::VerticalBalanced => (u8::from(position.y >= parent.y), position.x),
        _ => match layout.flow() {
            Flow::Horizontal => (0, position.y),
            Flow::Vertical => (0, position.x),
        },
    }
}

fn previous_rank(node: &Node) -> (bool, u32) {
    match node.sibling_order {
        Some(order) => (false, order),
        None => (true, 0),
    }
}

/// Sort key for consuming sibling order: ranked nodes first by rank,
/// unranked after, both falling back to collection slot.
#[must_use]
pub fn order_key(node: &Node, slot: usize) -> (bool, u32, usize) {
    let (unranked, rank) = previous_rank(node);
    (unranked, rank, slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::Side;

    fn order_of(nodes: &[Node], id: &str) -> Option<u32> {
        nodes
            .iter()
            .find(|n| n.id.as_str() == id)
            .and_then(|n| n.sibling_order)
    }

    #[test]
    fn right_only_orders_by_y() {
        let nodes = vec![
            Node::root("r").at(0.0, 0.0),
            Node::branch("a", "r").at(300.0, 200.0).with_sibling_order(0),
            Node::branch("b", "r").at(300.0, -50.0).with_sibling_order(1),
            Node::branch("c", "r").at(300.0, 60.0),
        ];
        let out = resolve(&nodes, LayoutType::RightOnly);
        assert_eq!(order_of(&out, "b"), Some(0));
        assert_eq!(order_of(&out, "c"), Some(1));
        assert_eq!(order_of(&out, "a"), Some(2));
        assert_eq!(order_of(&out, "r"), None);
    }

    #[test]
    fn bottom_only_orders_by_x() {
        let nodes = vec![
            Node::root("r"),
            Node::branch("a", "r").at(400.0, 100.0),
            Node::branch("b", "r").at(-100.0, 100.0),
        ];
        let out = resolve(&nodes, LayoutType::BottomOnly);
        assert_eq!(order_of(&out, "b"), Some(0));
        assert_eq!(order_of(&out, "a"), Some(1));
    }

    #[test]
    fn horizontal_balanced_ranks_left_group_first() {
        let nodes = vec![
            Node::root("r").at(0.0, 0.0),
            Node::branch("r1", "r").at(300.0, -100.0).with_side(Side::Right),
            Node::branch("l1", "r").at(-300.0, 100.0).with_side(Side::Left),
            Node::branch("l0", "r").at(-300.0, -100.0).with_side(Side::Left),
        ];
        let out = resolve(&nodes, LayoutType::HorizontalBalanced);
        assert_eq!(order_of(&out, "l0"), Some(0));
        assert_eq!(order_of(&out, "l1"), Some(1));
        assert_eq!(order_of(&out, "r1"), Some(2));
    }

    #[test]
    fn vertical_balanced_ranks_top_group_first() {
        let nodes = vec![
            Node::root("r").at(0.0, 0.0),
            Node::branch("b", "r").at(0.0, 200.0),
            Node::branch("t", "r").at(500.0, -200.0),
        ];
        let out = resolve(&nodes, LayoutType::VerticalBalanced);
        assert_eq!(order_of(&out, "t"), Some(0));
        assert_eq!(order_of(&out, "b"), Some(1));
    }

    #[test]
    fn ties_keep_previous_rank_then_slot() {
        let nodes = vec![
            Node::root("r"),
            Node::branch("x", "r").at(10.0, 10.0),
            Node::branch("y", "r").at(10.0, 10.0).with_sibling_order(4),
            Node::branch("z", "r").at(10.0, 10.0),
        ];
        let out = resolve(&nodes, LayoutType::LeftOnly);
        assert_eq!(order_of(&out, "y"), Some(0));
        assert_eq!(order_of(&out, "x"), Some(1));
        assert_eq!(order_of(&out, "z"), Some(2));
    }

    #[test]
    fn ranks_are_per_parent() {
        let nodes = vec![
            Node::root("r"),
            Node::branch("a", "r").at(0.0, 0.0),
            Node::branch("a1", "a").at(0.0, 50.0),
            Node::branch("a0", "a").at(0.0, 10.0),
            Node::branch("orphan", "gone").with_sibling_order(9),
        ];
        let out = resolve(&nodes, LayoutType::RightOnly);
        assert_eq!(order_of(&out, "a"), Some(0));
        assert_eq!(order_of(&out, "a0"), Some(0));
        assert_eq!(order_of(&out, "a1"), Some(1));
        assert_eq!(order_of(&out, "orphan"), Some(9));
    }
}
