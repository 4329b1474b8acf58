#![forbid(unsafe_code)]

//! Side assignment for layout-mode changes.
//!
//! Strategies never rewrite `side`. When an author switches a tree to a
//! different mode, the caller runs [`assign_sides`] first so every branch
//! sits on a side the new mode understands, then [`refresh_anchors`] so
//! edges leave and enter on the matching box faces.
//!
//! # Rules
//!
//! - Balanced modes: the root's children, in sibling order, alternate
//!   between the mode's two sides (first side first). Every descendant
//!   takes the side of the root child it hangs under.
//! - Single-direction modes: every branch takes the mode's only side.
//! - Roots are always `mid`.

use std::collections::{HashMap, HashSet};

use arbor_core::{Edge, LayoutType, Node, NodeId, Side};

use crate::sibling_order::order_key;

/// Rewrite `side` for the tree rooted at `root` under `layout`.
///
/// Nodes outside that tree are untouched. Returns the ids whose side
/// changed.
pub fn assign_sides(nodes: &mut [Node], root: &NodeId, layout: LayoutType) -> Vec<NodeId> {
    let slot_of: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(slot, n)| (n.id.clone(), slot))
        .collect();
    let Some(&root_slot) = slot_of.get(root) else {
        return Vec::new();
    };

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (slot, node) in nodes.iter().enumerate() {
        if slot == root_slot {
            continue;
        }
        if let Some(&parent) = node.parent_id.as_ref().and_then(|p| slot_of.get(p)) {
            children.entry(parent).or_default().push(slot);
        }
    }
    for list in children.values_mut() {
        list.sort_by_key(|&slot| order_key(&nodes[slot], slot));
    }

    let sides = layout.valid_sides();
    let mut assignment: Vec<(usize, Side)> = vec![(root_slot, Side::Mid)];
    let mut visited: HashSet<usize> = HashSet::from([root_slot]);
    let top = children.get(&root_slot).cloned().unwrap_or_default();
    for (index, &kid) in top.iter().enumerate() {
        let side = if layout.is_balanced() {
            sides[index % sides.len()]
        } else {
            layout.default_side()
        };
        let mut stack = vec![kid];
        while let Some(slot) = stack.pop() {
            if !visited.insert(slot) {
                continue;
            }
            assignment.push((slot, side));
            if let Some(list) = children.get(&slot) {
                stack.extend(list.iter().copied());
            }
        }
    }

    let mut changed = Vec::new();
    for (slot, side) in assignment {
        let node = &mut nodes[slot];
        if node.side != side {
            node.side = side;
            changed.push(node.id.clone());
        }
    }
    changed
}

/// Re-anchor every edge whose target is in `nodes`: the source end leaves
/// on the child's side, the target end enters from the opposite face.
pub fn refresh_anchors(nodes: &[Node], edges: &mut [Edge]) {
    let side_of: HashMap<&NodeId, Side> = nodes.iter().map(|n| (&n.id, n.side)).collect();
    for edge in edges.iter_mut() {
        if let Some(&side) = side_of.get(&edge.target) {
            edge.set_anchors(side);
        }
    }
}

/// Side for a new child of a root: the valid side with fewer existing
/// children, ties going to the mode's default side.
#[must_use]
pub fn next_child_side(existing: impl IntoIterator<Item = Side>, layout: LayoutType) -> Side {
    let sides = layout.valid_sides();
    if !layout.is_balanced() {
        return layout.default_side();
    }
    let mut counts = [0usize; 2];
    for side in existing {
        if let Some(index) = sides.iter().position(|s| *s == side) {
            counts[index] += 1;
        }
    }
    match counts[0].cmp(&counts[1]) {
        std::cmp::Ordering::Less => sides[0],
        std::cmp::Ordering::Greater => sides[1],
        std::cmp::Ordering::Equal => layout.default_side(),
    }
}
