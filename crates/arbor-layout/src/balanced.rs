#![forbid(unsafe_code)]

//! Balanced strategies: horizontal-balanced and vertical-balanced.
//!
//! The root's children are split into two groups by their `side` and each
//! group is laid out as an independent single-direction tree, mirrored
//! around the root:
//!
//! ```text
//!   left group ◄── root ──► right group        (horizontal-balanced)
//! ```
//!
//! Deeper nodes follow the group of the root child they descend from.
//! Children whose side is not one of the mode's two sides are placed in
//! whichever group is currently smaller (ties go to the mode's default
//! side). Their `side` field is left alone; fixing it is the job of the
//! layout-transition step.

use arbor_core::{Edge, LayoutType, Node};

use crate::options::LayoutOptions;
use crate::strategy::{LayoutResult, LayoutStrategy, collect};
use crate::tree::{Direction, Hierarchy, Placer};

/// Two-sided layout around the root.
#[derive(Debug, Clone, Copy)]
pub struct Balanced {
    layout: LayoutType,
}

impl Balanced {
    /// `layout` must be a balanced mode; anything else is treated as
    /// horizontal-balanced.
    #[must_use]
    pub const fn new(layout: LayoutType) -> Self {
        let layout = match layout {
            LayoutType::VerticalBalanced => LayoutType::VerticalBalanced,
            _ => LayoutType::HorizontalBalanced,
        };
        Self { layout }
    }

    /// `(first, second)` directions, e.g. `(Left, Right)`.
    const fn directions(&self) -> (Direction, Direction) {
        match self.layout {
            LayoutType::VerticalBalanced => (Direction::Up, Direction::Down),
            _ => (Direction::Left, Direction::Right),
        }
    }
}

/// Partition of the root's children.
#[derive(Debug, Default, PartialEq, Eq)]
struct Groups {
    first: Vec<usize>,
    second: Vec<usize>,
}

fn partition(tree: &Hierarchy<'_>, first: Direction, second: Direction) -> Groups {
    let mut groups = Groups::default();
    let mut strays = Vec::new();
    for &kid in &tree.children[0] {
        let side = tree.nodes[kid].side;
        if side == first.side() {
            groups.first.push(kid);
        } else if side == second.side() {
            groups.second.push(kid);
        } else {
            strays.push(kid);
        }
    }
    for kid in strays {
        if groups.first.len() < groups.second.len() {
            groups.first.push(kid);
        } else {
            groups.second.push(kid);
        }
    }
    // Strays were appended; restore sibling order within each group.
    let rank = |slot: &usize| tree.children[0].iter().position(|k| k == slot);
    groups.first.sort_by_key(rank);
    groups.second.sort_by_key(rank);
    groups
}

impl LayoutStrategy for Balanced {
    fn layout_type(&self) -> LayoutType {
        self.layout
    }

    fn calculate(
        &self,
        root: &Node,
        descendants: &[Node],
        edges: &[Edge],
        options: &LayoutOptions,
    ) -> LayoutResult {
        let tree = Hierarchy::build(root, descendants);
        let (first, second) = self.directions();
        let groups = partition(&tree, first, second);

        let mut placer = Placer::new(&tree, options);
        placer.place_group(0, &groups.first, first);
        placer.place_group(0, &groups.second, second);

        arbor_core::trace!(
            root = %root.id,
            first = groups.first.len(),
            second = groups.second.len(),
            layout = ?self.layout,
            "balanced layout"
        );
        collect(root, descendants, edges, &placer.positions, &tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{Point, Side};

    fn position(result: &LayoutResult, id: &str) -> Point {
        result
            .nodes
            .iter()
            .find(|n| n.id.as_str() == id)
            .map(|n| n.position)
            .unwrap()
    }

    #[test]
    fn horizontal_groups_are_mirrored() {
        let root = Node::root("r").at(0.0, 0.0);
        let kids = vec![
            Node::branch("l", "r").with_side(Side::Left).with_sibling_order(0),
            Node::branch("r1", "r").with_side(Side::Right).with_sibling_order(1),
        ];
        let result = Balanced::new(LayoutType::HorizontalBalanced).calculate(
            &root,
            &kids,
            &[],
            &LayoutOptions::default(),
        );
        assert_eq!(position(&result, "l"), Point::new(-380.0, 0.0));
        assert_eq!(position(&result, "r1"), Point::new(380.0, 0.0));
    }

    #[test]
    fn grandchildren_follow_their_group_direction() {
        let root = Node::root("r").at(0.0, 0.0);
        let kids = vec![
            Node::branch("t", "r").with_side(Side::Top).with_sibling_order(0),
            // Deliberately inconsistent side on a deeper node.
            Node::branch("t0", "t").with_side(Side::Bottom).with_sibling_order(0),
        ];
        let result = Balanced::new(LayoutType::VerticalBalanced).calculate(
            &root,
            &kids,
            &[],
            &LayoutOptions::default(),
        );
        assert_eq!(position(&result, "t").y, -130.0);
        assert_eq!(position(&result, "t0").y, -260.0);
        let t0 = result.nodes.iter().find(|n| n.id.as_str() == "t0").unwrap();
        assert_eq!(t0.side, Side::Bottom);
    }

    #[test]
    fn invalid_sides_fill_the_smaller_group() {
        let root = Node::root("r").at(0.0, 0.0);
        let kids = vec![
            Node::branch("a", "r").with_side(Side::Right).with_sibling_order(0),
            Node::branch("b", "r").with_side(Side::Right).with_sibling_order(1),
            Node::branch("c", "r").with_side(Side::Top).with_sibling_order(2),
        ];
        let tree = Hierarchy::build(&root, &kids);
        let groups = partition(&tree, Direction::Left, Direction::Right);
        assert_eq!(groups.first, vec![3]);
        assert_eq!(groups.second, vec![1, 2]);
    }
}
