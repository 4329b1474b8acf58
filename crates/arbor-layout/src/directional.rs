#![forbid(unsafe_code)]

//! Single-direction strategies: right-only, left-only, top-only,
//! bottom-only.
//!
//! Every branch grows away from its parent in one fixed direction; children
//! of a node are stacked along the cross axis in sibling order.

use arbor_core::{Edge, LayoutType, Node};

use crate::options::LayoutOptions;
use crate::strategy::{LayoutResult, LayoutStrategy, collect};
use crate::tree::{Direction, Hierarchy, Placer};

/// Grows every subtree in `direction`.
#[derive(Debug, Clone, Copy)]
pub struct Directional {
    direction: Direction,
}

impl Directional {
    #[must_use]
    pub const fn new(direction: Direction) -> Self {
        Self { direction }
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

impl LayoutStrategy for Directional {
    fn layout_type(&self) -> LayoutType {
        match self.direction {
            Direction::Right => LayoutType::RightOnly,
            Direction::Left => LayoutType::LeftOnly,
            Direction::Down => LayoutType::BottomOnly,
            Direction::Up => LayoutType::TopOnly,
        }
    }

    fn calculate(
        &self,
        root: &Node,
        descendants: &[Node],
        edges: &[Edge],
        options: &LayoutOptions,
    ) -> LayoutResult {
        let tree = Hierarchy::build(root, descendants);
        let mut placer = Placer::new(&tree, options);
        let kids = tree.children[0].clone();
        placer.place_group(0, &kids, self.direction);
        arbor_core::trace!(
            root = %root.id,
            placed = tree.order.len(),
            layout = ?self.layout_type(),
            "directional layout"
        );
        collect(root, descendants, edges, &placer.positions, &tree)
    }
}
