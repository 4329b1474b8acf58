#![forbid(unsafe_code)]

//! Strategy interface and registry.
//!
//! A strategy maps one tree (a root plus its descendants) to target
//! coordinates. Strategies are pure: they never touch `side`, levels, or
//! edges, and the same input always yields the same output.

use arbor_core::{Edge, LayoutType, Node};

use crate::balanced::Balanced;
use crate::directional::Directional;
use crate::options::LayoutOptions;
use crate::tree::Direction;

/// Output of a layout pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutResult {
    /// Root first, then descendants in input order, with new positions.
    pub nodes: Vec<Node>,
    /// Input edges, unchanged.
    pub edges: Vec<Edge>,
}

/// A layout algorithm for a single tree.
pub trait LayoutStrategy: Send + Sync {
    /// The layout mode this strategy implements.
    fn layout_type(&self) -> LayoutType;

    /// Compute positions for `root` and `descendants`.
    ///
    /// Descendants not reachable from `root` through `parent_id` links are
    /// returned unmoved.
    fn calculate(
        &self,
        root: &Node,
        descendants: &[Node],
        edges: &[Edge],
        options: &LayoutOptions,
    ) -> LayoutResult;
}

static RIGHT_ONLY: Directional = Directional::new(Direction::Right);
static LEFT_ONLY: Directional = Directional::new(Direction::Left);
static BOTTOM_ONLY: Directional = Directional::new(Direction::Down);
static TOP_ONLY: Directional = Directional::new(Direction::Up);
static HORIZONTAL_BALANCED: Balanced = Balanced::new(LayoutType::HorizontalBalanced);
static VERTICAL_BALANCED: Balanced = Balanced::new(LayoutType::VerticalBalanced);

/// The strategy for a layout mode.
#[must_use]
pub fn strategy_for(layout: LayoutType) -> &'static dyn LayoutStrategy {
    match layout {
        LayoutType::RightOnly => &RIGHT_ONLY,
        LayoutType::LeftOnly => &LEFT_ONLY,
        LayoutType::BottomOnly => &BOTTOM_ONLY,
        LayoutType::TopOnly => &TOP_ONLY,
        LayoutType::HorizontalBalanced => &HORIZONTAL_BALANCED,
        LayoutType::VerticalBalanced => &VERTICAL_BALANCED,
    }
}

/// Assemble a result from placed slots, keeping input order.
pub(crate) fn collect(
    root: &Node,
    descendants: &[Node],
    edges: &[Edge],
    positions: &[Option<arbor_core::Point>],
    tree: &crate::tree::Hierarchy<'_>,
) -> LayoutResult {
    let mut nodes = Vec::with_capacity(tree.len());
    for (slot, node) in tree.nodes.iter().enumerate() {
        let mut placed = (*node).clone();
        if let Some(position) = positions[slot] {
            placed.position = position;
        }
        nodes.push(placed);
    }
    // Duplicates of the root id inside `descendants` were skipped by the
    // hierarchy; pass them through so nothing is lost.
    nodes.extend(descendants.iter().filter(|n| n.id == root.id).cloned());
    LayoutResult {
        nodes,
        edges: edges.to_vec(),
    }
}
