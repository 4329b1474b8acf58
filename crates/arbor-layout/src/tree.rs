#![forbid(unsafe_code)]

//! Index-based hierarchy shared by the strategies.
//!
//! A strategy receives a root and a flat slice of descendants. [`Hierarchy`]
//! turns that into slot-indexed child lists (slot 0 is the root), ordered
//! by sibling rank, and [`Placer`] stacks subtrees along a [`Direction`].
//!
//! # Geometry
//!
//! ```text
//!   parent ──main spacing──► child 0 ┐
//!                                     │ cross spacing
//!                            child 1 ┘
//! ```
//!
//! Each child owns a slot along the cross axis as wide as its whole
//! subtree (`max(own extent, Σ child slots + gaps)`). Slots are stacked
//! around the parent's cross-axis centre and each child is centred in its
//! slot, so sibling subtrees never overlap and adjacent siblings are at
//! least one cross spacing apart.

use std::collections::HashMap;

use arbor_core::{Flow, Node, NodeId, Point, Side, Size};

use crate::options::LayoutOptions;
use crate::sibling_order::order_key;

/// Growth direction of a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    #[must_use]
    pub const fn flow(self) -> Flow {
        match self {
            Direction::Right | Direction::Left => Flow::Horizontal,
            Direction::Down | Direction::Up => Flow::Vertical,
        }
    }

    /// The side a child grown in this direction sits on.
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Direction::Right => Side::Right,
            Direction::Left => Side::Left,
            Direction::Down => Side::Bottom,
            Direction::Up => Side::Top,
        }
    }

    #[must_use]
    pub const fn from_side(side: Side) -> Option<Direction> {
        match side {
            Side::Right => Some(Direction::Right),
            Side::Left => Some(Direction::Left),
            Side::Bottom => Some(Direction::Down),
            Side::Top => Some(Direction::Up),
            Side::Mid => None,
        }
    }

    const fn is_forward(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }
}

/// Root plus reachable descendants, addressed by slot.
pub(crate) struct Hierarchy<'a> {
    pub nodes: Vec<&'a Node>,
    pub children: Vec<Vec<usize>>,
    /// Slots in breadth-first order from the root.
    pub order: Vec<usize>,
}

impl<'a> Hierarchy<'a> {
    pub fn build(root: &'a Node, descendants: &'a [Node]) -> Self {
        let mut nodes: Vec<&'a Node> = Vec::with_capacity(descendants.len() + 1);
        nodes.push(root);
        nodes.extend(descendants.iter().filter(|n| n.id != root.id));

        let mut slot_of: HashMap<&NodeId, usize> = HashMap::with_capacity(nodes.len());
        for (slot, node) in nodes.iter().enumerate() {
            slot_of.entry(&node.id).or_insert(slot);
        }

        let mut children = vec![Vec::new(); nodes.len()];
        for (slot, node) in nodes.iter().enumerate().skip(1) {
            if let Some(&parent) = node.parent_id.as_ref().and_then(|p| slot_of.get(p)) {
                if parent != slot {
                    children[parent].push(slot);
                }
            }
        }
        for list in &mut children {
            list.sort_by_key(|&slot| order_key(nodes[slot], slot));
        }

        let mut visited = vec![false; nodes.len()];
        let mut order = vec![0];
        visited[0] = true;
        let mut cursor = 0;
        while cursor < order.len() {
            let slot = order[cursor];
            cursor += 1;
            for &child in &children[slot] {
                if !visited[child] {
                    visited[child] = true;
                    order.push(child);
                }
            }
        }
        // Drop edges into unreachable slots so placement never walks them.
        for list in &mut children {
            list.retain(|&child| visited[child]);
        }

        Self {
            nodes,
            children,
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Stacks subtrees for one set of options.
pub(crate) struct Placer<'h, 'a> {
    tree: &'h Hierarchy<'a>,
    sizes: Vec<Size>,
    options: LayoutOptions,
    /// Cross-axis subtree extent per slot, per flow.
    horizontal_extent: Vec<f64>,
    vertical_extent: Vec<f64>,
    pub positions: Vec<Option<Point>>,
}

impl<'h, 'a> Placer<'h, 'a> {
    pub fn new(tree: &'h Hierarchy<'a>, options: &LayoutOptions) -> Self {
        let sizes: Vec<Size> = tree
            .nodes
            .iter()
            .map(|node| options.size_of(node.measured))
            .collect();
        let mut placer = Self {
            tree,
            sizes,
            options: *options,
            horizontal_extent: Vec::new(),
            vertical_extent: Vec::new(),
            positions: vec![None; tree.len()],
        };
        placer.horizontal_extent = placer.extents(Flow::Horizontal);
        placer.vertical_extent = placer.extents(Flow::Vertical);
        placer.positions[0] = Some(tree.nodes[0].position);
        placer
    }

    fn cross_size(&self, slot: usize, flow: Flow) -> f64 {
        match flow {
            Flow::Horizontal => self.sizes[slot].height,
            Flow::Vertical => self.sizes[slot].width,
        }
    }

    fn main_size(&self, slot: usize, flow: Flow) -> f64 {
        match flow {
            Flow::Horizontal => self.sizes[slot].width,
            Flow::Vertical => self.sizes[slot].height,
        }
    }

    fn spacing(&self, flow: Flow) -> (f64, f64) {
        // (main, cross)
        match flow {
            Flow::Horizontal => (
                self.options.horizontal_spacing,
                self.options.vertical_spacing,
            ),
            Flow::Vertical => (
                self.options.vertical_spacing,
                self.options.horizontal_spacing,
            ),
        }
    }

    fn extents(&self, flow: Flow) -> Vec<f64> {
        let (_, gap) = self.spacing(flow);
        let mut extent = vec![0.0; self.tree.len()];
        for &slot in self.tree.order.iter().rev() {
            let own = self.cross_size(slot, flow);
            let kids = &self.tree.children[slot];
            extent[slot] = if kids.is_empty() {
                own
            } else {
                own.max(self.stack_extent(kids, &extent, gap))
            };
        }
        extent
    }

    fn stack_extent(&self, kids: &[usize], extent: &[f64], gap: f64) -> f64 {
        let sum: f64 = kids.iter().map(|&k| extent[k]).sum();
        sum + gap * kids.len().saturating_sub(1) as f64
    }

    fn extent(&self, slot: usize, flow: Flow) -> f64 {
        match flow {
            Flow::Horizontal => self.horizontal_extent[slot],
            Flow::Vertical => self.vertical_extent[slot],
        }
    }

    /// Place `kids` of `parent` (already positioned) and everything below
    /// them, growing in `direction`.
    pub fn place_group(&mut self, parent: usize, kids: &[usize], direction: Direction) {
        let mut work: Vec<(usize, Vec<usize>)> = vec![(parent, kids.to_vec())];
        while let Some((parent, kids)) = work.pop() {
            self.stack(parent, &kids, direction);
            for &kid in kids.iter().rev() {
                let grandkids = self.tree.children[kid].clone();
                if !grandkids.is_empty() {
                    work.push((kid, grandkids));
                }
            }
        }
    }

    fn stack(&mut self, parent: usize, kids: &[usize], direction: Direction) {
        if kids.is_empty() {
            return;
        }
        let Some(origin) = self.positions[parent] else {
            return;
        };
        let flow = direction.flow();
        let (main_gap, cross_gap) = self.spacing(flow);
        let slots: Vec<f64> = kids.iter().map(|&k| self.extent(k, flow)).collect();
        let total: f64 = slots.iter().sum::<f64>() + cross_gap * (kids.len() - 1) as f64;

        let (parent_main, parent_cross) = split(origin, flow);
        let parent_main_size = self.main_size(parent, flow);
        let mut cursor = parent_cross + self.cross_size(parent, flow) / 2.0 - total / 2.0;

        for (&kid, &slot) in kids.iter().zip(&slots) {
            let main = if direction.is_forward() {
                parent_main + parent_main_size + main_gap
            } else {
                parent_main - self.main_size(kid, flow) - main_gap
            };
            let cross = cursor + (slot - self.cross_size(kid, flow)) / 2.0;
            self.positions[kid] = Some(join(main, cross, flow));
            cursor += slot + cross_gap;
        }
    }

    /// Subtree extent of a group of root children along the cross axis.
    pub fn group_extent(&self, kids: &[usize], flow: Flow) -> f64 {
        let (_, gap) = self.spacing(flow);
        let extent = match flow {
            Flow::Horizontal => &self.horizontal_extent,
            Flow::Vertical => &self.vertical_extent,
        };
        self.stack_extent(kids, extent, gap)
    }
}

fn split(point: Point, flow: Flow) -> (f64, f64) {
    match flow {
        Flow::Horizontal => (point.x, point.y),
        Flow::Vertical => (point.y, point.x),
    }
}

fn join(main: f64, cross: f64, flow: Flow) -> Point {
    match flow {
        Flow::Horizontal => Point::new(main, cross),
        Flow::Vertical => Point::new(cross, main),
    }
}
