#![forbid(unsafe_code)]

//! Mindmap data model: nodes, edges, and per-tree configuration.
//!
//! A session holds a *forest*: several independent trees stored as two flat
//! collections. Structure is expressed only through `parent_id` back
//! references; nothing owns anything else. Each tree is anchored by a node
//! of kind [`NodeKind::Root`], which carries that tree's layout settings.
//!
//! ```text
//!            Root (level 0, side mid)
//!           /                        \
//!   Branch (left, 1)          Branch (right, 1)
//!         |                     /          \
//!   Branch (left, 2)   Branch (right, 2)  Shape (right, 2)
//! ```
//!
//! # Invariants
//!
//! These are maintained by the manipulation layer, not by the types:
//!
//! 1. Following `parent_id` from any non-root node reaches a root without
//!    revisiting a node.
//! 2. `level(child) == level(parent) + 1` for every live node.
//! 3. A node stored in a [`CollapsedSubtree`] is absent from the live
//!    collections, and vice versa.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};
use crate::id::{EdgeId, NodeId};

/// Edge stroke colour used when a root does not specify one.
pub const DEFAULT_EDGE_COLOR: &str = "#0044FF";

/// Edge stroke width for newly created edges.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Layout applied to trees whose root does not name one.
pub const DEFAULT_LAYOUT_TYPE: LayoutType = LayoutType::HorizontalBalanced;

// ---------------------------------------------------------------------------
// Side / layout type
// ---------------------------------------------------------------------------

/// Which half-plane a branch occupies relative to its root.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
    #[default]
    Mid,
}

impl Side {
    /// The side an edge enters its target from.
    ///
    /// `Mid` has no geometric opposite; it maps to `Left` so that a
    /// root-to-root reparent still yields a usable anchor.
    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Mid => Side::Left,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Mid => "mid",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which a layout grows away from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Children sit left or right of their parent, stacked vertically.
    Horizontal,
    /// Children sit above or below their parent, stacked horizontally.
    Vertical,
}

/// Per-tree layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutType {
    HorizontalBalanced,
    VerticalBalanced,
    RightOnly,
    LeftOnly,
    TopOnly,
    BottomOnly,
}

impl LayoutType {
    pub const ALL: [LayoutType; 6] = [
        LayoutType::HorizontalBalanced,
        LayoutType::VerticalBalanced,
        LayoutType::RightOnly,
        LayoutType::LeftOnly,
        LayoutType::TopOnly,
        LayoutType::BottomOnly,
    ];

    #[must_use]
    pub const fn flow(self) -> Flow {
        match self {
            LayoutType::HorizontalBalanced | LayoutType::RightOnly | LayoutType::LeftOnly => {
                Flow::Horizontal
            }
            LayoutType::VerticalBalanced | LayoutType::TopOnly | LayoutType::BottomOnly => {
                Flow::Vertical
            }
        }
    }

    #[must_use]
    pub const fn is_balanced(self) -> bool {
        matches!(
            self,
            LayoutType::HorizontalBalanced | LayoutType::VerticalBalanced
        )
    }

    /// Sides a branch may occupy under this mode.
    #[must_use]
    pub const fn valid_sides(self) -> &'static [Side] {
        match self {
            LayoutType::HorizontalBalanced => &[Side::Left, Side::Right],
            LayoutType::VerticalBalanced => &[Side::Top, Side::Bottom],
            LayoutType::RightOnly => &[Side::Right],
            LayoutType::LeftOnly => &[Side::Left],
            LayoutType::TopOnly => &[Side::Top],
            LayoutType::BottomOnly => &[Side::Bottom],
        }
    }

    /// Side given to new children when the caller does not choose one.
    #[must_use]
    pub const fn default_side(self) -> Side {
        match self {
            LayoutType::HorizontalBalanced | LayoutType::RightOnly => Side::Right,
            LayoutType::VerticalBalanced | LayoutType::BottomOnly => Side::Bottom,
            LayoutType::LeftOnly => Side::Left,
            LayoutType::TopOnly => Side::Top,
        }
    }

    #[must_use]
    pub fn is_valid_side(self, side: Side) -> bool {
        self.valid_sides().contains(&side)
    }
}

/// Edge path rendering hint, passed through layout untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    #[default]
    Smoothstep,
    Bezier,
    Straight,
    Step,
}

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// Layout and styling configuration owned by a tree's root.
///
/// Every field is optional so that documents written before a field existed
/// can be told apart from ones that set it explicitly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<LayoutType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_layout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_path_type: Option<PathType>,
}

impl TreeSettings {
    #[must_use]
    pub fn layout_type(&self) -> LayoutType {
        self.layout_type.unwrap_or(DEFAULT_LAYOUT_TYPE)
    }

    #[must_use]
    pub fn auto_layout_enabled(&self) -> bool {
        self.auto_layout.unwrap_or(false)
    }

    #[must_use]
    pub fn edge_color(&self) -> &str {
        self.edge_color.as_deref().unwrap_or(DEFAULT_EDGE_COLOR)
    }

    #[must_use]
    pub fn edge_path_type(&self) -> PathType {
        self.edge_path_type.unwrap_or_default()
    }
}

/// Node variant. Only root vs non-root matters structurally; `Shape` and
/// `Image` behave exactly like `Branch` in layout and manipulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Root(TreeSettings),
    #[default]
    Branch,
    Shape,
    Image,
}

impl NodeKind {
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, NodeKind::Root(_))
    }

    #[must_use]
    pub const fn settings(&self) -> Option<&TreeSettings> {
        match self {
            NodeKind::Root(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn settings_mut(&mut self) -> Option<&mut TreeSettings> {
        match self {
            NodeKind::Root(settings) => Some(settings),
            _ => None,
        }
    }
}

bitflags! {
    /// Transient per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct NodeFlags: u8 {
        /// Part of the current selection.
        const SELECTED = 0b0001;
        /// Marked for removal; waiting for the exit animation to finish.
        const DELETING = 0b0010;
        /// Hidden inside an ancestor's collapsed snapshot.
        const COLLAPSED = 0b0100;
    }
}

bitflags! {
    /// Transient per-edge state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EdgeFlags: u8 {
        const SELECTED = 0b0001;
        const DELETING = 0b0010;
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A positioned entity in a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub side: Side,
    /// Rank among siblings; lower sorts first. `None` sorts after all
    /// ranked siblings, in collection order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_order: Option<u32>,
    #[serde(default)]
    pub content: String,
    /// Size last reported by the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Size>,
    #[serde(default)]
    pub flags: NodeFlags,
    /// The ancestor whose collapse hid this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_by: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_subtree: Option<CollapsedSubtree>,
}

impl Node {
    /// A bare node of the given kind at the origin.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Point::ZERO,
            parent_id: None,
            level: 0,
            side: Side::Mid,
            sibling_order: None,
            content: String::new(),
            measured: None,
            flags: NodeFlags::empty(),
            collapsed_by: None,
            collapsed_subtree: None,
        }
    }

    /// A root with default settings.
    #[must_use]
    pub fn root(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeKind::Root(TreeSettings::default()))
    }

    /// A branch attached to `parent`.
    #[must_use]
    pub fn branch(id: impl Into<NodeId>, parent: impl Into<NodeId>) -> Self {
        let mut node = Self::new(id, NodeKind::Branch);
        node.parent_id = Some(parent.into());
        node
    }

    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub fn with_sibling_order(mut self, order: u32) -> Self {
        self.sibling_order = Some(order);
        self
    }

    #[must_use]
    pub fn with_measured(mut self, size: Size) -> Self {
        self.measured = Some(size);
        self
    }

    #[must_use]
    pub fn with_layout_type(mut self, layout: LayoutType) -> Self {
        if let Some(settings) = self.kind.settings_mut() {
            settings.layout_type = Some(layout);
        }
        self
    }

    #[must_use]
    pub fn with_auto_layout(mut self, enabled: bool) -> Self {
        if let Some(settings) = self.kind.settings_mut() {
            settings.auto_layout = Some(enabled);
        }
        self
    }

    #[inline]
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.kind.is_root()
    }

    #[inline]
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(NodeFlags::SELECTED)
    }

    #[inline]
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.flags.contains(NodeFlags::DELETING)
    }

    #[inline]
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.flags.contains(NodeFlags::COLLAPSED)
    }

    /// Whether this node holds a non-empty collapsed snapshot for `side`.
    #[must_use]
    pub fn has_collapsed(&self, side: Side) -> bool {
        self.collapsed_subtree
            .as_ref()
            .and_then(|c| c.get(side))
            .is_some_and(|slot| !slot.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed parent-to-child arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub path_type: PathType,
    pub stroke_color: String,
    pub stroke_width: f64,
    /// Side of the source box the edge leaves from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_anchor: Option<Side>,
    /// Side of the target box the edge enters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_anchor: Option<Side>,
    #[serde(default)]
    pub flags: EdgeFlags,
}

impl Edge {
    #[must_use]
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            path_type: PathType::default(),
            stroke_color: DEFAULT_EDGE_COLOR.to_owned(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            source_anchor: None,
            target_anchor: None,
            flags: EdgeFlags::empty(),
        }
    }

    /// Copy path type and colour from a tree's settings.
    #[must_use]
    pub fn styled_by(mut self, settings: &TreeSettings) -> Self {
        self.path_type = settings.edge_path_type();
        self.stroke_color = settings.edge_color().to_owned();
        self
    }

    /// Anchor an edge for a child sitting on `side` of its parent.
    #[must_use]
    pub fn anchored(mut self, side: Side) -> Self {
        self.set_anchors(side);
        self
    }

    /// Leave the source on `side`, enter the target from the opposite side.
    pub fn set_anchors(&mut self, side: Side) {
        self.source_anchor = Some(side);
        self.target_anchor = Some(side.opposite());
    }

    /// Renderer handle key for the source end, e.g. `right-source-node-1`.
    #[must_use]
    pub fn source_handle(&self) -> Option<String> {
        self.source_anchor
            .map(|side| format!("{side}-source-{}", self.source))
    }

    /// Renderer handle key for the target end, e.g. `left-target-node-2`.
    #[must_use]
    pub fn target_handle(&self) -> Option<String> {
        self.target_anchor
            .map(|side| format!("{side}-target-{}", self.target))
    }

    #[inline]
    #[must_use]
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

// ---------------------------------------------------------------------------
// Collapsed snapshots
// ---------------------------------------------------------------------------

/// Detached nodes and edges of one collapsed side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollapsedSlot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl CollapsedSlot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Per-side storage of hidden descendants, kept on the collapsing node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollapsedSubtree {
    slots: BTreeMap<Side, CollapsedSlot>,
}

impl CollapsedSubtree {
    #[must_use]
    pub fn get(&self, side: Side) -> Option<&CollapsedSlot> {
        self.slots.get(&side)
    }

    /// Add detached records to `side`, appending to anything already stored
    /// there. Other sides are untouched.
    pub fn stash(&mut self, side: Side, nodes: Vec<Node>, edges: Vec<Edge>) {
        let slot = self.slots.entry(side).or_default();
        slot.nodes.extend(nodes);
        slot.edges.extend(edges);
    }

    /// Remove and return the slot for `side`.
    pub fn take(&mut self, side: Side) -> Option<CollapsedSlot> {
        self.slots.remove(&side)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(CollapsedSlot::is_empty)
    }

    /// Sides that currently hold records.
    pub fn sides(&self) -> impl Iterator<Item = Side> + '_ {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(side, _)| *side)
    }

    /// Visit every stored node, descending into nested snapshots.
    pub fn for_each_node<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        for slot in self.slots.values() {
            for node in &slot.nodes {
                f(node);
                if let Some(nested) = &node.collapsed_subtree {
                    nested.for_each_node(f);
                }
            }
        }
    }

    /// Visit every stored edge, descending into nested snapshots.
    pub fn for_each_edge<'a>(&'a self, f: &mut dyn FnMut(&'a Edge)) {
        for slot in self.slots.values() {
            for edge in &slot.edges {
                f(edge);
            }
            for node in &slot.nodes {
                if let Some(nested) = &node.collapsed_subtree {
                    nested.for_each_edge(f);
                }
            }
        }
    }
}
