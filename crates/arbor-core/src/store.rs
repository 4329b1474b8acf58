#![forbid(unsafe_code)]

//! Graph state store.
//!
//! [`GraphStore`] owns the canonical node and edge collections of a session.
//! All mutation goes through [`GraphStore::set_nodes`] and
//! [`GraphStore::set_edges`]; after each call the derived state is rebuilt:
//!
//! ```text
//!   set_nodes(updater) ──► nodes ──┬──► id index        (id → slot)
//!                                  ├──► child index     (parent → [child])
//!                                  ├──► root cache      (node → owning root)
//!                                  ├──► layout cache    (root → LayoutType)
//!                                  └──► selection       (ids with SELECTED)
//!   set_edges(updater) ──► edges ──┬──► edge index
//!                                  └──► edge selection
//! ```
//!
//! Selection is never set directly; it is a consequence of node flags, so the
//! two cannot drift apart.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Updater introduces a cycle | Accepted; nodes on the cycle have no root |
//! | Dangling `parent_id` | Accepted; node has no root, no parent entry |
//! | Duplicate ids | Accepted; lookups resolve to the last occurrence |
//!
//! Graph-theoretic invariants are the manipulation layer's job. The store
//! only guarantees that its caches describe whatever it was given.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::id::{EdgeId, NodeId};
use crate::model::{DEFAULT_LAYOUT_TYPE, Edge, EdgeFlags, LayoutType, Node, NodeFlags, Side};

/// Whole-collection copy used for undo history and atomic swaps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Canonical node/edge collections plus derived lookup state.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<NodeId, usize>,
    edge_index: HashMap<EdgeId, usize>,
    children: HashMap<NodeId, Vec<NodeId>>,
    node_root: HashMap<NodeId, NodeId>,
    root_layout: HashMap<NodeId, LayoutType>,
    selected_nodes: BTreeSet<NodeId>,
    selected_edges: BTreeSet<EdgeId>,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing collections.
    #[must_use]
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut store = Self {
            nodes,
            edges,
            ..Self::default()
        };
        store.rebuild_node_state();
        store.rebuild_edge_state();
        store
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Mutate the node collection in place, then rebuild derived state.
    pub fn set_nodes(&mut self, updater: impl FnOnce(&mut Vec<Node>)) {
        updater(&mut self.nodes);
        self.rebuild_node_state();
    }

    /// Mutate the edge collection in place, then rebuild derived state.
    pub fn set_edges(&mut self, updater: impl FnOnce(&mut Vec<Edge>)) {
        updater(&mut self.edges);
        self.rebuild_edge_state();
    }

    /// Replace both collections.
    pub fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
        self.rebuild_node_state();
        self.rebuild_edge_state();
    }

    /// Copy both collections.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&slot| &self.nodes[slot])
    }

    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).map(|&slot| &self.edges[slot])
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Whether `raw` names any node or edge, live or stored in a collapsed
    /// snapshot.
    #[must_use]
    pub fn id_in_use(&self, raw: &str) -> bool {
        if self.nodes.iter().any(|n| n.id.as_str() == raw)
            || self.edges.iter().any(|e| e.id.as_str() == raw)
        {
            return true;
        }
        let mut hit = false;
        for node in &self.nodes {
            if let Some(stored) = &node.collapsed_subtree {
                stored.for_each_node(&mut |n| hit |= n.id.as_str() == raw);
                stored.for_each_edge(&mut |e| hit |= e.id.as_str() == raw);
            }
            if hit {
                break;
            }
        }
        hit
    }

    /// Root nodes, in collection order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.is_root())
    }

    /// Ids of the live children of `id`, in collection order.
    #[must_use]
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// All live descendants of `id`, breadth first. Tolerates cycles.
    #[must_use]
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut seen: HashSet<&NodeId> = HashSet::new();
        seen.insert(id);
        let mut out = Vec::new();
        let mut cursor = 0;
        for child in self.children(id) {
            if seen.insert(child) {
                out.push(child.clone());
            }
        }
        while cursor < out.len() {
            let current = out[cursor].clone();
            cursor += 1;
            for child in self.children(&current) {
                if seen.insert(child) {
                    out.push(child.clone());
                }
            }
        }
        out
    }

    /// Whether `candidate` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, ancestor: &NodeId, candidate: &NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = self.node(candidate).and_then(|n| n.parent_id.as_ref());
        while let Some(parent) = cursor {
            if parent == ancestor {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            cursor = self.node(parent).and_then(|n| n.parent_id.as_ref());
        }
        false
    }

    /// The root that owns `id`. `None` when the parent chain is broken or
    /// cyclic.
    #[must_use]
    pub fn get_root_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.node_root.get(id)
    }

    /// Cached layout type of a root. Unknown ids get the default layout.
    #[must_use]
    pub fn root_layout_type(&self, root: &NodeId) -> LayoutType {
        self.root_layout
            .get(root)
            .copied()
            .unwrap_or(DEFAULT_LAYOUT_TYPE)
    }

    /// Layout type governing `id`'s tree.
    #[must_use]
    pub fn layout_type_of(&self, id: &NodeId) -> LayoutType {
        self.get_root_of(id)
            .map_or(DEFAULT_LAYOUT_TYPE, |root| self.root_layout_type(root))
    }

    /// Whether `id` has at least one live child on `side`.
    #[must_use]
    pub fn has_children_on_side(&self, id: &NodeId, side: Side) -> bool {
        self.children(id)
            .iter()
            .filter_map(|child| self.node(child))
            .any(|child| child.side == side)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn selected_nodes(&self) -> &BTreeSet<NodeId> {
        &self.selected_nodes
    }

    #[must_use]
    pub fn selected_edges(&self) -> &BTreeSet<EdgeId> {
        &self.selected_edges
    }

    pub fn select_all(&mut self) {
        self.set_nodes(|nodes| {
            for node in nodes {
                node.flags.insert(NodeFlags::SELECTED);
            }
        });
        self.set_edges(|edges| {
            for edge in edges {
                edge.flags.insert(EdgeFlags::SELECTED);
            }
        });
    }

    pub fn deselect_all(&mut self) {
        self.set_nodes(|nodes| {
            for node in nodes {
                node.flags.remove(NodeFlags::SELECTED);
            }
        });
        self.set_edges(|edges| {
            for edge in edges {
                edge.flags.remove(EdgeFlags::SELECTED);
            }
        });
    }

    /// Select exactly the given nodes; every other node and all edges are
    /// deselected.
    pub fn select_only<'a>(&mut self, ids: impl IntoIterator<Item = &'a NodeId>) {
        let wanted: HashSet<NodeId> = ids.into_iter().cloned().collect();
        self.set_nodes(|nodes| {
            for node in nodes {
                node.flags.set(NodeFlags::SELECTED, wanted.contains(&node.id));
            }
        });
        self.set_edges(|edges| {
            for edge in edges {
                edge.flags.remove(EdgeFlags::SELECTED);
            }
        });
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    fn rebuild_node_state(&mut self) {
        self.node_index.clear();
        self.children.clear();
        self.root_layout.clear();
        self.selected_nodes.clear();

        for (slot, node) in self.nodes.iter().enumerate() {
            self.node_index.insert(node.id.clone(), slot);
            if node.is_selected() {
                self.selected_nodes.insert(node.id.clone());
            }
            if let Some(settings) = node.kind.settings() {
                self.root_layout
                    .insert(node.id.clone(), settings.layout_type());
            }
        }
        for node in &self.nodes {
            let Some(parent) = &node.parent_id else {
                continue;
            };
            if self.node_index.contains_key(parent) {
                self.children
                    .entry(parent.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }
        self.node_root = resolve_roots(&self.nodes, &self.node_index);

        crate::trace!(
            nodes = self.nodes.len(),
            roots = self.root_layout.len(),
            selected = self.selected_nodes.len(),
            "node state rebuilt"
        );
    }

    fn rebuild_edge_state(&mut self) {
        self.edge_index.clear();
        self.selected_edges.clear();
        for (slot, edge) in self.edges.iter().enumerate() {
            self.edge_index.insert(edge.id.clone(), slot);
            if edge.flags.contains(EdgeFlags::SELECTED) {
                self.selected_edges.insert(edge.id.clone());
            }
        }
    }
}

/// Map every node to its owning root, memoising shared ancestor chains.
fn resolve_roots(nodes: &[Node], index: &HashMap<NodeId, usize>) -> HashMap<NodeId, NodeId> {
    let mut resolved: HashMap<NodeId, Option<NodeId>> = HashMap::with_capacity(nodes.len());

    for start in nodes {
        if resolved.contains_key(&start.id) {
            continue;
        }
        let mut path: Vec<&NodeId> = Vec::new();
        let mut on_path: HashSet<&NodeId> = HashSet::new();
        let mut cursor = Some(start);
        let mut found: Option<NodeId> = None;

        while let Some(node) = cursor {
            if let Some(known) = resolved.get(&node.id) {
                found = known.clone();
                break;
            }
            if !on_path.insert(&node.id) {
                // Cycle: nothing on this path has a root.
                break;
            }
            path.push(&node.id);
            if node.is_root() {
                found = Some(node.id.clone());
                break;
            }
            cursor = node
                .parent_id
                .as_ref()
                .and_then(|parent| index.get(parent))
                .map(|&slot| &nodes[slot]);
        }

        for id in path {
            resolved.insert(id.clone(), found.clone());
        }
    }

    resolved
        .into_iter()
        .filter_map(|(id, root)| root.map(|root| (id, root)))
        .collect()
}
