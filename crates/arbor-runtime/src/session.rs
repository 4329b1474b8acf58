#![forbid(unsafe_code)]

//! Editing session.
//!
//! [`Session`] is the single owner of a mindmap's live state. It funnels
//! every structural edit through the graph store's setters, brackets each
//! accepted edit with one history step, and drives the deferred work the
//! edits leave behind.
//!
//! ```text
//!   request ──► validate ──► history.prepare ──► store.set_* ──► history.commit
//!                  │                                                 │
//!                  └─► Skipped / Err (graph untouched)               ▼
//!                                                    schedule relayout / deletion
//!
//!   tick(dt) ──► animator.tick ──► due tasks ──► apply_layout / finalize
//! ```
//!
//! # Invariants
//!
//! - An edit that returns `Skipped` or `Err` leaves nodes, edges, and
//!   history untouched.
//! - Each applied edit adds exactly one undo step. Layout passes and
//!   animation frames add none.
//! - `undo`/`redo` stop the animator and drop pending relayouts and
//!   deletions before restoring, so stale work never lands on a restored
//!   graph. Nodes restored in the deleting state are rescheduled.
//! - Nodes flagged for deletion take no new children, are never moved,
//!   and are never stashed by a collapse, so a finalize always removes a
//!   whole subtree.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Unknown node id | `Skipped(MissingNode)`, logged at warn |
//! | Node waiting for its deletion finalize | `Skipped(Deleting)`, logged at warn |
//! | Move into own subtree | `Err(WouldCreateCycle)` |
//! | Unmeasured nodes | Placed and laid out with the fallback size |
//! | Relayout due for a deleted root | Dropped silently |

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use arbor_core::{
    CollapsedSlot, Edge, EdgeFlags, Flow, GraphSnapshot, GraphStore, IdAllocator, LayoutType,
    Node, NodeFlags, NodeId, NodeKind, PathType, Point, Side, Size, TreeSettings,
};
use arbor_layout::{SpacingProfile, assign_sides, layout_tree, next_child_side, refresh_anchors};

use crate::animator::{AnimationStatus, TransitionAnimator};
use crate::config::EngineConfig;
use crate::context::{GeneratedNode, TreeContext, tree_context};
use crate::error::{EditError, EditOutcome, SkipReason};
use crate::history::{HistoryConfig, HistoryManager};
use crate::scheduler::{DeferredTasks, DueTask};

/// What one [`Session::tick`] did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub animation: AnimationStatus,
    /// Roots relaid out by deferred requests.
    pub relayouts: Vec<NodeId>,
    /// Nodes removed by deletion finalizes.
    pub deleted: Vec<NodeId>,
}

impl TickReport {
    /// Nothing moved and nothing ran.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.animation == AnimationStatus::Idle
            && self.relayouts.is_empty()
            && self.deleted.is_empty()
    }
}

/// Live mindmap state plus the services that edit it.
#[derive(Debug, Clone)]
pub struct Session {
    store: GraphStore,
    history: HistoryManager,
    animator: TransitionAnimator,
    tasks: DeferredTasks,
    ids: IdAllocator,
    config: EngineConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    /// An empty session.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_graph(config, GraphSnapshot::default())
    }

    /// A session over existing collections. History starts empty.
    #[must_use]
    pub fn with_graph(config: EngineConfig, graph: GraphSnapshot) -> Self {
        Self {
            store: GraphStore::from_parts(graph.nodes, graph.edges),
            history: HistoryManager::new(HistoryConfig {
                max_depth: config.history_limit,
            }),
            animator: TransitionAnimator::new(config.animation_duration),
            tasks: DeferredTasks::new(),
            ids: IdAllocator::new(),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        self.store.nodes()
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        self.store.edges()
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.store.node(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    /// Whether ticks still have something to do.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.animator.is_running() || !self.tasks.is_idle()
    }

    /// Plain-text context of `id` for a content generator.
    #[must_use]
    pub fn tree_context(&self, id: &NodeId) -> Option<TreeContext> {
        tree_context(&self.store, id)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn select<'a>(&mut self, ids: impl IntoIterator<Item = &'a NodeId>) {
        self.store.select_only(ids);
    }

    pub fn select_all(&mut self) {
        self.store.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.store.deselect_all();
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Start a new independent tree.
    pub fn add_root(&mut self, content: impl Into<String>, position: Point) -> NodeId {
        let id = self.next_node_id();
        let root = Node::root(id.clone())
            .at(position.x, position.y)
            .with_content(content)
            .with_layout_type(self.config.default_layout_type);
        self.begin();
        self.store.set_nodes(|nodes| nodes.push(root));
        self.commit();
        tracing::debug!(root = %id, "root added");
        id
    }

    /// Add a branch under `parent`. `None` side picks the emptier side for
    /// root parents and the parent's own side otherwise.
    ///
    /// Returns the new id, or `None` when `parent` is not live.
    pub fn add_child(&mut self, parent: &NodeId, side: Option<Side>) -> Option<NodeId> {
        self.add_child_of_kind(parent, side, NodeKind::Branch)
    }

    /// [`add_child`](Self::add_child) with an explicit node kind. A root
    /// kind is demoted to a branch.
    pub fn add_child_of_kind(
        &mut self,
        parent: &NodeId,
        side: Option<Side>,
        kind: NodeKind,
    ) -> Option<NodeId> {
        if let Some(reason) = self.unavailable(parent) {
            log_skip(&reason);
            return None;
        }
        let Some(parent_node) = self.store.node(parent).cloned() else {
            return None;
        };
        let settings = self.tree_settings(parent);
        let (node, edge) = self.build_child(&parent_node, side, kind, None, &settings, &[]);
        let id = node.id.clone();

        self.begin();
        self.store.set_nodes(|nodes| nodes.push(node));
        self.store.set_edges(|edges| edges.push(edge));
        self.commit();
        tracing::debug!(node = %id, parent = %parent, "child added");
        self.request_relayout(&id);
        Some(id)
    }

    /// Hang generated subtrees under `parent` in one undo step.
    ///
    /// Children of a root are spread over the layout's sides; deeper nodes
    /// take their parent's side. Returns every created id in creation
    /// order, or `None` when `parent` is not live.
    pub fn insert_generated(
        &mut self,
        parent: &NodeId,
        generated: Vec<GeneratedNode>,
    ) -> Option<Vec<NodeId>> {
        if let Some(reason) = self.unavailable(parent) {
            log_skip(&reason);
            return None;
        }
        let Some(parent_node) = self.store.node(parent).cloned() else {
            return None;
        };
        if generated.is_empty() {
            return Some(Vec::new());
        }
        let settings = self.tree_settings(parent);
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        self.generate(&parent_node, generated, &settings, &mut nodes, &mut edges);
        let created: Vec<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();

        self.begin();
        self.store.set_nodes(|live| live.extend(nodes));
        self.store.set_edges(|live| live.extend(edges));
        self.commit();
        tracing::debug!(parent = %parent, count = created.len(), "generated nodes inserted");
        self.request_relayout(parent);
        Some(created)
    }

    fn generate(
        &mut self,
        parent: &Node,
        generated: Vec<GeneratedNode>,
        settings: &TreeSettings,
        nodes: &mut Vec<Node>,
        edges: &mut Vec<Edge>,
    ) {
        for item in generated {
            let (node, edge) = self.build_child(
                parent,
                None,
                NodeKind::Branch,
                Some(item.content),
                settings,
                nodes,
            );
            let placed = node.clone();
            nodes.push(node);
            edges.push(edge);
            self.generate(&placed, item.children, settings, nodes, edges);
        }
    }

    /// A new child of `parent` and its connecting edge. `pending` holds
    /// nodes built in the same edit but not yet in the store.
    fn build_child(
        &mut self,
        parent: &Node,
        requested: Option<Side>,
        kind: NodeKind,
        content: Option<String>,
        settings: &TreeSettings,
        pending: &[Node],
    ) -> (Node, Edge) {
        let layout = settings.layout_type();
        let children: Vec<&Node> = self
            .store
            .children(&parent.id)
            .iter()
            .filter_map(|id| self.store.node(id))
            .chain(
                pending
                    .iter()
                    .filter(|n| n.parent_id.as_ref() == Some(&parent.id)),
            )
            .collect();

        let side = match requested {
            Some(side) => side,
            None if parent.is_root() => next_child_side(children.iter().map(|n| n.side), layout),
            None if parent.side == Side::Mid => layout.default_side(),
            None => parent.side,
        };
        let siblings: Vec<&Node> = if layout.is_balanced() {
            children.iter().copied().filter(|n| n.side == side).collect()
        } else {
            children.clone()
        };
        let position = self.insertion_point(parent, side, layout, &siblings);
        let sibling_order = children
            .iter()
            .filter_map(|n| n.sibling_order)
            .max()
            .map_or(children.len() as u32, |max| max + 1);
        let content = content.unwrap_or_else(|| format!("New node {}", children.len() + 1));
        let kind = if kind.is_root() { NodeKind::Branch } else { kind };

        let id = self.next_node_id();
        let edge_id = {
            let store = &self.store;
            self.ids.edge(|raw| store.id_in_use(raw))
        };
        let mut node = Node::new(id.clone(), kind)
            .at(position.x, position.y)
            .with_side(side)
            .with_level(parent.level + 1)
            .with_sibling_order(sibling_order)
            .with_content(content);
        node.parent_id = Some(parent.id.clone());
        let edge = Edge::new(edge_id, parent.id.clone(), id)
            .styled_by(settings)
            .anchored(side);
        (node, edge)
    }

    /// Where a new child goes before any layout pass: beside the parent on
    /// `side`, past the far edge of the last sibling on that side.
    fn insertion_point(
        &self,
        parent: &Node,
        side: Side,
        layout: LayoutType,
        siblings: &[&Node],
    ) -> Point {
        let options = &self.config.layout;
        let fallback = options.fallback_size;
        let parent_size = options.size_of(parent.measured);
        let origin = parent.position;

        match layout.flow() {
            Flow::Horizontal => {
                // Left children share their right edge, right children their
                // left edge.
                let x = if side == Side::Left {
                    siblings
                        .iter()
                        .map(|n| n.position.x + options.size_of(n.measured).width)
                        .reduce(f64::max)
                        .unwrap_or(origin.x - options.horizontal_spacing)
                        - fallback.width
                } else {
                    siblings
                        .iter()
                        .map(|n| n.position.x)
                        .reduce(f64::min)
                        .unwrap_or(origin.x + parent_size.width + options.horizontal_spacing)
                };
                let y = siblings
                    .iter()
                    .map(|n| n.position.y + options.size_of(n.measured).height)
                    .reduce(f64::max)
                    .map_or(origin.y, |bottom| bottom + options.vertical_spacing);
                Point::new(x, y)
            }
            Flow::Vertical => {
                // Top children share their bottom edge, bottom children their
                // top edge.
                let y = if side == Side::Top {
                    siblings
                        .iter()
                        .map(|n| n.position.y + options.size_of(n.measured).height)
                        .reduce(f64::max)
                        .unwrap_or(origin.y - options.vertical_spacing)
                        - fallback.height
                } else {
                    siblings
                        .iter()
                        .map(|n| n.position.y)
                        .reduce(f64::min)
                        .unwrap_or(origin.y + parent_size.height + options.vertical_spacing)
                };
                let x = siblings
                    .iter()
                    .map(|n| n.position.x + options.size_of(n.measured).width)
                    .reduce(f64::max)
                    .map_or(origin.x, |right| right + options.horizontal_spacing);
                Point::new(x, y)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Collapse / expand
    // -----------------------------------------------------------------------

    /// Hide every descendant of `id` on `side`, storing the detached records
    /// on `id`.
    pub fn collapse(&mut self, id: &NodeId, side: Side) -> EditOutcome {
        if let Some(reason) = self.unavailable(id) {
            return skipped(reason);
        }
        let heads: Vec<NodeId> = self
            .store
            .children(id)
            .iter()
            .filter(|child| self.store.node(child).is_some_and(|n| n.side == side))
            .cloned()
            .collect();
        if heads.is_empty() {
            return skipped(SkipReason::NothingToCollapse {
                node: id.clone(),
                side,
            });
        }
        let mut hidden: HashSet<NodeId> = HashSet::new();
        for head in heads {
            hidden.extend(self.store.descendants(&head));
            hidden.insert(head);
        }
        let doomed = self
            .store
            .nodes()
            .iter()
            .find(|n| n.is_deleting() && hidden.contains(&n.id));
        if let Some(doomed) = doomed {
            return skipped(SkipReason::Deleting(doomed.id.clone()));
        }

        let stored_nodes: Vec<Node> = self
            .store
            .nodes()
            .iter()
            .filter(|n| hidden.contains(&n.id))
            .map(|n| {
                let mut stored = n.clone();
                stored.flags.insert(NodeFlags::COLLAPSED);
                stored.collapsed_by = Some(id.clone());
                stored
            })
            .collect();
        let stored_edges: Vec<Edge> = self
            .store
            .edges()
            .iter()
            .filter(|e| hidden.contains(&e.source) || hidden.contains(&e.target))
            .cloned()
            .collect();
        let count = stored_nodes.len();

        self.begin();
        self.store.set_nodes(|nodes| {
            nodes.retain(|n| !hidden.contains(&n.id));
            if let Some(owner) = nodes.iter_mut().find(|n| &n.id == id) {
                owner
                    .collapsed_subtree
                    .get_or_insert_with(Default::default)
                    .stash(side, stored_nodes, stored_edges);
            }
        });
        self.store
            .set_edges(|edges| edges.retain(|e| !hidden.contains(&e.source) && !hidden.contains(&e.target)));
        self.commit();
        tracing::debug!(node = %id, %side, hidden = count, "collapsed");
        self.request_relayout(id);
        EditOutcome::Applied
    }

    /// Restore what [`collapse`](Self::collapse) stored for `side`. Other
    /// sides stay collapsed; nested collapses inside the restored records
    /// stay as they were.
    ///
    /// Restored levels are realigned with the owner, and under a branch
    /// owner so are sides, in case the owner moved while collapsed. Under a
    /// root, heads on a side its current layout mode rejects are re-sided.
    /// Restored records still flagged for deletion are scheduled again.
    pub fn expand(&mut self, id: &NodeId, side: Side) -> EditOutcome {
        if let Some(reason) = self.unavailable(id) {
            return skipped(reason);
        }
        let Some(node) = self.store.node(id) else {
            return skipped(SkipReason::MissingNode(id.clone()));
        };
        if !node.has_collapsed(side) {
            return skipped(SkipReason::NothingCollapsed {
                node: id.clone(),
                side,
            });
        }
        let owner_level = node.level;
        let owner_side = (!node.is_root() && node.side != Side::Mid).then_some(node.side);
        let root_sides = node.is_root().then(|| {
            let taken: Vec<Side> = self
                .store
                .children(id)
                .iter()
                .filter_map(|child| self.store.node(child))
                .map(|n| n.side)
                .collect();
            (self.tree_settings(id).layout_type(), taken)
        });

        self.begin();
        let mut taken: Option<CollapsedSlot> = None;
        self.store.set_nodes(|nodes| {
            let Some(owner) = nodes.iter_mut().find(|n| &n.id == id) else {
                return;
            };
            if let Some(subtree) = owner.collapsed_subtree.as_mut() {
                taken = subtree.take(side);
            }
            if owner.collapsed_subtree.as_ref().is_some_and(|s| s.is_empty()) {
                owner.collapsed_subtree = None;
            }
        });
        let CollapsedSlot {
            nodes: mut restored,
            edges: mut restored_edges,
        } = taken.unwrap_or_default();
        if reattach(&mut restored, id, owner_level, owner_side, root_sides) {
            refresh_anchors(&restored, &mut restored_edges);
        }
        let count = restored.len();
        let doomed: Vec<NodeId> = restored
            .iter()
            .filter(|n| n.is_deleting())
            .map(|n| n.id.clone())
            .collect();
        self.store.set_nodes(|nodes| nodes.extend(restored));
        self.store.set_edges(|edges| edges.extend(restored_edges));
        self.commit();
        tracing::debug!(node = %id, %side, restored = count, "expanded");
        self.request_relayout(id);
        if !doomed.is_empty() {
            tracing::warn!(count = doomed.len(), "expanded records were flagged for deletion");
            self.schedule_deletion(doomed);
        }
        EditOutcome::Applied
    }

    // -----------------------------------------------------------------------
    // Reparenting
    // -----------------------------------------------------------------------

    /// Move `source` and its subtree under `target`.
    ///
    /// Levels and sides of the moved subtree are recomputed, a root source
    /// becomes a branch, and the connecting edge is rewired (or created).
    ///
    /// # Errors
    ///
    /// [`EditError::SameNode`] or [`EditError::WouldCreateCycle`] when the
    /// move would break the forest. Nothing is changed in that case.
    pub fn move_to_child(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        side: Option<Side>,
    ) -> Result<EditOutcome, EditError> {
        if source == target {
            tracing::debug!(node = %source, "rejected move onto itself");
            return Err(EditError::SameNode(source.clone()));
        }
        for id in [source, target] {
            if let Some(reason) = self.unavailable(id) {
                return Ok(skipped(reason));
            }
        }
        let Some(src) = self.store.node(source).cloned() else {
            return Ok(skipped(SkipReason::MissingNode(source.clone())));
        };
        let Some(tgt) = self.store.node(target).cloned() else {
            return Ok(skipped(SkipReason::MissingNode(target.clone())));
        };
        if self.store.is_descendant(source, target) {
            tracing::debug!(source = %source, target = %target, "rejected cyclic move");
            return Err(EditError::WouldCreateCycle {
                source: source.clone(),
                target: target.clone(),
            });
        }

        let settings = self.tree_settings(target);
        let layout = settings.layout_type();
        let siblings: Vec<&Node> = self
            .store
            .children(target)
            .iter()
            .filter(|id| *id != source)
            .filter_map(|id| self.store.node(id))
            .collect();
        let new_side = match side {
            Some(side) => side,
            None if tgt.is_root() => next_child_side(siblings.iter().map(|n| n.side), layout),
            None if tgt.side == Side::Mid => layout.default_side(),
            None => tgt.side,
        };
        if src.parent_id.as_ref() == Some(target) && src.side == new_side {
            return Ok(skipped(SkipReason::NoChange));
        }
        let sibling_order = siblings
            .iter()
            .filter_map(|n| n.sibling_order)
            .max()
            .map_or(siblings.len() as u32, |max| max + 1);

        // Parents come before children in breadth-first order.
        let mut levels: HashMap<NodeId, u32> = HashMap::from([(source.clone(), tgt.level + 1)]);
        for id in self.store.descendants(source) {
            let parent_level = self
                .store
                .node(&id)
                .and_then(|n| n.parent_id.as_ref())
                .and_then(|p| levels.get(p))
                .copied()
                .unwrap_or(tgt.level + 1);
            levels.insert(id, parent_level + 1);
        }
        let side_changed = src.side != new_side;
        let old_root = self.store.get_root_of(source).cloned();
        let new_root = self.store.get_root_of(target).cloned();
        let restyle = old_root != new_root;
        let needs_edge = !self.store.edges().iter().any(|e| &e.target == source);
        let edge_id = if needs_edge {
            let store = &self.store;
            Some(self.ids.edge(|raw| store.id_in_use(raw)))
        } else {
            None
        };

        self.begin();
        self.store.set_nodes(|nodes| {
            for node in nodes.iter_mut() {
                let Some(&level) = levels.get(&node.id) else {
                    continue;
                };
                node.level = level;
                node.side = new_side;
                if &node.id == source {
                    node.parent_id = Some(target.clone());
                    node.sibling_order = Some(sibling_order);
                    if node.is_root() {
                        node.kind = NodeKind::Branch;
                    }
                }
            }
        });
        self.store.set_edges(|edges| {
            for edge in edges.iter_mut() {
                if !levels.contains_key(&edge.target) {
                    continue;
                }
                if &edge.target == source {
                    edge.source = target.clone();
                    edge.set_anchors(new_side);
                } else if side_changed {
                    edge.set_anchors(new_side);
                }
                if restyle {
                    edge.path_type = settings.edge_path_type();
                    edge.stroke_color = settings.edge_color().to_owned();
                }
            }
            if let Some(id) = edge_id {
                edges.push(
                    Edge::new(id, target.clone(), source.clone())
                        .styled_by(&settings)
                        .anchored(new_side),
                );
            }
        });
        self.commit();
        tracing::debug!(source = %source, target = %target, side = %new_side, "subtree moved");

        self.request_relayout(source);
        if let Some(old_root) = old_root.filter(|r| r != source && Some(r) != new_root.as_ref()) {
            self.request_relayout(&old_root);
        }
        Ok(EditOutcome::Applied)
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Flag the selected nodes, their descendants, and incident edges as
    /// deleting. Removal follows after the configured deletion delay, or
    /// immediately when that delay is zero.
    pub fn mark_for_deletion(&mut self) -> EditOutcome {
        let selected: Vec<NodeId> = self.store.selected_nodes().iter().cloned().collect();
        if selected.is_empty() {
            return skipped(SkipReason::EmptySelection);
        }
        let doomed = self.closure(&selected);
        let ordered: Vec<NodeId> = self
            .store
            .nodes()
            .iter()
            .filter(|n| doomed.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();

        self.begin();
        self.store.set_nodes(|nodes| {
            for node in nodes.iter_mut().filter(|n| doomed.contains(&n.id)) {
                node.flags.insert(NodeFlags::DELETING);
            }
        });
        self.store.set_edges(|edges| {
            for edge in edges
                .iter_mut()
                .filter(|e| doomed.contains(&e.source) || doomed.contains(&e.target))
            {
                edge.flags.insert(EdgeFlags::DELETING);
            }
        });
        self.commit();
        tracing::debug!(count = ordered.len(), "nodes marked for deletion");
        self.schedule_deletion(ordered);
        EditOutcome::Applied
    }

    /// Finalize every pending deletion now instead of waiting for its
    /// delay. Returns the removed ids.
    pub fn finalize_deletion(&mut self) -> Vec<NodeId> {
        let mut removed = Vec::new();
        for ids in self.tasks.take_deletions() {
            removed.extend(self.finalize_ids(&ids));
        }
        removed
    }

    /// Remove `ids` and their descendants at once, in one undo step.
    pub fn delete_instant(&mut self, ids: &[NodeId]) -> EditOutcome {
        let live: Vec<NodeId> = ids
            .iter()
            .filter(|id| self.store.contains(id))
            .cloned()
            .collect();
        if live.is_empty() {
            return skipped(ids.first().map_or(SkipReason::EmptySelection, |id| {
                SkipReason::MissingNode(id.clone())
            }));
        }
        let doomed = self.closure(&live);
        self.begin();
        let affected = self.remove_nodes(&doomed);
        self.commit();
        self.relayout_roots(affected);
        EditOutcome::Applied
    }

    fn schedule_deletion(&mut self, ids: Vec<NodeId>) {
        if self.config.deletion_delay.is_zero() {
            self.finalize_ids(&ids);
        } else {
            self.tasks.schedule_deletion(ids, self.config.deletion_delay);
        }
    }

    /// Hard-remove exactly `ids`. Not an undo step of its own: the mark
    /// that preceded it was.
    fn finalize_ids(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let doomed: HashSet<NodeId> = ids
            .iter()
            .filter(|id| self.store.contains(id))
            .cloned()
            .collect();
        if doomed.is_empty() {
            tracing::warn!(requested = ids.len(), "deletion finalize found no live nodes");
            return Vec::new();
        }
        let removed: Vec<NodeId> = self
            .store
            .nodes()
            .iter()
            .filter(|n| doomed.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        let affected = self.remove_nodes(&doomed);
        tracing::debug!(count = removed.len(), "deletion finalized");
        self.relayout_roots(affected);
        removed
    }

    /// Drop `doomed` and every edge touching it. Returns the roots whose
    /// trees lost nodes.
    fn remove_nodes(&mut self, doomed: &HashSet<NodeId>) -> BTreeSet<NodeId> {
        let affected: BTreeSet<NodeId> = doomed
            .iter()
            .filter_map(|id| self.store.get_root_of(id))
            .cloned()
            .collect();
        self.store.set_nodes(|nodes| nodes.retain(|n| !doomed.contains(&n.id)));
        self.store
            .set_edges(|edges| edges.retain(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target)));
        affected
    }

    /// Relayout surviving roots that have auto-layout on.
    fn relayout_roots(&mut self, roots: BTreeSet<NodeId>) {
        for root in roots {
            let auto = self
                .store
                .node(&root)
                .and_then(|n| n.kind.settings())
                .is_some_and(TreeSettings::auto_layout_enabled);
            if auto {
                self.apply_layout(&root);
            }
        }
    }

    /// `ids` plus all their live descendants.
    fn closure(&self, ids: &[NodeId]) -> HashSet<NodeId> {
        let mut out: HashSet<NodeId> = HashSet::new();
        for id in ids {
            if out.insert(id.clone()) {
                out.extend(self.store.descendants(id));
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Tree settings and content
    // -----------------------------------------------------------------------

    /// Switch a tree's layout mode: reassign sides, re-anchor edges, and
    /// animate to the new layout.
    pub fn set_layout_type(&mut self, root: &NodeId, layout: LayoutType) -> EditOutcome {
        let Some(node) = self.store.node(root).filter(|n| n.is_root()) else {
            return skipped(SkipReason::MissingNode(root.clone()));
        };
        if node
            .kind
            .settings()
            .is_some_and(|s| s.layout_type == Some(layout))
        {
            return skipped(SkipReason::NoChange);
        }

        self.begin();
        let mut changed = Vec::new();
        self.store.set_nodes(|nodes| {
            if let Some(settings) = nodes
                .iter_mut()
                .find(|n| &n.id == root)
                .and_then(|n| n.kind.settings_mut())
            {
                settings.layout_type = Some(layout);
            }
            changed = assign_sides(nodes, root, layout);
        });
        let tree = self.tree_members(root);
        self.store.set_edges(|edges| refresh_anchors(&tree, edges));
        self.commit();
        tracing::debug!(root = %root, layout = ?layout, resided = changed.len(), "layout type changed");
        self.apply_layout(root);
        EditOutcome::Applied
    }

    /// Turn automatic relayout on or off for a tree. Turning it on lays the
    /// tree out right away.
    pub fn set_auto_layout(&mut self, root: &NodeId, enabled: bool) -> EditOutcome {
        let Some(node) = self.store.node(root).filter(|n| n.is_root()) else {
            return skipped(SkipReason::MissingNode(root.clone()));
        };
        if node
            .kind
            .settings()
            .is_some_and(|s| s.auto_layout_enabled() == enabled)
        {
            return skipped(SkipReason::NoChange);
        }
        self.update_settings(root, |settings| settings.auto_layout = Some(enabled));
        if enabled {
            self.apply_layout(root);
        }
        EditOutcome::Applied
    }

    /// Switch spacing presets and relayout every auto-layout tree.
    pub fn set_spacing_profile(&mut self, profile: SpacingProfile) {
        if self.config.spacing_profile == profile {
            return;
        }
        self.config = self.config.clone().with_spacing_profile(profile);
        let roots: BTreeSet<NodeId> = self.store.roots().map(|n| n.id.clone()).collect();
        tracing::debug!(%profile, "spacing profile changed");
        self.relayout_roots(roots);
    }

    /// Replace a node's content.
    pub fn update_node_content(&mut self, id: &NodeId, content: impl Into<String>) -> EditOutcome {
        self.overwrite_content([(id.clone(), content.into())])
    }

    /// Replace the content of several nodes in one undo step. Unknown ids
    /// are skipped and logged.
    pub fn overwrite_content(
        &mut self,
        updates: impl IntoIterator<Item = (NodeId, String)>,
    ) -> EditOutcome {
        let mut missing = None;
        let mut changes: HashMap<NodeId, String> = HashMap::new();
        for (id, content) in updates {
            match self.store.node(&id) {
                None => {
                    log_skip(&SkipReason::MissingNode(id.clone()));
                    missing.get_or_insert(id);
                }
                Some(node) if node.content == content => {}
                Some(_) => {
                    changes.insert(id, content);
                }
            }
        }
        if changes.is_empty() {
            let reason = missing.map_or(SkipReason::NoChange, SkipReason::MissingNode);
            return EditOutcome::Skipped(reason);
        }

        let touched: Vec<NodeId> = changes.keys().cloned().collect();
        self.begin();
        self.store.set_nodes(|nodes| {
            for node in nodes.iter_mut() {
                if let Some(content) = changes.remove(&node.id) {
                    node.content = content;
                }
            }
        });
        self.commit();
        for id in &touched {
            self.request_relayout(id);
        }
        EditOutcome::Applied
    }

    /// Set a tree's edge path type and restyle every edge in it.
    pub fn set_subtree_edge_path_type(&mut self, root: &NodeId, path: PathType) -> EditOutcome {
        self.restyle_tree(
            root,
            |settings| settings.edge_path_type = Some(path),
            |edge| edge.path_type = path,
        )
    }

    /// Set a tree's edge colour and restyle every edge in it.
    pub fn set_subtree_edge_color(&mut self, root: &NodeId, color: &str) -> EditOutcome {
        self.restyle_tree(
            root,
            |settings| settings.edge_color = Some(color.to_owned()),
            |edge| edge.stroke_color = color.to_owned(),
        )
    }

    fn restyle_tree(
        &mut self,
        root: &NodeId,
        settings_fn: impl FnOnce(&mut TreeSettings),
        edge_fn: impl Fn(&mut Edge),
    ) -> EditOutcome {
        if !self.store.node(root).is_some_and(Node::is_root) {
            return skipped(SkipReason::MissingNode(root.clone()));
        }
        let members: HashSet<NodeId> = self.store.descendants(root).into_iter().collect();
        self.begin();
        self.store.set_nodes(|nodes| {
            if let Some(settings) = nodes
                .iter_mut()
                .find(|n| &n.id == root)
                .and_then(|n| n.kind.settings_mut())
            {
                settings_fn(settings);
            }
        });
        self.store.set_edges(|edges| {
            for edge in edges.iter_mut().filter(|e| members.contains(&e.target)) {
                edge_fn(edge);
            }
        });
        self.commit();
        EditOutcome::Applied
    }

    fn update_settings(&mut self, root: &NodeId, update: impl FnOnce(&mut TreeSettings)) {
        self.begin();
        self.store.set_nodes(|nodes| {
            if let Some(settings) = nodes
                .iter_mut()
                .find(|n| &n.id == root)
                .and_then(|n| n.kind.settings_mut())
            {
                update(settings);
            }
        });
        self.commit();
    }

    // -----------------------------------------------------------------------
    // Layout and renderer feedback
    // -----------------------------------------------------------------------

    /// Resolve sibling order from current positions, lay the tree out, and
    /// animate toward the result. Not an undo step.
    pub fn apply_layout(&mut self, root: &NodeId) -> EditOutcome {
        let Some(root_node) = self.store.node(root).filter(|n| n.is_root()).cloned() else {
            return skipped(SkipReason::MissingNode(root.clone()));
        };
        let members: Vec<Node> = self
            .store
            .descendants(root)
            .iter()
            .filter_map(|id| self.store.node(id))
            .cloned()
            .collect();
        let member_ids: HashSet<&NodeId> = members.iter().map(|n| &n.id).collect();
        let tree_edges: Vec<Edge> = self
            .store
            .edges()
            .iter()
            .filter(|e| member_ids.contains(&e.target))
            .cloned()
            .collect();

        let result = layout_tree(&root_node, &members, &tree_edges, &self.config.layout);
        let orders: HashMap<NodeId, Option<u32>> = result
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.sibling_order))
            .collect();
        let targets: Vec<(NodeId, Point)> = result
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect();

        self.store.set_nodes(|nodes| {
            for node in nodes.iter_mut() {
                if let Some(order) = orders.get(&node.id) {
                    node.sibling_order = *order;
                }
            }
        });
        self.store
            .set_edges(|edges| refresh_anchors(&result.nodes, edges));
        tracing::trace!(root = %root, nodes = targets.len(), "layout computed");
        self.animate_to(targets);
        EditOutcome::Applied
    }

    /// Move nodes toward `targets`. Nodes still travelling from an earlier
    /// transition keep their destinations.
    fn animate_to(&mut self, targets: Vec<(NodeId, Point)>) {
        if self.config.animation_duration.is_zero() {
            let targets: HashMap<NodeId, Point> = targets.into_iter().collect();
            self.store.set_nodes(|nodes| {
                for node in nodes.iter_mut() {
                    if let Some(&position) = targets.get(&node.id) {
                        node.position = position;
                    }
                }
            });
            return;
        }
        let mut merged: HashMap<NodeId, Point> = self
            .animator
            .targets()
            .map(|(id, target)| (id.clone(), target))
            .collect();
        merged.extend(targets);
        self.animator.start(&self.store, merged);
    }

    /// Record a size reported by the renderer. A changed size requests a
    /// relayout when the tree has auto-layout on.
    pub fn report_measured(&mut self, id: &NodeId, size: Size) -> EditOutcome {
        let Some(node) = self.store.node(id) else {
            return skipped(SkipReason::MissingNode(id.clone()));
        };
        if node.measured == Some(size) {
            return EditOutcome::Skipped(SkipReason::NoChange);
        }
        self.store.set_nodes(|nodes| {
            if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                node.measured = Some(size);
            }
        });
        self.request_relayout(id);
        EditOutcome::Applied
    }

    /// Advance animation and deferred work by one frame.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let mut report = TickReport {
            animation: self.animator.tick(dt, &mut self.store),
            ..TickReport::default()
        };
        for task in self.tasks.tick(dt) {
            match task {
                DueTask::Relayout { root } => {
                    if self.store.node(&root).is_some_and(Node::is_root) {
                        self.apply_layout(&root);
                        report.relayouts.push(root);
                    }
                }
                DueTask::FinalizeDeletion { ids } => {
                    report.deleted.extend(self.finalize_ids(&ids));
                }
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Step back one edit. Returns whether anything was restored.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let Some(previous) = self.history.undo(self.store.snapshot()) else {
            return false;
        };
        self.restore(previous);
        tracing::debug!(undo = self.history.undo_depth(), redo = self.history.redo_depth(), "undo");
        true
    }

    /// Re-apply the last undone edit. Returns whether anything was restored.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let Some(next) = self.history.redo(self.store.snapshot()) else {
            return false;
        };
        self.restore(next);
        tracing::debug!(undo = self.history.undo_depth(), redo = self.history.redo_depth(), "redo");
        true
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        if let Some(token) = self.animator.stop() {
            tracing::trace!(generation = token.generation(), "transition stopped by history");
        }
        let dropped = self.tasks.cancel_all();
        if dropped > 0 {
            tracing::trace!(dropped, "deferred tasks dropped by history");
        }
        self.store.restore(snapshot);

        let deleting: Vec<NodeId> = self
            .store
            .nodes()
            .iter()
            .filter(|n| n.is_deleting())
            .map(|n| n.id.clone())
            .collect();
        if !deleting.is_empty() {
            self.schedule_deletion(deleting);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Why `id` cannot be edited structurally: it is gone, or flagged for
    /// deletion and waiting for the finalize.
    fn unavailable(&self, id: &NodeId) -> Option<SkipReason> {
        match self.store.node(id) {
            None => Some(SkipReason::MissingNode(id.clone())),
            Some(node) if node.is_deleting() => Some(SkipReason::Deleting(id.clone())),
            Some(_) => None,
        }
    }

    fn begin(&mut self) {
        self.history.prepare(self.store.snapshot());
    }

    fn commit(&mut self) {
        self.history.commit();
    }

    fn next_node_id(&mut self) -> NodeId {
        let store = &self.store;
        self.ids.node(|raw| store.id_in_use(raw))
    }

    /// Settings of the tree containing `id`, or defaults for orphans.
    fn tree_settings(&self, id: &NodeId) -> TreeSettings {
        self.store
            .get_root_of(id)
            .and_then(|root| self.store.node(root))
            .and_then(|root| root.kind.settings())
            .cloned()
            .unwrap_or_default()
    }

    /// Root plus live descendants, cloned.
    fn tree_members(&self, root: &NodeId) -> Vec<Node> {
        std::iter::once(root.clone())
            .chain(self.store.descendants(root))
            .filter_map(|id| self.store.node(&id).cloned())
            .collect()
    }

    /// Queue a relayout of the tree containing `id` if it has auto-layout
    /// on.
    fn request_relayout(&mut self, id: &NodeId) {
        let Some(root) = self.store.get_root_of(id) else {
            return;
        };
        let auto = self
            .store
            .node(root)
            .and_then(|n| n.kind.settings())
            .is_some_and(TreeSettings::auto_layout_enabled);
        if auto {
            let root = root.clone();
            self.tasks
                .schedule_relayout(root, self.config.relayout_delay);
        }
    }
}

/// Clear collapse state on restored records and realign their levels with
/// the owner. Sides follow `owner_side` under a branch owner. Under a root
/// owner, `root_sides` holds the tree's layout mode and the sides already
/// taken by live children; heads on a side the mode rejects are given a new
/// one and their subtrees follow. Returns whether any side changed.
fn reattach(
    restored: &mut [Node],
    owner: &NodeId,
    owner_level: u32,
    owner_side: Option<Side>,
    mut root_sides: Option<(LayoutType, Vec<Side>)>,
) -> bool {
    // Each placed id maps to its level and the side its subtree is forced to.
    let mut placed: HashMap<NodeId, (u32, Option<Side>)> =
        HashMap::from([(owner.clone(), (owner_level, owner_side))]);
    let mut resided = false;
    let mut pending: Vec<usize> = (0..restored.len()).collect();
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|&slot| {
            let node = &mut restored[slot];
            let parent = node.parent_id.as_ref().and_then(|p| placed.get(p)).copied();
            let Some((parent_level, parent_side)) = parent else {
                return true;
            };
            let forced = match (parent_side, root_sides.as_mut()) {
                (Some(side), _) => Some(side),
                (None, Some((layout, taken))) if node.parent_id.as_ref() == Some(owner) => {
                    let side = if layout.is_valid_side(node.side) {
                        None
                    } else {
                        Some(next_child_side(taken.iter().copied(), *layout))
                    };
                    taken.push(side.unwrap_or(node.side));
                    side
                }
                (None, _) => None,
            };
            node.level = parent_level + 1;
            if let Some(side) = forced {
                if node.side != side {
                    node.side = side;
                    resided = true;
                }
            }
            placed.insert(node.id.clone(), (node.level, forced));
            false
        });
        if pending.len() == before {
            break;
        }
    }

    for node in restored.iter_mut() {
        node.flags.remove(NodeFlags::COLLAPSED);
        node.collapsed_by = None;
    }
    resided
}

fn log_skip(reason: &SkipReason) {
    match reason {
        SkipReason::MissingNode(id) => {
            tracing::warn!(node = %id, "edit references a node that is not live");
        }
        SkipReason::Deleting(id) => {
            tracing::warn!(node = %id, "edit references a node that is being deleted");
        }
        other => tracing::debug!(reason = %other, "edit skipped"),
    }
}

fn skipped(reason: SkipReason) -> EditOutcome {
    log_skip(&reason);
    EditOutcome::Skipped(reason)
}
