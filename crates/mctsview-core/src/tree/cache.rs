use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::tree::{
    arena::NodeArena,
    error::{FetchFailure, TreeError},
    ids::{Action, EngineNodeId, NodeId, NodeKey},
    node::{Branch, NodeFields, TreeNode},
    snapshot::WireNode,
};

/// Default depth budget for subtree fetches, relative to the fetched node.
pub const DEFAULT_FETCH_DEPTH: usize = 2;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// What a toggle did to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// Cached or known-empty children became visible; no fetch needed.
    Expanded,
    /// Visible children moved into the collapsed cache.
    Collapsed,
    /// The node is now loading; the caller must issue this fetch and hand
    /// the outcome back to [`TreeCache::resolve`].
    Fetch(FetchTicket),
    /// A pending fetch was abandoned; its response will be discarded.
    Cancelled,
}

/// Everything needed to issue one subtree fetch and route its response back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub epoch: u64,
    pub node: NodeId,
    pub key: NodeKey,
    pub engine_id: EngineNodeId,
    pub generation: u64,
    /// Depth budget to request, relative to the fetched node.
    pub max_depth: usize,
}

/// Result of applying a fetch outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The node is expanded with `added` new children nodes (all depths);
    /// `dropped` malformed nodes were left out.
    Applied { added: usize, dropped: usize },
    /// The fetch failed; the node is unfetched again.
    Failed(FetchFailure),
    /// Nobody was waiting for this response any more.
    Stale,
}

/// Counts from one ingest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
/// Locally held copy of the engine's search tree.
/// Owns the arena (root is always at index 0); toggling is the only
/// mutation after ingest.
pub struct TreeCache {
    arena: NodeArena,
    epoch: u64,
    revision: u64,
    next_generation: u64,
    fetch_depth: usize,
}

impl TreeCache {
    /// Build a cache from a snapshot that was requested with `max_depth`.
    ///
    /// Nodes missing `N` or `V` are dropped with their descendants; a
    /// malformed root rejects the snapshot.
    pub fn from_snapshot(
        root: WireNode,
        max_depth: usize,
    ) -> Result<(Self, IngestReport), TreeError> {
        let mut cache = TreeCache {
            arena: NodeArena::new(),
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
            revision: 0,
            next_generation: 1,
            fetch_depth: DEFAULT_FETCH_DEPTH,
        };
        let fields = node_fields(&root)?;
        let mut report = IngestReport::default();
        let key = NodeKey::root(root.id);
        let root_id = cache
            .arena
            .allocate(TreeNode::new(key.clone(), fields, 0, None))?;
        report.added += 1;
        let branch = cache.ingest_children(root_id, &key, 0, root.children, 0, max_depth, &mut report);
        cache.node_mut(root_id)?.branch = branch;
        Ok((cache, report))
    }

    /// Set the depth budget requested by future subtree fetches.
    pub fn with_fetch_depth(mut self, depth: usize) -> Self {
        self.fetch_depth = depth.max(1);
        self
    }

    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    pub fn root(&self) -> &TreeNode {
        // The root is allocated before a cache is ever handed out.
        &self.arena.iter().as_slice()[0]
    }

    /// Identity of this cache; tickets from other caches never apply here.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of materialized nodes, visible or collapsed.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn node(&self, node_id: NodeId) -> Result<&TreeNode, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut TreeNode, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    pub fn find(&self, key: &NodeKey) -> Option<NodeId> {
        self.arena.find(key)
    }

    /// Every materialized node in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::from(index), node))
    }

    /// Ids from the root down to `node_id`, both inclusive.
    pub fn path_to(&self, node_id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = vec![node_id];
        let mut current = self.node(node_id)?;
        while let Some(parent) = current.parent() {
            path.push(parent);
            current = self.node(parent)?;
        }
        path.reverse();
        Ok(path)
    }

    /// Visible nodes in pre-order, following expanded children only.
    pub fn visible(&self) -> Vec<NodeId> {
        self.preorder(|node| node.children())
    }

    /// Every materialized node in pre-order, through expanded and collapsed
    /// children alike.
    pub fn materialized(&self) -> Vec<NodeId> {
        self.preorder(|node| node.materialized_children())
    }

    fn preorder<'a, F>(&'a self, children: F) -> Vec<NodeId>
    where
        F: Fn(&'a TreeNode) -> &'a [NodeId],
    {
        let mut order = Vec::new();
        let mut stack = vec![self.root_id()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(children(node).iter().rev().copied());
        }
        order
    }

    /// First node in pre-order whose action matches.
    pub fn find_by_action(&self, action: Action) -> Option<NodeId> {
        self.materialized().into_iter().find(|id| {
            self.arena
                .get(*id)
                .is_some_and(|node| node.action() == Some(action))
        })
    }

    /// Chain of best-path flagged nodes starting at the root.
    pub fn best_path(&self) -> Vec<NodeId> {
        let mut path = vec![self.root_id()];
        let mut current = self.root();
        while let Some(next) = current
            .materialized_children()
            .iter()
            .copied()
            .find(|id| self.arena.get(*id).is_some_and(TreeNode::is_best_path))
        {
            path.push(next);
            match self.arena.get(next) {
                Some(node) => current = node,
                None => break,
            }
        }
        path
    }

    /// Flip a node between its states.
    ///
    /// Expanded and collapsed nodes swap without network access. An
    /// unfetched node starts loading and hands back a ticket. Toggling a
    /// loading node abandons the fetch.
    pub fn toggle(&mut self, node_id: NodeId) -> Result<Toggle, TreeError> {
        let generation = self.next_generation;
        let fetch_depth = self.fetch_depth;
        let epoch = self.epoch;
        let node = self.node_mut(node_id)?;
        let branch = std::mem::replace(&mut node.branch, Branch::Unfetched);
        let (branch, outcome) = match branch {
            Branch::Expanded(children) => (Branch::Collapsed(children), Toggle::Collapsed),
            Branch::Collapsed(children) => (Branch::Expanded(children), Toggle::Expanded),
            Branch::Unfetched => (
                Branch::Loading { generation },
                Toggle::Fetch(FetchTicket {
                    epoch,
                    node: node_id,
                    key: node.key().clone(),
                    engine_id: node.engine_id(),
                    generation,
                    max_depth: fetch_depth,
                }),
            ),
            Branch::Loading { .. } => (Branch::Unfetched, Toggle::Cancelled),
        };
        node.branch = branch;
        debug!(key = %node.key(), state = ?node.expansion_state(), "toggled node");
        if matches!(outcome, Toggle::Fetch(_)) {
            self.next_generation += 1;
        }
        self.revision += 1;
        Ok(outcome)
    }

    /// Apply the outcome of a fetch issued for `ticket`.
    ///
    /// The response is only applied while the node is still loading for
    /// that very ticket; anything else is stale and discarded.
    pub fn resolve(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Option<WireNode>, FetchFailure>,
    ) -> Resolution {
        if !self.awaits(ticket) {
            debug!(key = %ticket.key, generation = ticket.generation, "discarding stale subtree response");
            return Resolution::Stale;
        }

        let fragment = match outcome {
            Ok(fragment) => fragment,
            Err(failure) => return self.fail(ticket, failure),
        };

        let mut report = IngestReport::default();
        let branch = match fragment {
            None => Branch::Expanded(Vec::new()),
            Some(fragment) if fragment.id != ticket.engine_id => {
                let err = TreeError::MismatchedSubtree {
                    requested: ticket.engine_id,
                    received: fragment.id,
                };
                return self.fail(ticket, err.into());
            }
            Some(fragment) => {
                let depth = match self.node(ticket.node) {
                    Ok(node) => node.depth(),
                    Err(err) => return self.fail(ticket, err.into()),
                };
                let branch = self.ingest_children(
                    ticket.node,
                    &ticket.key,
                    depth,
                    fragment.children,
                    0,
                    ticket.max_depth,
                    &mut report,
                );
                // A successful fetch always leaves the node expanded, even
                // when the engine had nothing below it.
                match branch {
                    Branch::Expanded(children) | Branch::Collapsed(children) => {
                        Branch::Expanded(children)
                    }
                    Branch::Unfetched | Branch::Loading { .. } => Branch::Expanded(Vec::new()),
                }
            }
        };

        match self.node_mut(ticket.node) {
            Ok(node) => node.branch = branch,
            Err(err) => return Resolution::Failed(err.into()),
        }
        self.revision += 1;
        debug!(key = %ticket.key, added = report.added, dropped = report.dropped, "expanded fetched node");
        Resolution::Applied {
            added: report.added,
            dropped: report.dropped,
        }
    }

    /// Whether `ticket` is the one this cache is waiting on for its node.
    pub fn awaits(&self, ticket: &FetchTicket) -> bool {
        ticket.epoch == self.epoch
            && self.arena.get(ticket.node).is_some_and(|node| {
                matches!(node.branch, Branch::Loading { generation } if generation == ticket.generation)
            })
    }

    fn fail(&mut self, ticket: &FetchTicket, failure: FetchFailure) -> Resolution {
        warn!(key = %ticket.key, error = %failure, "subtree fetch failed");
        if let Some(node) = self.arena.get_mut(ticket.node) {
            node.branch = Branch::Unfetched;
            self.revision += 1;
        }
        Resolution::Failed(failure)
    }

    /// Ingest `children` under `parent` and return the branch the parent
    /// should take. `rel_depth` is the parent's depth relative to the
    /// fetch root, `budget` the depth the request asked for.
    #[allow(clippy::too_many_arguments)]
    fn ingest_children(
        &mut self,
        parent: NodeId,
        parent_key: &NodeKey,
        parent_depth: usize,
        children: Option<Vec<WireNode>>,
        rel_depth: usize,
        budget: usize,
        report: &mut IngestReport,
    ) -> Branch {
        let children = children.unwrap_or_default();
        if children.is_empty() {
            // Within budget the engine would have listed children, so the
            // node is a known leaf; at the frontier it is simply unexplored.
            return if rel_depth < budget {
                Branch::Collapsed(Vec::new())
            } else {
                Branch::Unfetched
            };
        }

        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            if let Some(id) =
                self.ingest_node(child, parent, parent_key, parent_depth + 1, rel_depth + 1, budget, report)
            {
                ids.push(id);
            }
        }
        Branch::Expanded(ids)
    }

    #[allow(clippy::too_many_arguments)]
    fn ingest_node(
        &mut self,
        wire: WireNode,
        parent: NodeId,
        parent_key: &NodeKey,
        depth: usize,
        rel_depth: usize,
        budget: usize,
        report: &mut IngestReport,
    ) -> Option<NodeId> {
        let fields = match node_fields(&wire) {
            Ok(fields) => fields,
            Err(err) => {
                let dropped = wire.node_count();
                warn!(parent = %parent_key, error = %err, dropped, "dropping malformed branch");
                report.dropped += dropped;
                return None;
            }
        };

        let key = parent_key.child(wire.id);
        let id = match self
            .arena
            .allocate(TreeNode::new(key.clone(), fields, depth, Some(parent)))
        {
            Ok(id) => id,
            Err(err) => {
                let dropped = wire.node_count();
                warn!(error = %err, dropped, "dropping branch with colliding key");
                report.dropped += dropped;
                return None;
            }
        };
        report.added += 1;

        let branch = self.ingest_children(id, &key, depth, wire.children, rel_depth, budget, report);
        if let Some(node) = self.arena.get_mut(id) {
            node.branch = branch;
        }
        Some(id)
    }
}

/// Validate and sanitize the scalar fields of a wire node.
fn node_fields(wire: &WireNode) -> Result<NodeFields, TreeError> {
    let visits = wire.visits.ok_or(TreeError::MalformedSnapshot {
        engine_id: wire.id,
        field: "N",
    })?;
    let value = wire.value.ok_or(TreeError::MalformedSnapshot {
        engine_id: wire.id,
        field: "V",
    })?;
    Ok(NodeFields {
        engine_id: wire.id,
        action: wire.action,
        visits,
        value: if value.is_finite() { value } else { 0.0 },
        exploration: wire.exploration.filter(|u| u.is_finite()),
        prior: wire.prob.filter(|p| p.is_finite()),
        is_best_path: wire.is_best_path,
    })
}
