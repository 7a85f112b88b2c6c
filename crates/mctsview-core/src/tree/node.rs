use crate::tree::ids::{Action, EngineNodeId, NodeId, NodeKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where a node is in its expand/collapse lifecycle
pub enum ExpansionState {
    /// Children were never fetched.
    Unfetched,
    /// A subtree fetch is in flight.
    Loading,
    /// Children are cached but hidden.
    Collapsed,
    /// Children are visible.
    Expanded,
}

/// Child storage tagged with its expansion state, so a node can never hold
/// visible and cached children at the same time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Branch {
    Unfetched,
    Loading { generation: u64 },
    Collapsed(Vec<NodeId>),
    Expanded(Vec<NodeId>),
}

impl Branch {
    pub(crate) fn state(&self) -> ExpansionState {
        match self {
            Branch::Unfetched => ExpansionState::Unfetched,
            Branch::Loading { .. } => ExpansionState::Loading,
            Branch::Collapsed(_) => ExpansionState::Collapsed,
            Branch::Expanded(_) => ExpansionState::Expanded,
        }
    }
}

#[derive(Debug, Clone)]
/// A materialized search-tree node held by the cache.
pub struct TreeNode {
    key: NodeKey,
    engine_id: EngineNodeId,
    action: Option<Action>,
    visits: u64,
    value: f64,
    exploration: Option<f64>,
    prior: Option<f64>,
    is_best_path: bool,
    depth: usize,
    parent: Option<NodeId>,
    pub(crate) branch: Branch,
}

/// Sanitized fields of a wire node, ready to be placed in the arena.
pub(crate) struct NodeFields {
    pub(crate) engine_id: EngineNodeId,
    pub(crate) action: Option<Action>,
    pub(crate) visits: u64,
    pub(crate) value: f64,
    pub(crate) exploration: Option<f64>,
    pub(crate) prior: Option<f64>,
    pub(crate) is_best_path: bool,
}

impl TreeNode {
    pub(crate) fn new(
        key: NodeKey,
        fields: NodeFields,
        depth: usize,
        parent: Option<NodeId>,
    ) -> Self {
        TreeNode {
            key,
            engine_id: fields.engine_id,
            action: fields.action,
            visits: fields.visits,
            value: fields.value,
            exploration: fields.exploration,
            prior: fields.prior,
            is_best_path: fields.is_best_path,
            depth,
            parent,
            branch: Branch::Unfetched,
        }
    }

    /// Path-qualified id, unique over the materialized tree
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Raw engine id, used as the subtree fetch key
    pub fn engine_id(&self) -> EngineNodeId {
        self.engine_id
    }

    /// Move that leads to this node; `None` only at the root
    pub fn action(&self) -> Option<Action> {
        self.action
    }

    /// Visit count `N` from the engine
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Value estimate `V`, sanitized to a finite number
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Exploration term `U`, when the engine reports one
    pub fn exploration(&self) -> Option<f64> {
        self.exploration
    }

    /// Prior probability reported by the engine, if any
    pub fn prior(&self) -> Option<f64> {
        self.prior
    }

    /// Whether the engine flagged this node on its principal variation
    pub fn is_best_path(&self) -> bool {
        self.is_best_path
    }

    /// Distance from the cache root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Parent slot; `None` only at the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Current lifecycle state of this node's children
    pub fn expansion_state(&self) -> ExpansionState {
        self.branch.state()
    }

    /// Whether the children are currently visible
    pub fn is_expanded(&self) -> bool {
        matches!(self.branch, Branch::Expanded(_))
    }

    /// Children currently visible; empty unless expanded
    pub fn children(&self) -> &[NodeId] {
        match &self.branch {
            Branch::Expanded(children) => children,
            _ => &[],
        }
    }

    /// Children fetched earlier and hidden by a collapse; empty unless collapsed
    pub fn collapsed_children(&self) -> &[NodeId] {
        match &self.branch {
            Branch::Collapsed(children) => children,
            _ => &[],
        }
    }

    /// Every fetched child, visible or not
    pub fn materialized_children(&self) -> &[NodeId] {
        match &self.branch {
            Branch::Expanded(children) | Branch::Collapsed(children) => children,
            Branch::Unfetched | Branch::Loading { .. } => &[],
        }
    }

    /// Display label used by the presentation layer.
    pub fn label(&self) -> String {
        match self.action {
            Some(action) => action.to_string(),
            None => "Root".to_string(),
        }
    }
}
