use std::{collections::HashMap, slice::Iter};

use crate::tree::{
    error::TreeError,
    ids::{NodeId, NodeKey},
    node::TreeNode,
};

/// Flat node storage plus a key index.
/// Slots are never freed: collapsed nodes stay cached until the whole
/// arena is dropped with its tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    storage: Vec<TreeNode>,
    by_key: HashMap<NodeKey, NodeId>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Place a node and return its id; rejects a key that is already taken.
    pub(crate) fn allocate(&mut self, node: TreeNode) -> Result<NodeId, TreeError> {
        if self.by_key.contains_key(node.key()) {
            return Err(TreeError::DuplicateKey {
                key: node.key().clone(),
            });
        }
        let id = NodeId::from(self.storage.len());
        self.by_key.insert(node.key().clone(), id);
        self.storage.push(node);
        Ok(id)
    }

    pub(crate) fn get(&self, node_id: NodeId) -> Option<&TreeNode> {
        self.storage.get(node_id.index())
    }

    pub(crate) fn get_mut(&mut self, node_id: NodeId) -> Option<&mut TreeNode> {
        self.storage.get_mut(node_id.index())
    }

    pub(crate) fn find(&self, key: &NodeKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn iter(&self) -> Iter<'_, TreeNode> {
        self.storage.iter()
    }
}
