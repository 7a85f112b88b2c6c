use std::fmt;

use serde::{Deserialize, Serialize};

/// A wrapper for an integer index used to address nodes in the cache arena.
/// Only meaningful for the cache that handed it out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the value of the arena slot without exposing the field
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Identifier the engine assigned to a node.
/// Not unique across separately fetched subtrees, use [`NodeKey`] for that.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineNodeId(u64);

impl EngineNodeId {
    /// Return the raw engine value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EngineNodeId {
    fn from(value: u64) -> Self {
        EngineNodeId(value)
    }
}

impl fmt::Display for EngineNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path-qualified node identity: the root's engine id followed by the engine
/// id of every node on the way down, joined with `/`.
///
/// Keys stay stable across incremental fetches of the same logical node, and
/// two subtrees can never produce the same key because their paths differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Key for a tree root.
    pub fn root(engine_id: EngineNodeId) -> Self {
        NodeKey(engine_id.to_string())
    }

    /// Key for a child reached from `self`.
    pub fn child(&self, engine_id: EngineNodeId) -> Self {
        NodeKey(format!("{}/{}", self.0, engine_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of edges between the root and this key.
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        NodeKey(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        NodeKey(value)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Board coordinate of the move a node represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Action {
    pub row: i32,
    pub col: i32,
}

impl Action {
    pub fn new(row: i32, col: i32) -> Self {
        Action { row, col }
    }
}

impl From<[i32; 2]> for Action {
    fn from([row, col]: [i32; 2]) -> Self {
        Action { row, col }
    }
}

impl From<Action> for [i32; 2] {
    fn from(action: Action) -> Self {
        [action.row, action.col]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
