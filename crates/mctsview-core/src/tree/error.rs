use thiserror::Error;

use crate::tree::ids::{EngineNodeId, NodeId, NodeKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Error type for tree cache ingest, lookup, and mutation.
pub enum TreeError {
    /// A node arrived without a required field; the branch cannot be rendered.
    #[error("malformed snapshot node {engine_id}: missing {field}")]
    MalformedSnapshot {
        engine_id: EngineNodeId,
        field: &'static str,
    },

    /// A subtree response was rooted at a node other than the one requested.
    #[error("subtree request for node {requested} returned node {received}")]
    MismatchedSubtree {
        requested: EngineNodeId,
        received: EngineNodeId,
    },

    /// Two materialized nodes resolved to the same path-qualified key.
    #[error("duplicate node key '{key}'")]
    DuplicateKey { key: NodeKey },

    #[error("missing node with id {}", node_id.index())]
    MissingNode { node_id: NodeId },

    #[error("no node with key '{key}'")]
    UnknownKey { key: NodeKey },

    /// An operation needed a tree but none is loaded.
    #[error("no tree loaded")]
    NoTree,
}

/// A subtree fetch that failed on the network or engine side.
/// The node goes back to unfetched and the message is shown transiently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchFailure {
    pub message: String,
}

impl FetchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        FetchFailure {
            message: message.into(),
        }
    }
}

impl From<TreeError> for FetchFailure {
    fn from(err: TreeError) -> Self {
        FetchFailure::new(err.to_string())
    }
}
