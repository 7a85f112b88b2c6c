use serde::{Deserialize, Serialize};

use crate::tree::ids::{Action, EngineNodeId};

/// One node of a tree snapshot or subtree fragment as the engine reports it.
///
/// `N` and `V` are optional on the wire so that a node missing either can be
/// recognised and dropped at ingest instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: EngineNodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(rename = "N", default, skip_serializing_if = "Option::is_none")]
    pub visits: Option<u64>,
    #[serde(rename = "V", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(rename = "U", default, skip_serializing_if = "Option::is_none")]
    pub exploration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
    #[serde(default)]
    pub is_best_path: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<WireNode>>,
}

impl WireNode {
    /// A well-formed node with no children.
    pub fn leaf(id: u64, visits: u64, value: f64) -> Self {
        WireNode {
            id: EngineNodeId::from(id),
            action: None,
            visits: Some(visits),
            value: Some(value),
            exploration: None,
            prob: None,
            is_best_path: false,
            children: None,
        }
    }

    pub fn with_action(mut self, row: i32, col: i32) -> Self {
        self.action = Some(Action::new(row, col));
        self
    }

    pub fn with_prob(mut self, prob: f64) -> Self {
        self.prob = Some(prob);
        self
    }

    pub fn with_best_path(mut self, is_best_path: bool) -> Self {
        self.is_best_path = is_best_path;
        self
    }

    pub fn with_children(mut self, children: Vec<WireNode>) -> Self {
        self.children = Some(children);
        self
    }

    /// Number of nodes in this fragment, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(WireNode::node_count)
            .sum::<usize>()
    }
}

/// Aggregate summary the engine computes over its full search tree.
///
/// Independent of the client's own scan over the partial cache; the two are
/// never merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub total_nodes: u64,
    #[serde(rename = "average_N")]
    pub average_visits: f64,
    #[serde(rename = "average_V")]
    pub average_value: f64,
    #[serde(rename = "max_N", default, skip_serializing_if = "Option::is_none")]
    pub max_visits: Option<u64>,
    #[serde(rename = "max_abs_V", default, skip_serializing_if = "Option::is_none")]
    pub max_abs_value: Option<f64>,
}
