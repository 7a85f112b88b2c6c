//! Plain-text views of the explorer state.

use std::fmt::Write;

use mctsview_core::{EngineSummary, ExpansionState, Explorer, NodeDetails, NodeKey, TreeStats};

/// One printed row of the visible tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub key: NodeKey,
    pub text: String,
}

fn marker(state: ExpansionState, has_children: bool) -> char {
    match state {
        ExpansionState::Expanded if has_children => '-',
        ExpansionState::Expanded => '.',
        ExpansionState::Collapsed if has_children => '+',
        ExpansionState::Collapsed => '.',
        ExpansionState::Unfetched => '+',
        ExpansionState::Loading => '~',
    }
}

/// Visible nodes in pre-order, indented by depth.
pub fn tree_rows(explorer: &Explorer) -> Vec<TreeRow> {
    let Some(tree) = explorer.tree() else {
        return Vec::new();
    };
    let scales = explorer.scales();
    let selected = explorer.selected();
    tree.visible()
        .into_iter()
        .filter_map(|id| tree.node(id).ok())
        .enumerate()
        .map(|(row, node)| {
            let has_children = !node.materialized_children().is_empty();
            let mut text = format!(
                "#{row:<3} {indent}{mark} {label:<8} N={n:<6} V={v:+.3}  r={r:.1} {color}",
                indent = "  ".repeat(node.depth()),
                mark = marker(node.expansion_state(), has_children),
                label = node.label(),
                n = node.visits(),
                v = node.value(),
                r = scales.size_of(node.visits()),
                color = scales.color_of(node.value()),
            );
            if node.is_best_path() {
                text.push_str("  *");
            }
            if selected == Some(node.key()) {
                text.push_str("  <");
            }
            TreeRow {
                key: node.key().clone(),
                text,
            }
        })
        .collect()
}

pub fn details(details: &NodeDetails) -> String {
    let mut out = String::new();
    let optional = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
    let _ = writeln!(out, "node      {}", details.key);
    let _ = writeln!(out, "action    {}", details.label);
    let _ = writeln!(out, "visits    {}", details.visits);
    let _ = writeln!(out, "value     {:+.4}", details.value);
    let _ = writeln!(out, "prior     {}", optional(details.prior));
    let _ = writeln!(out, "explore   {}", optional(details.exploration));
    let _ = writeln!(out, "depth     {}", details.depth);
    let _ = write!(out, "state     {:?}{}", details.state, if details.is_best_path { "  (best path)" } else { "" });
    out
}

/// Both summaries side by side; they cover different trees and are never
/// merged.
pub fn summaries(local: &TreeStats, engine: Option<&EngineSummary>, win_probability: Option<f64>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "cached tree   nodes={} mean N={:.2} mean V={:+.3} max N={} max |V|={:.3}",
        local.count, local.mean_visits, local.mean_value, local.max_visits, local.max_abs_value
    );
    match engine {
        Some(summary) => {
            let _ = write!(
                out,
                "engine tree   nodes={} mean N={:.2} mean V={:+.3}",
                summary.total_nodes, summary.average_visits, summary.average_value
            );
        }
        None => {
            let _ = write!(out, "engine tree   (no summary)");
        }
    }
    if let Some(p) = win_probability {
        let _ = write!(out, "\nai win chance {:.1}%", p * 100.0);
    }
    out
}

/// Node centers after the viewport transform.
pub fn layout_lines(explorer: &Explorer) -> Vec<String> {
    let scene = explorer.scene();
    scene
        .nodes
        .iter()
        .map(|node| {
            let at = scene.transform * node.center;
            format!("{:<16} x={:>8.1} y={:>8.1} r={:.1}", node.key, at.x, at.y, node.radius * explorer.viewport().zoom())
        })
        .collect()
}
