//! Owned exploration state: the current tree, selection, viewport, and
//! everything derived from them.
//!
//! All mutation goes through the named operations below. Operations that
//! need the engine hand back a [`FetchTicket`]; the caller performs the
//! fetch however it likes and reports the outcome with
//! [`Explorer::resolve`]. Nothing here blocks, so any number of fetches for
//! different nodes can be outstanding at once.

use kurbo::{Affine, CubicBez, Point};
use tracing::{info, warn};

use crate::{
    config::{ExplorerConfig, MAX_SNAPSHOT_DEPTH},
    layout::{self, TreeLayout},
    scale::{Extrema, Rgb8, VisualScales},
    tree::{
        cache::{FetchTicket, IngestReport, Resolution, Toggle, TreeCache},
        error::{FetchFailure, TreeError},
        ids::{Action, NodeId, NodeKey},
        node::{ExpansionState, TreeNode},
        snapshot::{EngineSummary, WireNode},
        stats::TreeStats,
    },
    viewport::Viewport,
};

/// Read-only details of one node for the inspection panel.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDetails {
    pub key: NodeKey,
    pub label: String,
    pub action: Option<Action>,
    pub visits: u64,
    pub value: f64,
    pub prior: Option<f64>,
    pub exploration: Option<f64>,
    pub is_best_path: bool,
    pub depth: usize,
    pub state: ExpansionState,
}

impl NodeDetails {
    fn of(node: &TreeNode) -> Self {
        NodeDetails {
            key: node.key().clone(),
            label: node.label(),
            action: node.action(),
            visits: node.visits(),
            value: node.value(),
            prior: node.prior(),
            exploration: node.exploration(),
            is_best_path: node.is_best_path(),
            depth: node.depth(),
            state: node.expansion_state(),
        }
    }
}

/// One drawable node: geometry from the layout, size and color from the
/// scales.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub key: NodeKey,
    pub label: String,
    pub center: Point,
    pub radius: f64,
    pub fill: Rgb8,
    pub is_best_path: bool,
    pub selected: bool,
    pub state: ExpansionState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLink {
    pub parent: NodeKey,
    pub child: NodeKey,
    pub path: CubicBez,
}

/// Everything a renderer needs for one frame, in world coordinates plus the
/// world-to-view transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub links: Vec<SceneLink>,
    pub transform: Affine,
    pub revision: u64,
}

/// What a toggle request turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleRequest {
    /// Applied locally; the view is already up to date.
    Done(Toggle),
    /// Issue this fetch and report back through [`Explorer::resolve`].
    Fetch(FetchTicket),
}

#[derive(Debug, Clone)]
/// Interaction controller for one viewing session.
pub struct Explorer {
    config: ExplorerConfig,
    tree: Option<TreeCache>,
    selected: Option<NodeKey>,
    viewport: Viewport,
    stats: TreeStats,
    scales: VisualScales,
    layout: TreeLayout,
    summary: Option<EngineSummary>,
    notice: Option<String>,
    revision: u64,
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Self {
        let viewport = Viewport::new(config.zoom);
        let stats = TreeStats::default();
        let scales = VisualScales::fit(Extrema::from(&stats), config.radius, config.colors);
        Explorer {
            config,
            tree: None,
            selected: None,
            viewport,
            stats,
            scales,
            layout: TreeLayout::default(),
            summary: None,
            notice: None,
            revision: 0,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn tree(&self) -> Option<&TreeCache> {
        self.tree.as_ref()
    }

    /// Depth to request for the next snapshot.
    pub fn snapshot_depth(&self) -> usize {
        self.config.snapshot_depth
    }

    /// Change the snapshot depth, clamped to `1..=5`. Takes effect at the
    /// next snapshot.
    pub fn set_snapshot_depth(&mut self, depth: usize) -> usize {
        self.config.snapshot_depth = depth.clamp(1, MAX_SNAPSHOT_DEPTH);
        self.config.snapshot_depth
    }

    /// Drop the current tree and everything cached with it, then ingest a
    /// new snapshot fetched with [`Explorer::snapshot_depth`].
    ///
    /// `None` means the engine has no tree yet. A snapshot with a malformed
    /// root leaves the explorer empty and is reported as an error. The
    /// engine summary belongs to the old tree and is dropped as well.
    pub fn replace_snapshot(&mut self, snapshot: Option<WireNode>) -> Result<IngestReport, TreeError> {
        self.tree = None;
        self.selected = None;
        self.summary = None;
        let result = match snapshot {
            None => Ok(IngestReport::default()),
            Some(root) => match TreeCache::from_snapshot(root, self.config.snapshot_depth) {
                Ok((cache, report)) => {
                    info!(nodes = report.added, dropped = report.dropped, "loaded tree snapshot");
                    self.tree = Some(cache.with_fetch_depth(self.config.subtree_depth));
                    Ok(report)
                }
                Err(err) => {
                    warn!(error = %err, "rejected tree snapshot");
                    self.notice = Some(format!("Could not load tree: {err}"));
                    Err(err)
                }
            },
        };
        self.refresh();
        result
    }

    /// Drop the tree without replacing it, e.g. when a game ends.
    pub fn clear(&mut self) {
        self.tree = None;
        self.selected = None;
        self.summary = None;
        self.refresh();
    }

    pub fn set_summary(&mut self, summary: Option<EngineSummary>) {
        self.summary = summary;
        self.refresh_scales();
        self.revision += 1;
    }

    /// Engine-side summary over the full search tree.
    pub fn engine_summary(&self) -> Option<&EngineSummary> {
        self.summary.as_ref()
    }

    /// Client-side scan over the materialized cache.
    pub fn local_summary(&self) -> &TreeStats {
        &self.stats
    }

    pub fn scales(&self) -> &VisualScales {
        &self.scales
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Bumped whenever anything a renderer reads has changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Take the pending transient message, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn selected(&self) -> Option<&NodeKey> {
        self.selected.as_ref()
    }

    /// Select a node by key. An unknown key clears the selection.
    pub fn select(&mut self, key: &NodeKey) -> Option<NodeDetails> {
        let details = self.details(key);
        self.selected = details.as_ref().map(|d| d.key.clone());
        self.revision += 1;
        details
    }

    /// Select the first node played with `action`, typically the move that
    /// was just made.
    pub fn select_action(&mut self, action: Action) -> Option<NodeDetails> {
        let key = self.tree.as_ref().and_then(|tree| {
            let id = tree.find_by_action(action)?;
            tree.node(id).ok().map(|node| node.key().clone())
        });
        match key {
            Some(key) => self.select(&key),
            None => {
                self.deselect();
                None
            }
        }
    }

    /// Select whatever node is drawn under a view-space point.
    pub fn select_at(&mut self, view_point: Point) -> Option<NodeDetails> {
        let key = self.node_at(view_point)?;
        self.select(&key)
    }

    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.revision += 1;
        }
    }

    /// Details for the current selection, looked up in the current tree.
    pub fn selection_details(&self) -> Option<NodeDetails> {
        self.details(self.selected.as_ref()?)
    }

    pub fn details(&self, key: &NodeKey) -> Option<NodeDetails> {
        let tree = self.tree.as_ref()?;
        let node = tree.node(tree.find(key)?).ok()?;
        Some(NodeDetails::of(node))
    }

    /// Key of the visible node drawn under a view-space point.
    pub fn node_at(&self, view_point: Point) -> Option<NodeKey> {
        let tree = self.tree.as_ref()?;
        let world = self.viewport.view_to_world(view_point);
        let id = self.layout.hit_test(world, |id| {
            tree.node(id)
                .map(|node| self.scales.size_of(node.visits()))
                .unwrap_or(0.0)
        })?;
        tree.node(id).ok().map(|node| node.key().clone())
    }

    /// Toggle a node's expansion.
    ///
    /// Local transitions re-derive the view immediately. An unfetched node
    /// turns into a fetch request; the node shows as loading until the
    /// outcome is resolved.
    pub fn toggle(&mut self, key: &NodeKey) -> Result<ToggleRequest, TreeError> {
        let tree = self.tree.as_mut().ok_or(TreeError::NoTree)?;
        let id = tree
            .find(key)
            .ok_or_else(|| TreeError::UnknownKey { key: key.clone() })?;
        let outcome = tree.toggle(id)?;
        self.refresh();
        Ok(match outcome {
            Toggle::Fetch(ticket) => ToggleRequest::Fetch(ticket),
            other => ToggleRequest::Done(other),
        })
    }

    /// Report the outcome of a fetch issued for `ticket`.
    ///
    /// Responses for a replaced tree or an abandoned request are discarded.
    /// Failures leave the node unfetched and raise a notice.
    pub fn resolve(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Option<WireNode>, FetchFailure>,
    ) -> Resolution {
        let Some(tree) = self.tree.as_mut() else {
            return Resolution::Stale;
        };
        let resolution = tree.resolve(ticket, outcome);
        match &resolution {
            Resolution::Stale => return Resolution::Stale,
            Resolution::Failed(failure) => {
                self.notice = Some(format!("Could not expand {}: {failure}", ticket.key));
            }
            Resolution::Applied { dropped, .. } if *dropped > 0 => {
                self.notice = Some(format!(
                    "{dropped} malformed node(s) under {} were skipped",
                    ticket.key
                ));
            }
            Resolution::Applied { .. } => {}
        }
        self.refresh();
        resolution
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.viewport.zoom_by(factor);
        self.revision += 1;
    }

    pub fn zoom_about(&mut self, anchor: Point, factor: f64) {
        self.viewport.zoom_about(anchor, factor);
        self.revision += 1;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
        self.revision += 1;
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.revision += 1;
    }

    /// Keys of the best-path chain from the root.
    pub fn best_path(&self) -> Vec<NodeKey> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        tree.best_path()
            .into_iter()
            .filter_map(|id| tree.node(id).ok().map(|node| node.key().clone()))
            .collect()
    }

    /// Build the drawable frame for the current state.
    pub fn scene(&self) -> Scene {
        let mut scene = Scene {
            nodes: Vec::new(),
            links: Vec::new(),
            transform: self.viewport.transform(),
            revision: self.revision,
        };
        let Some(tree) = self.tree.as_ref() else {
            return scene;
        };
        let key_of = |id: NodeId| tree.node(id).ok().map(|node| node.key().clone());

        scene.nodes = self
            .layout
            .nodes
            .iter()
            .filter_map(|placed| {
                let node = tree.node(placed.id).ok()?;
                Some(SceneNode {
                    key: node.key().clone(),
                    label: node.label(),
                    center: placed.position,
                    radius: self.scales.size_of(node.visits()),
                    fill: self.scales.color_of(node.value()),
                    is_best_path: node.is_best_path(),
                    selected: self.selected.as_ref() == Some(node.key()),
                    state: node.expansion_state(),
                })
            })
            .collect();
        scene.links = self
            .layout
            .links
            .iter()
            .filter_map(|link| {
                Some(SceneLink {
                    parent: key_of(link.parent)?,
                    child: key_of(link.child)?,
                    path: link.path,
                })
            })
            .collect();
        scene
    }

    /// Re-derive stats, scales, and layout after the tree changed.
    fn refresh(&mut self) {
        self.stats = TreeStats::scan_opt(self.tree.as_ref());
        self.refresh_scales();
        self.layout = match self.tree.as_ref() {
            Some(tree) => layout::layout(tree, &self.config.layout),
            None => TreeLayout::default(),
        };
        let selection_gone = self
            .selected
            .as_ref()
            .is_some_and(|key| self.tree.as_ref().and_then(|tree| tree.find(key)).is_none());
        if selection_gone {
            self.selected = None;
        }
        self.revision += 1;
    }

    /// Full-tree extrema from the engine win over the local scan when
    /// both are known.
    fn refresh_scales(&mut self) {
        let extrema = self
            .summary
            .as_ref()
            .filter(|_| self.tree.is_some())
            .and_then(EngineSummary::extrema)
            .unwrap_or_else(|| Extrema::from(&self.stats));
        self.scales = VisualScales::fit(extrema, self.config.radius, self.config.colors);
    }
}
