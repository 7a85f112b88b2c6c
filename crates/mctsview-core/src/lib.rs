pub mod config;
pub mod explorer;
pub mod layout;
pub mod scale;
mod tree;
pub mod viewport;

pub use config::{
    ColorRamp, ConfigError, ExplorerConfig, LayoutConfig, MAX_SNAPSHOT_DEPTH, Orientation,
    RadiusRange, ZoomLimits,
};
pub use explorer::{Explorer, NodeDetails, Scene, SceneLink, SceneNode, ToggleRequest};
pub use layout::{Link, PlacedNode, TreeLayout, layout};
pub use scale::{ColorScale, Extrema, Rgb8, SizeScale, VisualScales};
pub use tree::cache::{
    DEFAULT_FETCH_DEPTH, FetchTicket, IngestReport, Resolution, Toggle, TreeCache,
};
pub use tree::error::{FetchFailure, TreeError};
pub use tree::ids::{Action, EngineNodeId, NodeId, NodeKey};
pub use tree::node::{ExpansionState, TreeNode};
pub use tree::snapshot::{EngineSummary, WireNode};
pub use tree::stats::TreeStats;
pub use viewport::Viewport;
