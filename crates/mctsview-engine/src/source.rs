use std::future::Future;

use mctsview_core::{Action, EngineNodeId, EngineSummary, FetchFailure, FetchTicket, WireNode};
use tracing::debug;

use crate::{
    error::EngineError,
    wire::{GameStatus, ProbabilityResponse},
};

/// Read access to the engine's current search tree.
///
/// `Ok(None)` means the engine has nothing to report (no search has run, or
/// the node has no subtree); it is not an error.
pub trait TreeSource {
    /// Depth-bounded snapshot rooted at the current search root.
    fn snapshot(
        &self,
        max_depth: usize,
    ) -> impl Future<Output = Result<Option<WireNode>, EngineError>> + Send;

    /// Depth-bounded fragment rooted at `node`.
    fn subtree(
        &self,
        node: EngineNodeId,
        max_depth: usize,
    ) -> impl Future<Output = Result<Option<WireNode>, EngineError>> + Send;

    /// Aggregate over the engine's full tree.
    fn summary(&self) -> impl Future<Output = Result<Option<EngineSummary>, EngineError>> + Send;
}

/// The board game played against the engine.
pub trait GameClient {
    fn start_game(&self) -> impl Future<Output = Result<GameStatus, EngineError>> + Send;

    fn make_move(&self, action: Action) -> impl Future<Output = Result<GameStatus, EngineError>> + Send;

    /// Let the engine search and play; this replaces its search tree.
    fn ai_move(&self) -> impl Future<Output = Result<GameStatus, EngineError>> + Send;

    fn board(&self) -> impl Future<Output = Result<GameStatus, EngineError>> + Send;

    fn win_probability(&self) -> impl Future<Output = Result<ProbabilityResponse, EngineError>> + Send;
}

/// Run the subtree fetch described by `ticket` and shape the outcome for
/// [`mctsview_core::Explorer::resolve`].
pub async fn fetch_ticket<S>(source: &S, ticket: &FetchTicket) -> Result<Option<WireNode>, FetchFailure>
where
    S: TreeSource,
{
    debug!(key = %ticket.key, engine_id = %ticket.engine_id, depth = ticket.max_depth, "fetching subtree");
    source
        .subtree(ticket.engine_id, ticket.max_depth)
        .await
        .map_err(FetchFailure::from)
}
