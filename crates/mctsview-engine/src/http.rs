use mctsview_core::{Action, EngineNodeId, EngineSummary, WireNode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    error::EngineError,
    source::{GameClient, TreeSource},
    wire::{ErrorDetail, GameStatus, MoveRequest, ProbabilityResponse, SummaryEnvelope, TreeEnvelope},
};

const TREE: &str = "/get_mcts_tree";
const SUBTREE: &str = "/get_mcts_subtree";
const SUMMARY: &str = "/get_mcts_summary";
const START_GAME: &str = "/start_game";
const MAKE_MOVE: &str = "/make_move";
const AI_MOVE: &str = "/ai_move";
const AI_PROBABILITY: &str = "/ai_probability";
const BOARD: &str = "/get_board";

const NO_QUERY: [(&str, u64); 0] = [];

/// Client for the engine's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| EngineError::Http {
                endpoint: "client setup",
                source,
            })?;
        Ok(HttpEngine {
            client,
            base_url: config.base().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T, Q>(&self, endpoint: &'static str, query: &Q) -> Result<T, EngineError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized + Sync,
    {
        let request = self
            .client
            .get(format!("{}{endpoint}", self.base_url))
            .query(query);
        self.send(endpoint, request).await
    }

    async fn post<T, B>(&self, endpoint: &'static str, body: Option<&B>) -> Result<T, EngineError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let mut request = self.client.post(format!("{}{endpoint}", self.base_url));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(endpoint, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, EngineError> {
        let http = |source| EngineError::Http { endpoint, source };
        let response = request.send().await.map_err(http)?;
        let status = response.status();
        let body = response.bytes().await.map_err(http)?;
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "engine response");
        if !status.is_success() {
            return Err(EngineError::Status {
                endpoint,
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        decode_body(endpoint, &body)
    }
}

/// Decode a JSON body from `endpoint`.
pub fn decode_body<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> Result<T, EngineError> {
    serde_json::from_slice(body).map_err(|source| EngineError::Decode { endpoint, source })
}

/// Unwrap a snapshot or subtree envelope; an `error` field wins over `tree`.
pub fn decode_tree(endpoint: &'static str, body: &[u8]) -> Result<Option<WireNode>, EngineError> {
    into_tree(decode_body(endpoint, body)?)
}

fn into_tree(envelope: TreeEnvelope) -> Result<Option<WireNode>, EngineError> {
    match envelope.error {
        Some(message) => Err(EngineError::Engine(message)),
        None => Ok(envelope.tree),
    }
}

fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorDetail>(body) {
        Ok(detail) => detail.detail,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

impl TreeSource for HttpEngine {
    async fn snapshot(&self, max_depth: usize) -> Result<Option<WireNode>, EngineError> {
        let query = [("max_depth", max_depth as u64)];
        into_tree(self.get(TREE, &query).await?)
    }

    async fn subtree(&self, node: EngineNodeId, max_depth: usize) -> Result<Option<WireNode>, EngineError> {
        let query = [("node_id", node.value()), ("max_depth", max_depth as u64)];
        let result = into_tree(self.get(SUBTREE, &query).await?);
        if let Err(err) = &result {
            warn!(%node, error = %err, "engine rejected subtree request");
        }
        result
    }

    async fn summary(&self) -> Result<Option<EngineSummary>, EngineError> {
        let envelope: SummaryEnvelope = self.get(SUMMARY, &NO_QUERY).await?;
        Ok(envelope.summary)
    }
}

impl GameClient for HttpEngine {
    async fn start_game(&self) -> Result<GameStatus, EngineError> {
        self.post::<_, ()>(START_GAME, None).await
    }

    async fn make_move(&self, action: Action) -> Result<GameStatus, EngineError> {
        match self.post(MAKE_MOVE, Some(&MoveRequest::from(action))).await {
            Err(EngineError::Status { status: 400, .. }) => Err(EngineError::InvalidMove { action }),
            other => other,
        }
    }

    async fn ai_move(&self) -> Result<GameStatus, EngineError> {
        self.get(AI_MOVE, &NO_QUERY).await
    }

    async fn board(&self) -> Result<GameStatus, EngineError> {
        self.get(BOARD, &NO_QUERY).await
    }

    async fn win_probability(&self) -> Result<ProbabilityResponse, EngineError> {
        self.get(AI_PROBABILITY, &NO_QUERY).await
    }
}
