use mctsview_core::{Action, FetchFailure};
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for requests to the search engine.
pub enum EngineError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered with HTTP {status}: {detail}")]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: String,
    },

    /// The engine understood the request but reported an error in the body.
    #[error("engine error: {0}")]
    Engine(String),

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid move {action}")]
    InvalidMove { action: Action },
}

impl From<EngineError> for FetchFailure {
    fn from(err: EngineError) -> Self {
        FetchFailure::new(err.to_string())
    }
}
