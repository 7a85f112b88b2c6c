mod config;
mod error;
mod http;
mod source;
mod synthetic;
pub mod wire;

pub use config::EngineConfig;
pub use error::EngineError;
pub use http::{HttpEngine, decode_body, decode_tree};
pub use source::{GameClient, TreeSource, fetch_ticket};
pub use synthetic::{SyntheticConfig, SyntheticEngine};
