mod arena;
pub mod cache;
pub mod error;
pub mod ids;
pub mod node;
pub mod snapshot;
pub mod stats;

#[cfg(test)]
mod tests;
