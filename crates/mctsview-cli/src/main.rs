//! mctsview - explore an MCTS engine's search tree from the terminal.
//!
//! Talks to the engine over HTTP, or to a seeded synthetic engine with
//! `--synthetic <seed>`. Logs go to stderr; stdout is the interactive view.

use anyhow::Result;
use clap::Parser;
use mctsview_engine::{HttpEngine, SyntheticEngine};
use tracing::info;

mod app;
mod commands;
mod config;
mod render;

use crate::config::{AppConfig, Args};

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;
    let config = AppConfig::load(&args)?;

    match args.synthetic {
        Some(seed) => {
            info!(seed, "using synthetic engine");
            let engine = SyntheticEngine::with_config(seed, config.synthetic.clone());
            engine.search();
            app::run(engine, config).await
        }
        None => {
            info!(url = %config.engine.base_url, "using HTTP engine");
            let engine = HttpEngine::new(&config.engine)?;
            app::run(engine, config).await
        }
    }
}
