//! Command-line arguments and the optional YAML config file.
//!
//! Flags win over the file, the file wins over built-in defaults.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mctsview_core::ExplorerConfig;
use mctsview_engine::{EngineConfig, SyntheticConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Parser)]
#[command(name = "mctsview", version, about = "Explore an MCTS engine's search tree from the terminal")]
pub struct Args {
    /// YAML file with `explorer`, `engine`, and `synthetic` sections.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Engine base URL, overriding the config file.
    #[arg(long, value_name = "URL")]
    pub engine_url: Option<String>,

    /// Use the built-in synthetic engine seeded with SEED instead of HTTP.
    #[arg(long, value_name = "SEED")]
    pub synthetic: Option<u64>,

    /// Snapshot depth, clamped to 1..=5.
    #[arg(long)]
    pub depth: Option<usize>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "mctsview=info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub explorer: ExplorerConfig,
    pub engine: EngineConfig,
    pub synthetic: SyntheticConfig,
}

impl AppConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml).context("failed to parse config YAML")?;
        config.explorer.validate()?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Resolve the effective config from `args`.
    pub fn load(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let yaml = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                Self::from_yaml_str(&yaml)?
            }
            None => AppConfig::default(),
        };
        if let Some(url) = &args.engine_url {
            config.engine.base_url = url.clone();
            config.engine.validate()?;
        }
        if let Some(depth) = args.depth {
            config.explorer.snapshot_depth = depth.clamp(1, mctsview_core::MAX_SNAPSHOT_DEPTH);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("mctsview").chain(extra.iter().copied()))
    }

    #[test]
    fn sections_are_optional() {
        let config = AppConfig::from_yaml_str("engine:\n  base_url: http://10.0.0.2:9000\n").expect("valid yaml");
        assert_eq!(config.engine.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.explorer, ExplorerConfig::default());
    }

    #[test]
    fn nested_sections_are_validated() {
        assert!(AppConfig::from_yaml_str("explorer:\n  snapshot_depth: 0\n").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let config = AppConfig::load(&args(&["--engine-url", "https://mcts.test", "--depth", "9"]))
            .expect("flags are valid");
        assert_eq!(config.engine.base_url, "https://mcts.test");
        assert_eq!(config.explorer.snapshot_depth, 5);
    }

    #[test]
    fn bad_url_flag_is_rejected() {
        assert!(AppConfig::load(&args(&["--engine-url", "mcts.test"])).is_err());
    }
}
