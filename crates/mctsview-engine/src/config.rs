use std::{fs, path::Path, time::Duration};

use mctsview_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Where the engine lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_a_local_engine() {
        let config = EngineConfig::from_yaml_str("{}").expect("empty mapping is valid");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.base(), "http://localhost:8000");
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let config = EngineConfig::from_yaml_str("base_url: https://engine.test/\n").expect("valid url");
        assert_eq!(config.base(), "https://engine.test");
    }

    #[test]
    fn rejects_urls_without_scheme() {
        let err = EngineConfig::from_yaml_str("base_url: localhost:8000\n").expect_err("no scheme");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
