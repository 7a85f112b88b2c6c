use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scale::Rgb8;

const DEFAULT_EXPLORER_CONFIG_YAML: &str = include_str!("../config/explorer.default.yaml");

/// Largest snapshot depth the explorer will request.
pub const MAX_SNAPSHOT_DEPTH: usize = 5;

/// Settings for the tree explorer: fetch depths, visual encoding, layout,
/// and viewport limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub snapshot_depth: usize,
    pub subtree_depth: usize,
    pub radius: RadiusRange,
    pub colors: ColorRamp,
    pub layout: LayoutConfig,
    pub zoom: ZoomLimits,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            snapshot_depth: 3,
            subtree_depth: 2,
            radius: RadiusRange::default(),
            colors: ColorRamp::default(),
            layout: LayoutConfig::default(),
            zoom: ZoomLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min: f64,
    pub max: f64,
}

impl Default for RadiusRange {
    fn default() -> Self {
        RadiusRange {
            min: 10.0,
            max: 30.0,
        }
    }
}

/// Endpoints of the diverging value ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    pub negative: Rgb8,
    pub neutral: Rgb8,
    pub positive: Rgb8,
}

impl Default for ColorRamp {
    fn default() -> Self {
        ColorRamp {
            negative: Rgb8::new(0xd7, 0x30, 0x27),
            neutral: Rgb8::new(0xf7, 0xf7, 0xf7),
            positive: Rgb8::new(0x1a, 0x98, 0x50),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Depth grows downwards.
    Vertical,
    /// Depth grows to the right.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    /// World units per unit of separation across a level.
    pub node_spacing: f64,
    /// World units between consecutive depths.
    pub level_spacing: f64,
    /// Separation between children of the same parent.
    pub sibling_separation: f64,
    /// Separation between neighbours with different parents.
    pub cousin_separation: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            orientation: Orientation::Vertical,
            node_spacing: 160.0,
            level_spacing: 100.0,
            sibling_separation: 1.0,
            cousin_separation: 1.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        ZoomLimits { min: 0.1, max: 1.0 }
    }
}

impl ExplorerConfig {
    /// Parse an explorer config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ExplorerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse an explorer config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_EXPLORER_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, ConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    /// Check ranges that would make the scales or layout meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_depth == 0 || self.snapshot_depth > MAX_SNAPSHOT_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "snapshot_depth must be within 1..={MAX_SNAPSHOT_DEPTH}"
            )));
        }
        if self.subtree_depth == 0 {
            return Err(ConfigError::Invalid(
                "subtree_depth must be greater than 0".to_string(),
            ));
        }
        let RadiusRange { min, max } = self.radius;
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
            return Err(ConfigError::Invalid(
                "radius must satisfy 0 < min <= max".to_string(),
            ));
        }
        let layout = &self.layout;
        for (name, value) in [
            ("node_spacing", layout.node_spacing),
            ("level_spacing", layout.level_spacing),
            ("sibling_separation", layout.sibling_separation),
            ("cousin_separation", layout.cousin_separation),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "layout.{name} must be finite and > 0"
                )));
            }
        }
        let ZoomLimits { min, max } = self.zoom;
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
            return Err(ConfigError::Invalid(
                "zoom must satisfy 0 < min <= max".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
/// Error type for loading and validating configuration.
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_matches_default_struct() {
        let config = ExplorerConfig::from_default_yaml().expect("default yaml should parse");
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = ExplorerConfig::from_yaml_str("snapshot_depth: 4\nlayout:\n  orientation: horizontal\n")
            .expect("partial yaml should parse");
        assert_eq!(config.snapshot_depth, 4);
        assert_eq!(config.layout.orientation, Orientation::Horizontal);
        assert_eq!(config.layout.sibling_separation, 1.0);
        assert_eq!(config.radius, RadiusRange::default());
    }

    #[test]
    fn out_of_range_depth_is_rejected() {
        let err = ExplorerConfig::from_yaml_str("snapshot_depth: 9\n").expect_err("depth 9 is too deep");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn inverted_radius_is_rejected() {
        let err = ExplorerConfig::from_yaml_str("radius:\n  min: 30\n  max: 10\n")
            .expect_err("min above max");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_color_fails_to_parse() {
        let yaml = "colors:\n  negative: red\n  neutral: '#ffffff'\n  positive: '#00ff00'\n";
        let err = ExplorerConfig::from_yaml_str(yaml).expect_err("named colors are not accepted");
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
