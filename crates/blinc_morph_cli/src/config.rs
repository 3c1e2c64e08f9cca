//! blinc_morph.toml handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "blinc_morph.toml";

/// Top-level CLI configuration
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MorphConfig {
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub hit_test: HitTestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Path string output
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FormatConfig {
    /// Decimal places in printed path strings; shortest form when unset
    #[serde(default)]
    pub precision: Option<usize>,
}

/// Hit test radii
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct HitTestConfig {
    #[serde(default = "default_point_radius")]
    pub point_radius: f64,
    #[serde(default = "default_segment_radius")]
    pub segment_radius: f64,
    #[serde(default = "default_true")]
    pub find_shapes: bool,
}

fn default_point_radius() -> f64 {
    1.5
}

fn default_segment_radius() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            point_radius: default_point_radius(),
            segment_radius: default_segment_radius(),
            find_shapes: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl MorphConfig {
    /// Load an explicit config file, or blinc_morph.toml from the working
    /// directory if present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MorphConfig::from_toml("").unwrap();
        assert_eq!(config, MorphConfig::default());
        assert_eq!(config.format.precision, None);
        assert_eq!(config.hit_test.point_radius, 1.5);
        assert_eq!(config.hit_test.segment_radius, 1.0);
        assert!(config.hit_test.find_shapes);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_sections() {
        let config = MorphConfig::from_toml(
            r#"
            [format]
            precision = 3

            [hit_test]
            find_shapes = false
            "#,
        )
        .unwrap();
        assert_eq!(config.format.precision, Some(3));
        assert!(!config.hit_test.find_shapes);
        assert_eq!(config.hit_test.point_radius, 1.5);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = MorphConfig::default();
        config.logging.level = "debug".to_string();
        config.hit_test.segment_radius = 4.0;
        let parsed = MorphConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = MorphConfig::load(Some(Path::new("/nonexistent/blinc_morph.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(MorphConfig::from_toml("[hit_test]\npoint_radius = \"big\"").is_err());
    }
}
