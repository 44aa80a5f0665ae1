//! Configuration loading

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::geometry::GeometryConfig;
use crate::inference::InferenceEndpoint;

/// Default inference service address
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:5000/";

/// Environment variable overriding the inference service address
pub const API_URL_ENV: &str = "PLANFORM_API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid geometry setting: {0}")]
    InvalidGeometry(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Inference service address
    #[serde(default = "default_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl InferenceConfig {
    pub fn endpoint(&self) -> InferenceEndpoint {
        InferenceEndpoint::from_base(&self.url)
    }
}

fn default_url() -> String {
    DEFAULT_INFERENCE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Open the viewer in full-viewport presentation
    #[serde(default)]
    pub start_fullscreen: bool,
    /// Height of the embedded 3D preview in logical pixels
    #[serde(default = "default_embedded_height")]
    pub embedded_height: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            start_fullscreen: false,
            embedded_height: default_embedded_height(),
        }
    }
}

fn default_embedded_height() -> f32 {
    420.0
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.geometry.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply an inference address override (environment, CLI or URL parameter)
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            info!(url = %url, "Overriding inference service address");
            self.inference.url = url;
        }
        self
    }
}

/// Load configuration from file, falling back to defaults when the file is missing
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = Config::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.inference.url, "http://localhost:5000/");
        assert_eq!(config.geometry.scale, 0.15);
        assert_eq!(config.geometry.wall_height, 30.0);
        assert!(!config.viewer.start_fullscreen);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[inference]
url = "http://10.1.1.4:5000"

[geometry]
wall_height = 24.0
"#,
        )
        .unwrap();

        assert_eq!(config.inference.url, "http://10.1.1.4:5000");
        assert_eq!(config.inference.timeout_secs, 30);
        assert_eq!(config.geometry.wall_height, 24.0);
        assert_eq!(config.geometry.scale, 0.15);
        assert_eq!(config.inference.endpoint().url, "http://10.1.1.4:5000/");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("planform.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planform.toml");
        let mut config = Config::default();
        config.viewer.start_fullscreen = true;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planform.toml");
        std::fs::write(&path, "[inference\nurl = 3").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_out_of_range_geometry_is_rejected() {
        for bad in [
            "[geometry]\nmin_extent = 0.0",
            "[geometry]\nscale = -0.15",
            "[geometry]\nwall_height = 0.0",
            "[geometry]\nscale = nan",
            "[geometry]\nwall_height = inf",
        ] {
            assert!(
                matches!(Config::from_toml(bad), Err(ConfigError::InvalidGeometry(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_invalid_geometry_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planform.toml");
        std::fs::write(&path, "[geometry]\nmin_extent = 0.25\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::InvalidGeometry(_))));
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::default().with_api_url(Some("http://remote:9000".to_string()));
        assert_eq!(config.inference.url, "http://remote:9000");

        let config = Config::default().with_api_url(Some("  ".to_string()));
        assert_eq!(config.inference.url, DEFAULT_INFERENCE_URL);
    }
}
