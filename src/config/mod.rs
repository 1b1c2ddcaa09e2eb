//! View configuration
//!
//! Every field has a default, so a partial JSON document (or none at all) is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors raised while loading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for one graph view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Debounce window after the last delta before the simulation stops
    pub reheat_window_ms: u64,
    /// Weight of the perpendicular offset in directional scoring
    pub perpendicular_weight: f64,
    /// Suggested zoom factor for plain directional moves
    pub move_zoom: f64,
    /// Suggested zoom factor for connected and search hops
    pub relationship_zoom: f64,
    /// Leading lines skipped when previewing document content
    pub preview_line_offset: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            reheat_window_ms: 500,
            perpendicular_weight: 2.0,
            move_zoom: 1.0,
            relationship_zoom: 1.5,
            preview_line_offset: 0,
        }
    }
}

impl ViewConfig {
    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Loading view config from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Debounce window as a duration
    pub fn reheat_window(&self) -> Duration {
        Duration::from_millis(self.reheat_window_ms)
    }

    /// Reject values that would break navigation or reheat
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reheat_window_ms == 0 {
            return Err(ConfigError::Invalid(
                "reheatWindowMs must be greater than zero".to_string(),
            ));
        }
        if !self.perpendicular_weight.is_finite() || self.perpendicular_weight < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "perpendicularWeight must be a non-negative number, got {}",
                self.perpendicular_weight
            )));
        }
        for (name, zoom) in [
            ("moveZoom", self.move_zoom),
            ("relationshipZoom", self.relationship_zoom),
        ] {
            if !zoom.is_finite() || zoom <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {zoom}"
                )));
            }
        }
        Ok(())
    }
}
