//! Application configuration
//!
//! All tuning lives in one serde-friendly struct with compiled-in defaults;
//! an optional JSON file can override any subset of the fields.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::detect::DetectorConfig;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Render surface width in logical pixels
    pub screen_width: u32,
    /// Render surface height in logical pixels
    pub screen_height: u32,
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            camera: CameraConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            bail!("screen dimensions must be non-zero");
        }
        if self.camera.frame_width == 0 || self.camera.frame_height == 0 {
            bail!("camera frame dimensions must be non-zero");
        }
        if self.detector.min_contour_area <= 0.0 {
            bail!("min_contour_area must be positive");
        }
        if self.detector.min_contour_area >= self.detector.max_contour_area {
            bail!("min_contour_area must be smaller than max_contour_area");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"camera": {"camera_id": 2}}"#).unwrap();
        assert_eq!(config.camera.camera_id, 2);
        assert_eq!(config.camera.frame_width, 1280);
        assert_eq!(config.screen_width, 1920);
        assert_eq!(config.detector.color_classes.len(), 3);
    }

    #[test]
    fn test_invalid_area_bounds_rejected() {
        let mut config = AppConfig::default();
        config.detector.min_contour_area = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.detector.min_contour_area = 5000.0;
        config.detector.max_contour_area = 500.0;
        assert!(config.validate().is_err());
    }
}
