// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{APP_ID, capture, processing, surface};
use crate::errors::{AppError, AppResult};
use crate::pipelines::preview::RawDisplay;
use crate::processing::EngineKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current on-disk config version
pub const CONFIG_VERSION: u32 = 1;

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
    /// Generated moving test pattern
    #[default]
    Synthetic,
    /// A still image replayed at the capture rate
    Image { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Config format version
    pub version: u32,
    /// Processing engine applied in processed mode
    pub engine: EngineKind,
    /// Gradient threshold for the edge engine
    pub edge_threshold: f32,
    /// Whether the preview starts in processed mode
    pub processing_enabled: bool,
    /// What the preview shows while processing is off
    pub raw_display: RawDisplay,
    /// Frame source
    pub source: SourceSettings,
    /// Capture width
    pub capture_width: u32,
    /// Capture height
    pub capture_height: u32,
    /// Capture rate of the built-in sources
    pub capture_fps: u32,
    /// Offscreen surface width
    pub surface_width: u32,
    /// Offscreen surface height
    pub surface_height: u32,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            engine: EngineKind::default(),
            edge_threshold: processing::DEFAULT_EDGE_THRESHOLD,
            processing_enabled: true,
            raw_display: RawDisplay::default(),
            source: SourceSettings::default(),
            capture_width: capture::DEFAULT_WIDTH,
            capture_height: capture::DEFAULT_HEIGHT,
            capture_fps: capture::DEFAULT_FPS,
            surface_width: surface::DEFAULT_WIDTH,
            surface_height: surface::DEFAULT_HEIGHT,
            mirror_preview: true, // Default to mirrored (selfie mode)
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/edge-preview/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join("config.json"))
    }

    /// Load config from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from `path`
    ///
    /// A missing file yields defaults silently; a malformed one is logged
    /// and replaced by defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match Self::from_json(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| AppError::Config(e.to_string()))?;
        if config.version > CONFIG_VERSION {
            warn!(
                found = config.version,
                supported = CONFIG_VERSION,
                "Config written by a newer version"
            );
        }
        config.validate()?;
        Ok(config)
    }

    /// Write config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> AppResult<()> {
        let dims = [
            ("capture_width", self.capture_width),
            ("capture_height", self.capture_height),
            ("surface_width", self.surface_width),
            ("surface_height", self.surface_height),
        ];
        for (name, value) in dims {
            if value == 0 || value > capture::MAX_DIMENSION {
                return Err(AppError::Config(format!("{name} out of range: {value}")));
            }
        }
        if self.capture_fps == 0 || self.capture_fps > capture::MAX_FPS {
            let fps = self.capture_fps;
            return Err(AppError::Config(format!("invalid capture_fps: {fps}")));
        }
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(AppError::Config(format!(
                "edge_threshold must be a non-negative number, got {}",
                self.edge_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = Config::from_json(r#"{ "engine": "invert", "capture_fps": 15 }"#).unwrap();
        assert_eq!(config.engine, EngineKind::Invert);
        assert_eq!(config.capture_fps, 15);
        assert_eq!(config.capture_width, capture::DEFAULT_WIDTH);
        assert!(config.processing_enabled);
    }

    #[test]
    fn test_image_source_json() {
        let config =
            Config::from_json(r#"{ "source": { "kind": "image", "path": "/tmp/a.png" } }"#)
                .unwrap();
        assert_eq!(
            config.source,
            SourceSettings::Image {
                path: PathBuf::from("/tmp/a.png")
            }
        );
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(Config::from_json(r#"{ "surface_height": 0 }"#).is_err());
        assert!(Config::from_json(r#"{ "capture_fps": 0 }"#).is_err());
    }

    #[test]
    fn test_rejects_runaway_frame_rate() {
        assert!(Config::from_json(r#"{ "capture_fps": 2000000000 }"#).is_err());
        let at_limit = format!(r#"{{ "capture_fps": {} }}"#, capture::MAX_FPS);
        assert!(Config::from_json(&at_limit).is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("edge-preview-does-not-exist/config.json");
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("edge-preview-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let config = Config {
            raw_display: RawDisplay::Freeze,
            edge_threshold: 12.5,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
