//! Configuration for drawbot.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default, so an empty object is a valid configuration.

use crate::command::{DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_WIDTH, DrawingData};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default font for text commands that don't name one.
pub const DEFAULT_FONT: &str = "16px sans-serif";

/// Largest surface, in pixels, a drawing may be rasterized onto (4096 x 4096).
pub const DEFAULT_MAX_PIXELS: u64 = 4096 * 4096;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Canvas settings used for every fresh drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasDefaults {
    pub width: u32,
    pub height: u32,
    pub background: String,
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl CanvasDefaults {
    /// The empty drawing a new editing session starts from.
    pub fn empty_drawing(&self) -> DrawingData {
        DrawingData::with_size(self.width, self.height, self.background.clone())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawbotConfig {
    pub canvas: CanvasDefaults,
    /// Maximum number of undo states (`None` = unbounded).
    pub history_capacity: Option<usize>,
    /// CSS font shorthand used when a text command has no font.
    pub default_font: String,
    /// Directory for saved drawings (`None` = platform data directory).
    pub storage_dir: Option<PathBuf>,
    /// Drawings with more pixels than this are refused at render time.
    pub max_pixels: u64,
}

impl Default for DrawbotConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasDefaults::default(),
            history_capacity: None,
            default_font: DEFAULT_FONT.to_string(),
            storage_dir: None,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl DrawbotConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
