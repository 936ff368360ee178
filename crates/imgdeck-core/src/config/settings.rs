//! Application configuration loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::fs::preview::DEFAULT_PREVIEW_SCHEME;
use crate::imaging::placement::{WatermarkOptions, DEFAULT_WATERMARK_COLOR};
use crate::view::window::GridGeometry;

/// Top-level application configuration.
///
/// All fields have sensible defaults so imgdeck works without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub grid: GridGeometry,
    #[serde(default)]
    pub compress: CompressConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::from_io(e, path))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Loads `path` when given, otherwise the file at [`Config::default_path`]
    /// if one exists, otherwise the built-in defaults.
    ///
    /// An explicitly given path must exist.
    pub fn load_or_default(path: Option<&Path>) -> CoreResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.is_file() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// `<platform config dir>/imgdeck/config.toml`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "imgdeck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// General browsing preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory opened at startup. `None` opens the platform default root.
    #[serde(default)]
    pub start_dir: Option<PathBuf>,
    /// Where batch outputs go when no directory is given. `None` writes next
    /// to the source files.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Compression defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressConfig {
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

/// Watermark defaults. Positions are percentages of the image size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default = "default_watermark_color")]
    pub color: String,
    #[serde(default)]
    pub angle: f32,
    #[serde(default = "default_anchor_percent")]
    pub x_percent: f64,
    #[serde(default = "default_anchor_percent")]
    pub y_percent: f64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_size: None,
            color: default_watermark_color(),
            angle: 0.0,
            x_percent: default_anchor_percent(),
            y_percent: default_anchor_percent(),
        }
    }
}

impl WatermarkConfig {
    /// Converts the configured defaults into render options.
    pub fn to_options(&self) -> WatermarkOptions {
        WatermarkOptions {
            font_size: self.font_size,
            color: self.color.clone(),
            angle: self.angle,
            ..WatermarkOptions::default()
        }
        .with_percent(self.x_percent, self.y_percent)
    }
}

/// Preview URL and overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_box_width")]
    pub box_width: f64,
    #[serde(default = "default_box_height")]
    pub box_height: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            box_width: default_box_width(),
            box_height: default_box_height(),
        }
    }
}

fn default_quality() -> u8 {
    80
}

fn default_watermark_color() -> String {
    DEFAULT_WATERMARK_COLOR.to_string()
}

fn default_anchor_percent() -> f64 {
    90.0
}

fn default_scheme() -> String {
    DEFAULT_PREVIEW_SCHEME.to_string()
}

fn default_box_width() -> f64 {
    320.0
}

fn default_box_height() -> f64 {
    240.0
}
