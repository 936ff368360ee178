//! Format conversion.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::imaging::{open_image, prepare_output, save_image};

/// Formats an image can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Gif,
    Tiff,
}

impl TargetFormat {
    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Bmp => "bmp",
            TargetFormat::Gif => "gif",
            TargetFormat::Tiff => "tiff",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Webp => ImageFormat::WebP,
            TargetFormat::Bmp => ImageFormat::Bmp,
            TargetFormat::Gif => ImageFormat::Gif,
            TargetFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::Webp),
            "bmp" => Ok(TargetFormat::Bmp),
            "gif" => Ok(TargetFormat::Gif),
            "tif" | "tiff" => Ok(TargetFormat::Tiff),
            other => Err(CoreError::InvalidOption(format!(
                "unsupported target format: {other}"
            ))),
        }
    }
}

/// Decodes `source` and writes it as `format` into `output_dir`.
pub fn convert_image(
    source: &Path,
    output_dir: &Path,
    format: TargetFormat,
) -> CoreResult<PathBuf> {
    let img = open_image(source)?;
    let out = prepare_output(source, output_dir, format.extension())?;
    save_image(&img, &out, format.image_format())?;
    Ok(out)
}
