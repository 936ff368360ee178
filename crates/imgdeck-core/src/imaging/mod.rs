//! Image processing for batch operations.
//!
//! Each operation reads one source image and writes a new file into an
//! output directory; sources are never modified. Output names come from
//! [`crate::fs::ops::copy_output_path`] so existing files are never
//! overwritten.

pub mod compress;
pub mod convert;
pub mod crop;
pub mod placement;
pub mod watermark;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::{CoreError, CoreResult};
use crate::fs::ops::copy_output_path;

pub use compress::compress_image;
pub use convert::{convert_image, TargetFormat};
pub use crop::{crop_image, CropRegion};
pub use placement::{place, Placement, PreviewMapping, PreviewPlacement, WatermarkOptions};
pub use watermark::{parse_color, Watermarker};

/// Decodes the image at `path`, sniffing the format from its contents.
pub(crate) fn open_image(path: &Path) -> CoreResult<DynamicImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| CoreError::from_io(e, path))?
        .with_guessed_format()
        .map_err(|e| CoreError::from_io(e, path))?;
    Ok(reader.decode()?)
}

/// Writes `img` to `path` in `format`, converting the pixel layout to one
/// the encoder accepts.
pub(crate) fn save_image(img: &DynamicImage, path: &Path, format: ImageFormat) -> CoreResult<()> {
    let file = File::create(path).map_err(|e| CoreError::from_io(e, path))?;
    let mut writer = BufWriter::new(file);
    let prepared = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::WebP | ImageFormat::Gif | ImageFormat::Ico | ImageFormat::Bmp => {
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        _ => img.clone(),
    };
    prepared.write_to(&mut writer, format)?;
    Ok(())
}

/// Creates `output_dir` if needed and picks a fresh output path for a
/// processed copy of `source` with the given extension.
pub(crate) fn prepare_output(
    source: &Path,
    output_dir: &Path,
    extension: &str,
) -> CoreResult<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| CoreError::from_io(e, output_dir))?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| CoreError::InvalidName(source.display().to_string()))?;
    Ok(copy_output_path(output_dir, &stem, extension))
}

/// Lowercase extension of `path`, or an empty string.
pub(crate) fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// Writes a small gradient image; the format follows the extension.
    pub fn write_sample(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128])
        });
        img.save(path).unwrap();
    }
}
