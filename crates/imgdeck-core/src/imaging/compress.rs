//! Lossy/lossless re-encoding of images into a smaller copy.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;

use crate::error::{CoreError, CoreResult};
use crate::imaging::{lowercase_extension, open_image, prepare_output};

/// Writes a compressed copy of `source` into `output_dir` and returns its path.
///
/// - JPEG is re-encoded at `quality` (`1..=100`).
/// - PNG is re-encoded with the best zlib compression.
/// - WebP is re-encoded losslessly.
/// - GIF is copied byte for byte.
/// - Anything else is re-encoded as JPEG and gets a `.jpg` extension.
///
/// # Errors
///
/// - [`CoreError::InvalidOption`] if `quality` is outside `1..=100`.
/// - [`CoreError::Image`] if the source cannot be decoded.
pub fn compress_image(source: &Path, output_dir: &Path, quality: u8) -> CoreResult<PathBuf> {
    if !(1..=100).contains(&quality) {
        return Err(CoreError::InvalidOption(format!(
            "quality must be between 1 and 100, got {quality}"
        )));
    }

    let ext = lowercase_extension(source);
    match ext.as_str() {
        "gif" => {
            let out = prepare_output(source, output_dir, &ext)?;
            std::fs::copy(source, &out).map_err(|e| CoreError::from_io(e, source))?;
            Ok(out)
        }
        "png" => {
            let img = open_image(source)?;
            let out = prepare_output(source, output_dir, &ext)?;
            let encoder = PngEncoder::new_with_quality(
                create(&out)?,
                CompressionType::Best,
                FilterType::Adaptive,
            );
            img.write_with_encoder(encoder)?;
            Ok(out)
        }
        "webp" => {
            let img = open_image(source)?;
            let out = prepare_output(source, output_dir, &ext)?;
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(create(&out)?))?;
            Ok(out)
        }
        "jpg" | "jpeg" => {
            let img = open_image(source)?;
            let out = prepare_output(source, output_dir, &ext)?;
            write_jpeg(&img, &out, quality)?;
            Ok(out)
        }
        _ => {
            let img = open_image(source)?;
            let out = prepare_output(source, output_dir, "jpg")?;
            write_jpeg(&img, &out, quality)?;
            Ok(out)
        }
    }
}

fn create(path: &Path) -> CoreResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| CoreError::from_io(e, path))?;
    Ok(BufWriter::new(file))
}

fn write_jpeg(img: &DynamicImage, out: &Path, quality: u8) -> CoreResult<()> {
    let mut writer = create(out)?;
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    Ok(())
}
