//! Rectangular cropping.

use std::path::{Path, PathBuf};

use image::{GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::imaging::{lowercase_extension, open_image, prepare_output, save_image};

/// A crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Checks that the region is non-empty and fits inside `width` x `height`.
    pub fn validate(&self, width: u32, height: u32) -> CoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidOption(
                "crop region must not be empty".to_string(),
            ));
        }
        let fits_x = self.x.checked_add(self.width).is_some_and(|r| r <= width);
        let fits_y = self.y.checked_add(self.height).is_some_and(|b| b <= height);
        if !fits_x || !fits_y {
            return Err(CoreError::InvalidOption(format!(
                "crop region {}x{}+{}+{} exceeds image bounds {width}x{height}",
                self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }
}

/// Crops `source` to `region` and saves the result in the source format.
///
/// # Errors
///
/// - [`CoreError::InvalidOption`] if `region` does not fit the image.
pub fn crop_image(source: &Path, output_dir: &Path, region: CropRegion) -> CoreResult<PathBuf> {
    let img = open_image(source)?;
    let (width, height) = img.dimensions();
    region.validate(width, height)?;

    let ext = lowercase_extension(source);
    let (ext, format) = match ImageFormat::from_extension(&ext) {
        Some(format) => (ext, format),
        None => ("png".to_string(), ImageFormat::Png),
    };

    let cropped = img.crop_imm(region.x, region.y, region.width, region.height);
    let out = prepare_output(source, output_dir, &ext)?;
    save_image(&cropped, &out, format)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_support::write_sample;
    use tempfile::TempDir;

    #[test]
    fn crops_to_region() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("wide.png");
        write_sample(&src, 20, 10);

        let out = crop_image(&src, tmp.path(), CropRegion::new(5, 2, 10, 6)).unwrap();
        assert_eq!(out, tmp.path().join("wide_copy.png"));
        assert_eq!(image::image_dimensions(&out).unwrap(), (10, 6));
    }

    #[test]
    fn crop_preserves_pixels() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("grad.png");
        write_sample(&src, 20, 10);

        let out = crop_image(&src, tmp.path(), CropRegion::new(3, 4, 2, 2)).unwrap();
        let original = image::open(&src).unwrap().to_rgb8();
        let cropped = image::open(&out).unwrap().to_rgb8();
        assert_eq!(cropped.get_pixel(0, 0), original.get_pixel(3, 4));
        assert_eq!(cropped.get_pixel(1, 1), original.get_pixel(4, 5));
    }

    #[test]
    fn full_image_region_is_valid() {
        assert!(CropRegion::new(0, 0, 20, 10).validate(20, 10).is_ok());
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let region = CropRegion::new(15, 0, 10, 10);
        assert!(matches!(
            region.validate(20, 10).unwrap_err(),
            CoreError::InvalidOption(_)
        ));
    }

    #[test]
    fn empty_region_is_rejected() {
        assert!(CropRegion::new(0, 0, 0, 5).validate(20, 10).is_err());
    }

    #[test]
    fn overflowing_region_is_rejected() {
        let region = CropRegion::new(u32::MAX, 0, 2, 2);
        assert!(region.validate(u32::MAX, 10).is_err());
    }

    #[test]
    fn invalid_region_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("small.png");
        write_sample(&src, 4, 4);

        let result = crop_image(&src, tmp.path(), CropRegion::new(0, 0, 5, 5));
        assert!(result.is_err());
        assert!(!tmp.path().join("small_copy.png").exists());
    }
}
