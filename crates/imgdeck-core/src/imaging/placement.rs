//! Watermark geometry.
//!
//! One mapping is used for the rendered output and for the preview overlay:
//! a pixel coordinate is `round(dimension * ratio)` with the ratio clamped
//! to `[0, 1]`. The preview applies the same formula, scaled into its box.

use serde::{Deserialize, Serialize};

/// Default fill colour of the watermark text.
pub const DEFAULT_WATERMARK_COLOR: &str = "rgba(255,255,255,0.75)";
/// Default horizontal and vertical anchor, as a ratio of the image size.
pub const DEFAULT_ANCHOR_RATIO: f64 = 0.9;
/// Maximum number of characters in a watermark text.
pub const MAX_WATERMARK_CHARS: usize = 10;

const MIN_DEFAULT_FONT_SIZE: u32 = 16;
const FONT_SIZE_FACTOR: f64 = 0.05;

/// Appearance and position of a text watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkOptions {
    /// Font size in pixels. `None` or `0` picks [`default_font_size`].
    pub font_size: Option<u32>,
    /// CSS-style colour, see [`crate::imaging::watermark::parse_color`].
    pub color: String,
    /// Clockwise rotation in degrees around the anchor point.
    pub angle: f32,
    pub x_ratio: f64,
    pub y_ratio: f64,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            font_size: None,
            color: DEFAULT_WATERMARK_COLOR.to_string(),
            angle: 0.0,
            x_ratio: DEFAULT_ANCHOR_RATIO,
            y_ratio: DEFAULT_ANCHOR_RATIO,
        }
    }
}

impl WatermarkOptions {
    /// Sets the anchor from percentages (`0..=100`, clamped).
    pub fn with_percent(mut self, x_percent: f64, y_percent: f64) -> Self {
        self.x_ratio = percent_to_ratio(x_percent);
        self.y_ratio = percent_to_ratio(y_percent);
        self
    }
}

/// Converts a percentage to a ratio in `[0, 1]`. NaN maps to `0`.
pub fn percent_to_ratio(percent: f64) -> f64 {
    clamp_ratio(percent / 100.0)
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

/// `max(16, round(min(width, height) * 0.05))`.
pub fn default_font_size(width: u32, height: u32) -> u32 {
    let min_dim = f64::from(width.min(height));
    let scaled = (min_dim * FONT_SIZE_FACTOR).round() as u32;
    scaled.max(MIN_DEFAULT_FONT_SIZE)
}

/// Where the text centre lands on the full-size image, and at which size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub font_size: u32,
}

/// Computes the watermark anchor and font size for a `width` x `height` image.
pub fn place(width: u32, height: u32, options: &WatermarkOptions) -> Placement {
    let x = (f64::from(width) * clamp_ratio(options.x_ratio)).round() as u32;
    let y = (f64::from(height) * clamp_ratio(options.y_ratio)).round() as u32;
    let font_size = options
        .font_size
        .filter(|&size| size > 0)
        .unwrap_or_else(|| default_font_size(width, height));
    Placement { x, y, font_size }
}

/// An object-fit "contain" mapping of a full-size image into a preview box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewMapping {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// A [`Placement`] expressed in preview-box coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewPlacement {
    pub left: f64,
    pub top: f64,
    pub font_size: f64,
}

impl PreviewMapping {
    /// Fits `natural_width` x `natural_height` into the box, centred.
    ///
    /// Returns `None` when either size is degenerate.
    pub fn fit(
        natural_width: u32,
        natural_height: u32,
        box_width: f64,
        box_height: f64,
    ) -> Option<Self> {
        if natural_width == 0 || natural_height == 0 {
            return None;
        }
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(box_width) || !usable(box_height) {
            return None;
        }

        let natural_w = f64::from(natural_width);
        let natural_h = f64::from(natural_height);
        let scale = (box_width / natural_w).min(box_height / natural_h);
        Some(Self {
            scale,
            offset_x: (box_width - natural_w * scale) / 2.0,
            offset_y: (box_height - natural_h * scale) / 2.0,
        })
    }

    pub fn map(&self, placement: &Placement) -> PreviewPlacement {
        PreviewPlacement {
            left: self.offset_x + f64::from(placement.x) * self.scale,
            top: self.offset_y + f64::from(placement.y) * self.scale,
            font_size: (f64::from(placement.font_size) * self.scale).max(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_anchor_on_large_photo() {
        let p = place(4000, 3000, &WatermarkOptions::default());
        let expected = Placement {
            x: 3600,
            y: 2700,
            font_size: 150,
        };
        assert_eq!(p, expected);
    }

    #[test]
    fn default_font_size_has_floor() {
        assert_eq!(default_font_size(100, 80), 16);
        assert_eq!(default_font_size(640, 480), 24);
    }

    #[test]
    fn zero_font_size_uses_default() {
        let opts = WatermarkOptions {
            font_size: Some(0),
            ..WatermarkOptions::default()
        };
        assert_eq!(place(4000, 3000, &opts).font_size, 150);
    }

    #[test]
    fn explicit_font_size_is_kept() {
        let opts = WatermarkOptions {
            font_size: Some(42),
            ..WatermarkOptions::default()
        };
        assert_eq!(place(4000, 3000, &opts).font_size, 42);
    }

    #[test]
    fn ratios_are_clamped() {
        let opts = WatermarkOptions {
            x_ratio: 1.5,
            y_ratio: -0.2,
            ..WatermarkOptions::default()
        };
        let p = place(200, 100, &opts);
        assert_eq!((p.x, p.y), (200, 0));
    }

    #[test]
    fn percent_inputs_are_clamped_and_scaled() {
        let opts = WatermarkOptions::default().with_percent(50.0, 120.0);
        assert_eq!(opts.x_ratio, 0.5);
        assert_eq!(opts.y_ratio, 1.0);
        assert_eq!(percent_to_ratio(f64::NAN), 0.0);
    }

    #[test]
    fn preview_fit_landscape_is_letterboxed() {
        let mapping = PreviewMapping::fit(4000, 2000, 320.0, 240.0).unwrap();
        assert!((mapping.scale - 0.08).abs() < 1e-12);
        assert!(mapping.offset_x.abs() < 1e-9);
        assert!((mapping.offset_y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn preview_maps_same_pixel_formula() {
        let opts = WatermarkOptions::default();
        let placement = place(4000, 3000, &opts);
        let mapping = PreviewMapping::fit(4000, 3000, 320.0, 240.0).unwrap();
        let preview = mapping.map(&placement);

        assert!((preview.left - 288.0).abs() < 1e-9);
        assert!((preview.top - 216.0).abs() < 1e-9);
        assert!((preview.font_size - 12.0).abs() < 1e-9);
    }

    #[test]
    fn preview_font_size_has_floor_of_one() {
        let mapping = PreviewMapping::fit(10_000, 10_000, 10.0, 10.0).unwrap();
        let preview = mapping.map(&Placement {
            x: 0,
            y: 0,
            font_size: 16,
        });
        assert_eq!(preview.font_size, 1.0);
    }

    #[test]
    fn preview_fit_rejects_degenerate_sizes() {
        assert!(PreviewMapping::fit(0, 100, 320.0, 240.0).is_none());
        assert!(PreviewMapping::fit(100, 100, 0.0, 240.0).is_none());
        assert!(PreviewMapping::fit(100, 100, f64::NAN, 240.0).is_none());
    }
}
