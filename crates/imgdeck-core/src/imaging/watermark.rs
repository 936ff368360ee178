//! Text watermarks.
//!
//! Text is shaped and rasterized with `cosmic-text` using the system fonts,
//! then rotated about its centre and alpha-blended onto the image so that
//! the centre lands on the [`Placement`] anchor.

use std::path::{Path, PathBuf};

use cosmic_text::{Attrs, Buffer, Color, FontSystem, Metrics, Shaping, SwashCache};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};

use crate::error::{CoreError, CoreResult};
use crate::imaging::placement::{place, Placement, WatermarkOptions, MAX_WATERMARK_CHARS};
use crate::imaging::{lowercase_extension, open_image, prepare_output, save_image};

const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Parses a CSS-style colour into RGBA.
///
/// Accepts a handful of names, `#rgb`, `#rrggbb`, `#rrggbbaa`,
/// `rgb(r, g, b)` and `rgba(r, g, b, a)` where `a` is in `0.0..=1.0`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidOption`] for anything else.
pub fn parse_color(s: &str) -> CoreResult<Rgba<u8>> {
    let invalid = || CoreError::InvalidOption(format!("invalid color: {s}"));
    let lower = s.trim().to_lowercase();

    match lower.as_str() {
        "white" => return Ok(Rgba([255, 255, 255, 255])),
        "black" => return Ok(Rgba([0, 0, 0, 255])),
        "red" => return Ok(Rgba([255, 0, 0, 255])),
        "green" => return Ok(Rgba([0, 128, 0, 255])),
        "blue" => return Ok(Rgba([0, 0, 255, 255])),
        "yellow" => return Ok(Rgba([255, 255, 0, 255])),
        "gray" | "grey" => return Ok(Rgba([128, 128, 128, 255])),
        "transparent" => return Ok(Rgba([0, 0, 0, 0])),
        _ => {}
    }

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(invalid);
    }

    let (args, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest, true)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest, false)
    } else {
        return Err(invalid());
    };
    let args = args.strip_suffix(')').ok_or_else(invalid)?;
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != if has_alpha { 4 } else { 3 } {
        return Err(invalid());
    }

    let channel = |p: &str| p.parse::<u8>().ok();
    let r = channel(parts[0]).ok_or_else(invalid)?;
    let g = channel(parts[1]).ok_or_else(invalid)?;
    let b = channel(parts[2]).ok_or_else(invalid)?;
    let a = if has_alpha {
        let alpha: f32 = parts[3].parse().map_err(|_| invalid())?;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(invalid());
        }
        (alpha * 255.0).round() as u8
    } else {
        255
    };
    Ok(Rgba([r, g, b, a]))
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);
            Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255]))
        }
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

/// Checks that `text` is non-blank and at most [`MAX_WATERMARK_CHARS`] characters.
pub fn validate_text(text: &str) -> CoreResult<()> {
    if text.trim().is_empty() {
        return Err(CoreError::InvalidOption(
            "watermark text must not be empty".to_string(),
        ));
    }
    let count = text.chars().count();
    if count > MAX_WATERMARK_CHARS {
        return Err(CoreError::InvalidOption(format!(
            "watermark text is limited to {MAX_WATERMARK_CHARS} characters, got {count}"
        )));
    }
    Ok(())
}

/// Renders text watermarks. Holds the loaded font database, so one instance
/// should be reused for a whole batch.
pub struct Watermarker {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl Watermarker {
    /// Loads the system fonts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Image`] if no font face is installed.
    pub fn new() -> CoreResult<Self> {
        let font_system = FontSystem::new();
        if font_system.db().faces().next().is_none() {
            return Err(CoreError::Image(
                "no system fonts available for watermark text".to_string(),
            ));
        }
        Ok(Self {
            font_system,
            swash_cache: SwashCache::new(),
        })
    }

    /// Writes a watermarked copy of `source` into `output_dir`.
    ///
    /// The copy keeps the source format when it can be encoded, otherwise
    /// it is written as PNG.
    pub fn apply(
        &mut self,
        source: &Path,
        output_dir: &Path,
        text: &str,
        options: &WatermarkOptions,
    ) -> CoreResult<PathBuf> {
        validate_text(text)?;
        let color = parse_color(&options.color)?;
        let img = open_image(source)?;
        let (width, height) = img.dimensions();
        let placement = place(width, height, options);

        let mut canvas = img.to_rgba8();
        let label = self.rasterize(text, placement.font_size, color);
        stamp(&mut canvas, &label, &placement, options.angle);

        let ext = lowercase_extension(source);
        let (ext, format) = match ImageFormat::from_extension(&ext) {
            Some(format) if format.can_write() => (ext, format),
            _ => ("png".to_string(), ImageFormat::Png),
        };
        let out = prepare_output(source, output_dir, &ext)?;
        save_image(&DynamicImage::ImageRgba8(canvas), &out, format)?;
        Ok(out)
    }

    /// Draws `text` onto a transparent canvas just large enough to hold it.
    fn rasterize(&mut self, text: &str, font_size: u32, color: Rgba<u8>) -> RgbaImage {
        let size = font_size.max(1) as f32;
        let metrics = Metrics::new(size, size * LINE_HEIGHT_FACTOR);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let (line_w, lines) = buffer
            .layout_runs()
            .fold((0.0f32, 0usize), |(w, n), run| (w.max(run.line_w), n + 1));
        let canvas_w = line_w.ceil().max(1.0) as u32;
        let canvas_h = (lines.max(1) as f32 * metrics.line_height).ceil() as u32;

        let mut label = RgbaImage::new(canvas_w, canvas_h);
        let [r, g, b, a] = color.0;
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgba(r, g, b, a),
            |x, y, w, h, c| {
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        let (px, py) = (x + dx, y + dy);
                        if px < 0 || py < 0 || px as u32 >= canvas_w || py as u32 >= canvas_h {
                            continue;
                        }
                        let pixel = label.get_pixel_mut(px as u32, py as u32);
                        if c.a() > pixel[3] {
                            *pixel = Rgba([c.r(), c.g(), c.b(), c.a()]);
                        }
                    }
                }
            },
        );
        label
    }
}

/// Blends `label` onto `canvas`, centred on the placement anchor and rotated
/// clockwise by `angle_deg`.
fn stamp(canvas: &mut RgbaImage, label: &RgbaImage, placement: &Placement, angle_deg: f32) {
    let (lw, lh) = (label.width() as f32, label.height() as f32);
    let (cx, cy) = (placement.x as f32, placement.y as f32);
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let reach = (lw * lw + lh * lh).sqrt() / 2.0;

    let x0 = (cx - reach).floor().max(0.0) as u32;
    let y0 = (cy - reach).floor().max(0.0) as u32;
    let x1 = ((cx + reach).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((cy + reach).ceil().max(0.0) as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            // Inverse rotation into label space.
            let lx = dx * cos + dy * sin + lw / 2.0;
            let ly = -dx * sin + dy * cos + lh / 2.0;
            if lx < 0.0 || ly < 0.0 || lx >= lw || ly >= lh {
                continue;
            }
            let src = *label.get_pixel(lx as u32, ly as u32);
            blend(canvas.get_pixel_mut(px, py), src);
        }
    }
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = f32::from(src[3]) / 255.0;
    if alpha <= 0.0 {
        return;
    }
    for i in 0..3 {
        let mixed = f32::from(src[i]) * alpha + f32::from(dst[i]) * (1.0 - alpha);
        dst[i] = mixed.round() as u8;
    }
    let dst_alpha = f32::from(dst[3]) / 255.0;
    dst[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}
