//! Rasterizer: layout tree → white-background RGB bitmap.
//!
//! Text is drawn with the built-in 8×8 bitmap face stretched over the same
//! fixed-pitch cells the layout measured, so glyph boxes land where the layout
//! (and therefore the HTML preview) put them.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

use super::assets::ResolvedAssets;
use super::layout::{Align, DocumentLayout, NodeKind, Rect, Rgb, TextStyle, GLYPH_ADVANCE, WHITE};
use crate::export::ExportError;

/// Glyph height as a fraction of the font size.
const GLYPH_HEIGHT: f32 = 0.72;
const ITALIC_SLANT: f32 = 0.2;
const DASH: f32 = 6.0;
const DASH_GAP: f32 = 4.0;

/// Largest bitmap the exporter will allocate, about 128 MiB as RGBA.
pub const MAX_BITMAP_PIXELS: u64 = 32_000_000;

/// Bitmap dimensions for `layout` at `scale` device pixels per source pixel.
pub fn bitmap_size(layout: &DocumentLayout, scale: f32) -> (u32, u32) {
    (
        (layout.width * scale).round() as u32,
        (layout.height * scale).round() as u32,
    )
}

/// Paint `layout` at `scale`. Every image the layout references must be
/// present in `assets` and decodable, and the bitmap must fit in
/// [`MAX_BITMAP_PIXELS`].
pub fn rasterize(
    layout: &DocumentLayout,
    assets: &ResolvedAssets,
    scale: f32,
) -> Result<RgbImage, ExportError> {
    let (width, height) = bitmap_size(layout, scale);
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyCanvas);
    }
    if u64::from(width) * u64::from(height) > MAX_BITMAP_PIXELS {
        return Err(ExportError::TooLarge { width, height });
    }

    let mut canvas = Canvas {
        image: RgbaImage::from_pixel(width, height, rgba(WHITE)),
        scale,
    };

    for node in &layout.nodes {
        match &node.kind {
            NodeKind::Text { content, style } => canvas.text(node.rect, content, style),
            NodeKind::Rule { color, dashed } => canvas.rule(node.rect, *color, *dashed),
            NodeKind::Image { src, align, .. } => {
                let bytes = assets.get(src).ok_or_else(|| ExportError::Asset {
                    src: src.clone(),
                    reason: "not resolved before capture".to_string(),
                })?;
                let decoded = image::load_from_memory(bytes).map_err(|e| ExportError::Decode {
                    src: src.clone(),
                    reason: e.to_string(),
                })?;
                canvas.image(node.rect, *align, &decoded);
            }
        }
    }

    Ok(DynamicImage::ImageRgba8(canvas.image).to_rgb8())
}

fn rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 255])
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

struct Canvas {
    image: RgbaImage,
    scale: f32,
}

impl Canvas {
    fn fill(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
        let (w, h) = self.image.dimensions();
        let left = x0.floor().max(0.0) as u32;
        let top = y0.floor().max(0.0) as u32;
        let right = (x1.ceil().max(0.0) as u32).min(w);
        let bottom = (y1.ceil().max(0.0) as u32).min(h);
        for y in top..bottom {
            for x in left..right {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    fn text(&mut self, rect: Rect, content: &str, style: &TextStyle) {
        let s = self.scale;
        let color = rgba(style.color);
        let cell_w = style.size * GLYPH_ADVANCE * s;
        let glyph_h = style.size * GLYPH_HEIGHT * s;
        let top = rect.y * s + (style.line_height() * s - glyph_h) / 2.0;
        // Leave a column of space between neighbouring glyphs.
        let ink_w = cell_w * 7.0 / 8.0;
        let px = (s).max(1.0);

        for (i, ch) in content.chars().enumerate() {
            let cell_x = rect.x * s + i as f32 * cell_w;
            let rows = glyph(ch);
            for (gy, bits) in rows.iter().enumerate() {
                if *bits == 0 {
                    continue;
                }
                let y0 = top + gy as f32 * glyph_h / 8.0;
                let y1 = top + (gy + 1) as f32 * glyph_h / 8.0;
                let slant = if style.italic {
                    (glyph_h - (y0 - top)) * ITALIC_SLANT
                } else {
                    0.0
                };
                for gx in 0..8 {
                    if bits & (1 << gx) == 0 {
                        continue;
                    }
                    let x0 = cell_x + slant + gx as f32 * ink_w / 8.0;
                    let mut x1 = cell_x + slant + (gx + 1) as f32 * ink_w / 8.0;
                    if style.bold {
                        x1 += px;
                    }
                    self.fill(x0, y0, x1, y1, color);
                }
            }
        }

        if style.underline {
            let y = top + glyph_h + px;
            self.fill(rect.x * s, y, rect.right() * s, y + px, color);
        }
    }

    fn rule(&mut self, rect: Rect, color: Rgb, dashed: bool) {
        let s = self.scale;
        let color = rgba(color);
        let (y0, y1) = (rect.y * s, rect.bottom() * s);
        if !dashed {
            self.fill(rect.x * s, y0, rect.right() * s, y1, color);
            return;
        }
        let mut x = rect.x * s;
        let end = rect.right() * s;
        while x < end {
            self.fill(x, y0, (x + DASH * s).min(end), y1, color);
            x += (DASH + DASH_GAP) * s;
        }
    }

    /// Contain-fit `img` in `rect`, centred vertically, pinned horizontally by `align`.
    fn image(&mut self, rect: Rect, align: Align, img: &DynamicImage) {
        let s = self.scale;
        let (box_w, box_h) = (rect.width * s, rect.height * s);
        let (iw, ih) = (img.width().max(1) as f32, img.height().max(1) as f32);
        let fit = (box_w / iw).min(box_h / ih);
        let w = (iw * fit).round().max(1.0) as u32;
        let h = (ih * fit).round().max(1.0) as u32;

        let x = match align {
            Align::Left => rect.x * s,
            Align::Center => rect.x * s + (box_w - w as f32) / 2.0,
            Align::Right => rect.right() * s - w as f32,
        };
        let y = rect.y * s + (box_h - h as f32) / 2.0;

        let resized = imageops::resize(&img.to_rgba8(), w, h, FilterType::Triangle);
        imageops::overlay(&mut self.image, &resized, x.round() as i64, y.round() as i64);
    }
}
