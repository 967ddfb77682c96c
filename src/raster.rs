//! Rasterization: character grid → PNG.

use std::collections::HashMap;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use log::debug;

use crate::bitmap::Bitmap;
use crate::color::Color;
use crate::glyph::{GlyphMask, GlyphSource};
use crate::grid::{Cell, CellStyle, CharacterGrid};
use crate::options::{valid_cell_aspect, RenderOptions, DEFAULT_CELL_ASPECT};
use crate::sample::draw_viewport;
use crate::viewport::ViewportState;
use crate::{AsciiItError, Result};

/// Font size in layout pixels. Line height equals the font size.
pub const FONT_SIZE: f32 = 12.0;
pub const DEFAULT_PIXEL_SCALE: u32 = 4;
pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x22, 0x22, 0x22);
/// Resolution multiplier for [`export_view`].
pub const DEFAULT_VIEW_SCALE: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub struct RasterOptions {
    pub background: Color,
    /// Honor per-cell color and opacity. When off every glyph is plain white.
    pub color_enabled: bool,
    pub font_size: f32,
    /// Must match the aspect used for sampling or the output looks stretched.
    pub cell_aspect: f32,
    /// Integer supersampling factor applied to the whole layout.
    pub pixel_scale: u32,
    /// Source file name the output name derives from.
    pub file_name: Option<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            color_enabled: false,
            font_size: FONT_SIZE,
            cell_aspect: DEFAULT_CELL_ASPECT,
            pixel_scale: DEFAULT_PIXEL_SCALE,
            file_name: None,
        }
    }
}

impl RasterOptions {
    /// Background, color flag and cell aspect taken from the sampling options.
    pub fn from_render(options: &RenderOptions) -> Self {
        Self {
            background: options.background,
            color_enabled: options.color_enabled,
            cell_aspect: options.cell_aspect,
            ..Self::default()
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color_enabled = enabled;
        self
    }

    pub fn with_pixel_scale(mut self, scale: u32) -> Self {
        self.pixel_scale = scale;
        self
    }

    pub fn with_cell_aspect(mut self, aspect: f32) -> Self {
        self.cell_aspect = aspect;
        self
    }

    pub fn with_file_name(mut self, name: Option<&str>) -> Self {
        self.file_name = name.map(str::to_string);
        self
    }

    fn char_width(&self) -> f32 {
        self.font_size / valid_cell_aspect(self.cell_aspect)
    }
}

/// An encoded output image.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// `ascii-<stem>.png`, where the stem is `original` minus its last extension.
pub fn ascii_file_name(original: Option<&str>) -> String {
    let base = match original {
        Some(name) => match name.rfind('.') {
            Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
            _ => name,
        },
        None => "image",
    };
    format!("ascii-{base}.png")
}

fn fill_color(cell: &Cell, color_enabled: bool) -> Color {
    if !color_enabled {
        return Color::WHITE;
    }
    match cell.style {
        CellStyle::Plain => Color::WHITE,
        CellStyle::Color { rgb } => Color::from(rgb),
        CellStyle::Opacity { opacity } => Color::WHITE.with_opacity(opacity),
        CellStyle::ColorOpacity { rgb, opacity } => Color::from(rgb).with_opacity(opacity),
    }
}

fn blend_pixel(dst: &mut Rgba<u8>, src: Color, alpha: f32) {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return;
    }
    let [r, g, b, _] = src.to_array();
    for (channel, value) in [r, g, b].into_iter().enumerate() {
        let mixed = value as f32 * alpha + dst[channel] as f32 * dst_alpha * (1.0 - alpha);
        dst[channel] = (mixed / out_alpha).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_alpha * 255.0).round() as u8;
}

fn blend_glyph(canvas: &mut RgbaImage, x: i32, y: i32, mask: &GlyphMask, color: Color) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    let color_alpha = color.a as f32 / 255.0;

    for row in 0..mask.height {
        let py = y + row as i32;
        if py < 0 || py >= height {
            continue;
        }
        for col in 0..mask.width {
            let px = x + col as i32;
            if px < 0 || px >= width {
                continue;
            }
            let coverage = mask.coverage_at(col, row);
            if coverage == 0 {
                continue;
            }
            let alpha = coverage as f32 / 255.0 * color_alpha;
            blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), color, alpha);
        }
    }
}

/// Draws `grid` onto a background-filled canvas, one glyph per cell.
///
/// Cells sit at `col * char_width`, rows at `row * font_size`, both multiplied by
/// the pixel scale. A grid without a single visible glyph is rejected.
pub fn render_canvas(grid: &CharacterGrid, glyphs: &impl GlyphSource, options: &RasterOptions) -> Result<RgbaImage> {
    if grid.is_blank() {
        return Err(AsciiItError::EmptyInput("character grid has no visible rows"));
    }

    let scale = options.pixel_scale.max(1);
    let char_width = options.char_width();
    let line_height = options.font_size;
    let layout_w = ((grid.width() as f32 * char_width).floor() as u32).max(1);
    let layout_h = ((grid.height() as f32 * line_height).floor() as u32).max(1);

    let mut canvas = RgbaImage::from_pixel(layout_w * scale, layout_h * scale, Rgba(options.background.to_array()));
    debug!("rasterizing {}x{} grid onto {}x{} canvas", grid.width(), grid.height(), canvas.width(), canvas.height());

    let scale = scale as f32;
    let px = options.font_size * scale;
    let mut cache: HashMap<char, GlyphMask> = HashMap::new();

    for (row_index, row) in grid.rows().enumerate() {
        let y = (row_index as f32 * line_height * scale).round() as i32;
        for (col, cell) in row.iter().enumerate() {
            if cell.ch.is_whitespace() {
                continue;
            }
            let x = (col as f32 * char_width * scale).round() as i32;
            let mask = cache.entry(cell.ch).or_insert_with(|| glyphs.glyph(cell.ch, px));
            if mask.is_empty() {
                continue;
            }
            blend_glyph(&mut canvas, x + mask.left, y + mask.top, mask, fill_color(cell, options.color_enabled));
        }
    }

    Ok(canvas)
}

/// Losslessly encodes `canvas` as PNG.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ExtendedColorType::Rgba8)
        .map_err(|e| AsciiItError::Encode(e.to_string()))?;
    Ok(png)
}

/// Renders `grid` and encodes it as `ascii-<name>.png`.
pub fn rasterize(grid: &CharacterGrid, glyphs: &impl GlyphSource, options: &RasterOptions) -> Result<ExportedImage> {
    let canvas = render_canvas(grid, glyphs, options)?;
    let png = encode_png(&canvas)?;
    Ok(ExportedImage {
        file_name: ascii_file_name(options.file_name.as_deref()),
        width: canvas.width(),
        height: canvas.height(),
        png,
    })
}

/// Exports exactly what the viewport shows, over `background`, at `scale` times the
/// container size.
pub fn export_view(
    bitmap: &Bitmap,
    viewport: &ViewportState,
    background: Color,
    scale: f64,
    file_name: Option<&str>,
) -> Result<ExportedImage> {
    if viewport.container.is_empty() {
        return Err(AsciiItError::EmptyInput("viewport container has no area"));
    }
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { DEFAULT_VIEW_SCALE };

    let view = draw_viewport(bitmap, viewport, scale);
    let mut canvas = RgbaImage::from_pixel(view.width(), view.height(), Rgba(background.to_array()));
    for (dst, src) in canvas.pixels_mut().zip(view.pixels()) {
        let Rgba([r, g, b, a]) = *src;
        if a > 0 {
            blend_pixel(dst, Color::rgb(r, g, b), a as f32 / 255.0);
        }
    }

    let png = encode_png(&canvas)?;
    Ok(ExportedImage {
        file_name: ascii_file_name(file_name),
        width: canvas.width(),
        height: canvas.height(),
        png,
    })
}
