//! Image to character-art converter.
//!
//! The pipeline runs in one direction:
//! [`Bitmap`] + [`ViewportState`] → [`sample`] → [`CharacterGrid`] → [`rasterize`] → PNG.
//! Every stage is a pure function of its inputs.

pub mod bitmap;
pub mod color;
pub mod glyph;
pub mod grid;
pub mod options;
pub mod ramp;
pub mod raster;
pub mod sample;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use bitmap::Bitmap;
pub use color::Color;
pub use glyph::{FontGlyphs, GlyphMask, GlyphSource};
pub use grid::{Cell, CellStyle, CharacterGrid};
pub use options::RenderOptions;
pub use ramp::{CharacterRamp, RampPreset};
pub use raster::{ascii_file_name, encode_png, export_view, rasterize, render_canvas, ExportedImage, RasterOptions};
pub use sample::{grid_size, sample};
pub use viewport::{compute_visible_region, fill_container, Drag, Point, Size, ViewportState, VisibleRegion};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsciiItError {
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Invalid character ramp: {0}")]
    InvalidRamp(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AsciiItError>;

/// Samples `bitmap` through `viewport` and renders the grid straight to PNG,
/// using the background and color flag carried by `options`.
pub fn image_to_ascii(
    bitmap: &Bitmap,
    viewport: &ViewportState,
    options: &RenderOptions,
    glyphs: &impl GlyphSource,
    file_name: Option<&str>,
) -> Result<(CharacterGrid, ExportedImage)> {
    let grid = sample(bitmap, viewport, options)?;
    let raster = RasterOptions::from_render(options).with_file_name(file_name);
    let image = rasterize(&grid, glyphs, &raster)?;
    Ok((grid, image))
}
