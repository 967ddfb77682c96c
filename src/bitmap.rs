//! Decoded source images.

use std::path::Path;

use image::{DynamicImage, RgbaImage};

use crate::viewport::Size;
use crate::{AsciiItError, Result};

/// An immutable RGBA8 image. All sampling reads from this; nothing writes to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    /// Decodes encoded image bytes (PNG, JPEG, GIF, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Self::from_dynamic(image)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path)?;
        Self::from_dynamic(image)
    }

    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::from_image(image.into_rgba8())
    }

    pub fn from_image(pixels: RgbaImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(AsciiItError::EmptyInput("bitmap has no pixels"));
        }
        Ok(Self { pixels })
    }

    /// Wraps a raw RGBA buffer, e.g. one read back from a browser canvas.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let pixels = RgbaImage::from_raw(width, height, data).ok_or_else(|| {
            AsciiItError::MalformedBuffer(format!("{len} bytes is not a {width}x{height} RGBA buffer"))
        })?;
        Self::from_image(pixels)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Natural size, as consumed by the viewport mapper.
    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
