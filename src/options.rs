//! Render options: everything the controls feed into sampling and rasterization.

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::ramp::CharacterRamp;
use crate::Result;

pub const MIN_DENSITY: u32 = 1;
pub const MAX_DENSITY: u32 = 10;
pub const MIN_CONTRAST: f32 = 1.0;
pub const MAX_CONTRAST: f32 = 5.0;
/// Height / width of a monospace glyph cell.
pub const DEFAULT_CELL_ASPECT: f32 = 2.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Glyphs from darkest to brightest, written as one string.
    pub ramp: CharacterRamp,
    /// Attach each cell's source RGB.
    pub color_enabled: bool,
    /// Attach each cell's source alpha as opacity.
    pub alpha_as_opacity: bool,
    /// Grid coarseness, 1 (coarse) to 10 (fine).
    pub density: u32,
    /// Gamma applied to brightness, 1 to 5.
    pub contrast: f32,
    pub background: Color,
    pub target_char_width: Option<u32>,
    pub target_char_height: Option<u32>,
    /// Glyph cell height / width, shared with the rasterizer so output is not stretched.
    pub cell_aspect: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ramp: CharacterRamp::dots(),
            color_enabled: true,
            alpha_as_opacity: true,
            density: MAX_DENSITY,
            contrast: MAX_CONTRAST,
            background: Color::BLACK,
            target_char_width: None,
            target_char_height: None,
            cell_aspect: DEFAULT_CELL_ASPECT,
        }
    }
}

impl RenderOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn with_ramp(mut self, ramp: CharacterRamp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color_enabled = enabled;
        self
    }

    pub fn with_alpha_as_opacity(mut self, enabled: bool) -> Self {
        self.alpha_as_opacity = enabled;
        self
    }

    pub fn with_density(mut self, density: u32) -> Self {
        self.density = density;
        self
    }

    pub fn with_contrast(mut self, contrast: f32) -> Self {
        self.contrast = contrast;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_target_width(mut self, cols: u32) -> Self {
        self.target_char_width = Some(cols);
        self
    }

    pub fn with_target_height(mut self, rows: u32) -> Self {
        self.target_char_height = Some(rows);
        self
    }

    pub fn with_cell_aspect(mut self, aspect: f32) -> Self {
        self.cell_aspect = aspect;
        self
    }

    pub fn clamped_density(&self) -> u32 {
        let density = self.density.clamp(MIN_DENSITY, MAX_DENSITY);
        if density != self.density {
            warn!("density {} out of range, using {}", self.density, density);
        }
        density
    }

    pub fn clamped_contrast(&self) -> f32 {
        if !self.contrast.is_finite() {
            warn!("contrast {} is not finite, using {}", self.contrast, MIN_CONTRAST);
            return MIN_CONTRAST;
        }
        let contrast = self.contrast.clamp(MIN_CONTRAST, MAX_CONTRAST);
        if contrast != self.contrast {
            warn!("contrast {} out of range, using {}", self.contrast, contrast);
        }
        contrast
    }

    pub fn effective_cell_aspect(&self) -> f32 {
        valid_cell_aspect(self.cell_aspect)
    }
}

pub(crate) fn valid_cell_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        warn!("cell aspect {aspect} is not usable, using {DEFAULT_CELL_ASPECT}");
        DEFAULT_CELL_ASPECT
    }
}
