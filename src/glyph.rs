//! Glyph coverage masks for the rasterizer.

use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::{AsciiItError, Result};

/// 8-bit coverage for one glyph, offset from the top-left corner of its cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphMask {
    pub left: i32,
    pub top: i32,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

impl GlyphMask {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn coverage_at(&self, x: usize, y: usize) -> u8 {
        self.coverage[y * self.width + x]
    }
}

/// Anything that can turn a character into a coverage mask at a pixel size.
///
/// Masks are placed with a top baseline: offset `(0, 0)` is the top-left corner of
/// the glyph's cell.
pub trait GlyphSource {
    fn glyph(&self, ch: char, px: f32) -> GlyphMask;
}

/// Glyphs rasterized from a TrueType/OpenType font.
pub struct FontGlyphs {
    font: Font,
}

impl FontGlyphs {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| AsciiItError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Measured cell aspect (line height / advance width) for a line height of `px`.
    pub fn cell_aspect(&self, px: f32) -> f32 {
        let advance = self.font.metrics('M', px).advance_width;
        if advance > 0.0 { px / advance } else { crate::options::DEFAULT_CELL_ASPECT }
    }
}

impl GlyphSource for FontGlyphs {
    fn glyph(&self, ch: char, px: f32) -> GlyphMask {
        let (metrics, bitmap) = self.font.rasterize(ch, px);
        if metrics.width == 0 || metrics.height == 0 {
            return GlyphMask::default();
        }

        // Baseline sits one ascent below the cell top
        let ascent = self.font.horizontal_line_metrics(px).map_or(px * 0.8, |m| m.ascent);
        let top = (ascent - (metrics.height as f32 + metrics.ymin as f32)).round() as i32;

        GlyphMask { left: metrics.xmin, top, width: metrics.width, height: metrics.height, coverage: bitmap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_MONO_FONTS: &[&str] = &[
        "assets/DejaVuSansMono.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
        "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    ];

    fn system_font() -> Option<FontGlyphs> {
        SYSTEM_MONO_FONTS.iter().find_map(|path| FontGlyphs::load(path).ok())
    }

    #[test]
    fn garbage_is_not_a_font() {
        let err = FontGlyphs::from_bytes(b"not a font".to_vec()).err().unwrap();
        assert!(matches!(err, AsciiItError::Font(_)));
    }

    #[test]
    fn missing_font_file_is_io() {
        let err = FontGlyphs::load("/nonexistent/font.ttf").err().unwrap();
        assert!(matches!(err, AsciiItError::Io(_)));
    }

    #[test]
    fn real_font_masks_sit_inside_the_cell() {
        let Some(font) = system_font() else {
            return;
        };

        assert!(font.glyph(' ', 48.0).is_empty());

        let at = font.glyph('@', 48.0);
        assert!(!at.is_empty());
        assert!(at.top >= 0 && at.top < 48, "{}", at.top);
        assert!(at.coverage.iter().any(|&c| c > 0));

        let aspect = font.cell_aspect(48.0);
        assert!(aspect > 1.2 && aspect < 2.5, "{aspect}");
    }
}
