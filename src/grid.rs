//! Character grids produced by sampling and consumed by rasterization.

use std::fmt;

use serde::Serialize;

/// Per-cell styling carried from sampling to rasterization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellStyle {
    #[default]
    Plain,
    Color { rgb: [u8; 3] },
    Opacity { opacity: f32 },
    ColorOpacity { rgb: [u8; 3], opacity: f32 },
}

impl CellStyle {
    pub fn new(color: Option<[u8; 3]>, opacity: Option<f32>) -> Self {
        match (color, opacity) {
            (None, None) => CellStyle::Plain,
            (Some(rgb), None) => CellStyle::Color { rgb },
            (None, Some(opacity)) => CellStyle::Opacity { opacity },
            (Some(rgb), Some(opacity)) => CellStyle::ColorOpacity { rgb, opacity },
        }
    }

    pub fn color(&self) -> Option<[u8; 3]> {
        match *self {
            CellStyle::Color { rgb } | CellStyle::ColorOpacity { rgb, .. } => Some(rgb),
            _ => None,
        }
    }

    pub fn opacity(&self) -> Option<f32> {
        match *self {
            CellStyle::Opacity { opacity } | CellStyle::ColorOpacity { opacity, .. } => Some(opacity),
            _ => None,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, CellStyle::Plain)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Cell {
    pub fn plain(ch: char) -> Self {
        Self { ch, style: CellStyle::Plain }
    }
}

/// Row-major grid of cells with a fixed row length.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CharacterGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl CharacterGrid {
    pub fn new(width: usize, height: usize, cells: Vec<Cell>) -> Self {
        assert_eq!(width * height, cells.len(), "grid cells must fill width x height");
        Self { width, height, cells }
    }

    /// Unstyled grid from text lines. Short lines are padded with spaces so every
    /// row has the length of the longest one.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<Vec<char>> = text.lines().map(|line| line.chars().collect()).collect();
        let width = lines.iter().map(Vec::len).max().unwrap_or(0);

        let mut cells = Vec::with_capacity(width * lines.len());
        for line in &lines {
            cells.extend(line.iter().copied().map(Cell::plain));
            cells.extend(std::iter::repeat(Cell::plain(' ')).take(width - line.len()));
        }

        Self::new(width, if width == 0 { 0 } else { lines.len() }, cells)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        if col >= self.width {
            return None;
        }
        self.cells.get(row * self.width + col)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width.max(1))
    }

    /// True when every row is whitespace only (or there are no rows at all).
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.ch.is_whitespace())
    }

    /// Glyphs only, each row terminated by a newline. This is the copyable text.
    pub fn plain(&self) -> String {
        let mut text = String::with_capacity(self.cells.len() + self.height);
        for row in self.rows() {
            text.extend(row.iter().map(|cell| cell.ch));
            text.push('\n');
        }
        text
    }
}

impl fmt::Display for CharacterGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn style_variants_follow_their_parts() {
        assert_eq!(CellStyle::new(None, None), CellStyle::Plain);
        assert_eq!(CellStyle::new(Some([1, 2, 3]), None).color(), Some([1, 2, 3]));
        assert_eq!(CellStyle::new(None, Some(0.5)).opacity(), Some(0.5));
        assert_eq!(CellStyle::new(None, Some(0.5)).color(), None);

        let both = CellStyle::new(Some([9, 9, 9]), Some(0.25));
        assert_eq!(both, CellStyle::ColorOpacity { rgb: [9, 9, 9], opacity: 0.25 });
        assert!(!both.is_plain());
    }

    #[test]
    fn plain_text_has_one_line_per_row() {
        let grid = CharacterGrid::new(3, 2, "ab.cd#".chars().map(Cell::plain).collect());
        assert_eq!(grid.plain(), "ab.\ncd#\n");
        assert_eq!(grid.cell(2, 1).map(|c| c.ch), Some('#'));
        assert_eq!(grid.cell(3, 0), None);
    }

    #[test]
    fn from_text_pads_short_lines() {
        let grid = CharacterGrid::from_text("@@@\n@\n");
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert_eq!(grid.plain(), "@@@\n@  \n");
        assert!(grid.rows().all(|row| row.len() == 3));
    }

    #[test]
    fn blank_detection() {
        assert!(CharacterGrid::from_text("").is_blank());
        assert!(CharacterGrid::from_text("   \n \n").is_blank());
        assert!(!CharacterGrid::from_text("   \n .\n").is_blank());
        assert_eq!(CharacterGrid::from_text("").height(), 0);
    }

    #[test]
    fn styles_serialize_tagged() {
        let json = serde_json::to_string(&CellStyle::Color { rgb: [1, 2, 3] }).unwrap();
        assert_eq!(json, r#"{"kind":"color","rgb":[1,2,3]}"#);
    }
}
