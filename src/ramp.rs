//! Character ramps: glyphs ordered from emptiest to fullest.

use serde::{Deserialize, Serialize};

use crate::{AsciiItError, Result};

/// Ordered glyphs, darkest first. Always at least two entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterRamp {
    chars: Vec<char>,
}

impl CharacterRamp {
    pub fn new(glyphs: impl Into<String>) -> Result<Self> {
        let chars: Vec<char> = glyphs.into().chars().collect();
        if chars.len() < 2 {
            return Err(AsciiItError::InvalidRamp(format!(
                "need at least two glyphs, got {}",
                chars.len()
            )));
        }
        Ok(Self { chars })
    }

    fn from_chars(chars: Vec<char>) -> Self {
        debug_assert!(chars.len() >= 2);
        Self { chars }
    }

    pub fn dots() -> Self {
        Self::from_chars(" .:*-=+%#@".chars().collect())
    }

    /// Space followed by the braille cells U+2801..=U+281F.
    pub fn braille() -> Self {
        let chars = std::iter::once(' ').chain((0x2801..=0x281F).filter_map(char::from_u32)).collect();
        Self::from_chars(chars)
    }

    pub fn blocks() -> Self {
        Self::from_chars(" ░▒▓█".chars().collect())
    }

    /// Resolves the labels shown in the character dropdown. Unknown labels get blocks.
    pub fn from_label(label: &str) -> Self {
        match label {
            ".:*-=+%#@" => Self::dots(),
            "⠁⠂⠃⠄⠅⠆⠇" => Self::braille(),
            _ => Self::blocks(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Floor-maps an intensity in `[0, 1]` onto the ramp. Out-of-range input is clamped.
    pub fn index_for(&self, intensity: f64) -> usize {
        let levels = (self.chars.len() - 1) as f64;
        let intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        ((intensity * levels).floor() as usize).min(self.chars.len() - 1)
    }

    pub fn char_at(&self, index: usize) -> char {
        self.chars[index.min(self.chars.len() - 1)]
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }
}

impl Default for CharacterRamp {
    fn default() -> Self {
        Self::dots()
    }
}

impl TryFrom<String> for CharacterRamp {
    type Error = AsciiItError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CharacterRamp> for String {
    fn from(ramp: CharacterRamp) -> Self {
        ramp.chars.into_iter().collect()
    }
}

/// Named ramps for configs and the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampPreset {
    Dots,
    Braille,
    Blocks,
}

impl RampPreset {
    pub fn ramp(self) -> CharacterRamp {
        match self {
            RampPreset::Dots => CharacterRamp::dots(),
            RampPreset::Braille => CharacterRamp::braille(),
            RampPreset::Blocks => CharacterRamp::blocks(),
        }
    }
}
