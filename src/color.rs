//! Background and fill colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AsciiItError;

/// 8-bit RGBA color. Parses from and serializes to CSS-style strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `rgb` with a fractional opacity, as used for glyph fills.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * self.a as f32).round() as u8;
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Color::rgb(r, g, b)
    }
}

fn invalid(input: &str) -> AsciiItError {
    AsciiItError::InvalidColor(input.to_string())
}

fn parse_hex(input: &str, digits: &str) -> Result<Color, AsciiItError> {
    let nibble = |c: char| c.to_digit(16).map(|d| d as u8).ok_or_else(|| invalid(input));
    let byte = |i: usize| -> Result<u8, AsciiItError> {
        u8::from_str_radix(digits.get(i..i + 2).ok_or_else(|| invalid(input))?, 16)
            .map_err(|_| invalid(input))
    };

    match digits.len() {
        3 => {
            let mut channels = [0u8; 3];
            for (slot, c) in channels.iter_mut().zip(digits.chars()) {
                *slot = nibble(c)? * 17;
            }
            Ok(Color::from(channels))
        },
        6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => Err(invalid(input)),
    }
}

fn parse_function(input: &str, args: &str, with_alpha: bool) -> Result<Color, AsciiItError> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != if with_alpha { 4 } else { 3 } {
        return Err(invalid(input));
    }

    let channel = |s: &str| s.parse::<u8>().map_err(|_| invalid(input));
    let mut color = Color::rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
    if with_alpha {
        let alpha: f32 = parts[3].parse().map_err(|_| invalid(input))?;
        color = color.with_opacity(alpha);
    }
    Ok(color)
}

impl FromStr for Color {
    type Err = AsciiItError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        let lower = s.to_ascii_lowercase();

        if let Some(digits) = s.strip_prefix('#') {
            parse_hex(input, digits)
        } else if let Some(args) = lower.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
            parse_function(input, args, true)
        } else if let Some(args) = lower.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            parse_function(input, args, false)
        } else {
            match lower.as_str() {
                "black" => Ok(Color::BLACK),
                "white" => Ok(Color::WHITE),
                _ => Err(invalid(input)),
            }
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = AsciiItError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
