use std::{fmt, str::FromStr};

use crate::foundation::error::{AlphaFillError, AlphaFillResult};

/// Largest value a working sample can hold.
pub const SAMPLE_MAX: u16 = u16::MAX;

/// Alpha value of a fully transparent pixel.
pub const SAMPLE_TRANSPARENT: u16 = 0;

/// Maximum number of color channels the engine accumulates per pixel.
pub const MAX_COLOR_CHANNELS: usize = 3;

/// A pixel coordinate inside `[0, width) x [0, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    // Field order gives row-major ordering when sorted.
    /// Row.
    pub y: u32,
    /// Column.
    pub x: u32,
}

impl Position {
    /// Position at column `x`, row `y`.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Translate by a signed offset. The result may lie outside the image.
    pub fn offset(self, dx: i32, dy: i32) -> (i64, i64) {
        (i64::from(self.x) + i64::from(dx), i64::from(self.y) + i64::from(dy))
    }
}

/// Opaque RGB color used by the solid fill, in the 16-bit working domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FillColor {
    /// Red, 16-bit.
    pub r: u16,
    /// Green, 16-bit.
    pub g: u16,
    /// Blue, 16-bit.
    pub b: u16,
}

impl FillColor {
    /// `#000000`, the default fill.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Color from 16-bit components.
    pub fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    /// Widen 8-bit components (`0xAB -> 0xABAB`).
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        fn widen(c: u8) -> u16 {
            u16::from(c) * 257
        }
        Self::new(widen(r), widen(g), widen(b))
    }

    /// BT.709 luma, used when the target image only has a gray channel.
    pub fn luma(self) -> u16 {
        let y = 2126 * u32::from(self.r) + 7152 * u32::from(self.g) + 722 * u32::from(self.b);
        ((y + 5000) / 10000) as u16
    }

    fn is_8bit(self) -> bool {
        [self.r, self.g, self.b].iter().all(|&c| c % 257 == 0)
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_8bit() {
            write!(
                f,
                "#{:02x}{:02x}{:02x}",
                self.r / 257,
                self.g / 257,
                self.b / 257
            )
        } else {
            write!(f, "#{:04x}{:04x}{:04x}", self.r, self.g, self.b)
        }
    }
}

impl FromStr for FillColor {
    type Err = AlphaFillError;

    fn from_str(s: &str) -> AlphaFillResult<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AlphaFillError::validation(format!(
                "invalid hex digits in color \"{s}\""
            )));
        }

        let digits = |range: std::ops::Range<usize>| -> AlphaFillResult<u16> {
            let part = hex
                .get(range)
                .ok_or_else(|| AlphaFillError::validation(format!("invalid color \"{s}\"")))?;
            u16::from_str_radix(part, 16)
                .map_err(|_| AlphaFillError::validation(format!("invalid hex digits \"{part}\"")))
        };

        match hex.len() {
            3 => {
                // #rgb expands each nibble: 0xA -> 0xAAAA.
                let r = digits(0..1)?;
                let g = digits(1..2)?;
                let b = digits(2..3)?;
                Ok(Self::new(r * 0x1111, g * 0x1111, b * 0x1111))
            }
            6 => Ok(Self::new(
                digits(0..2)? * 257,
                digits(2..4)? * 257,
                digits(4..6)? * 257,
            )),
            12 => Ok(Self::new(digits(0..4)?, digits(4..8)?, digits(8..12)?)),
            _ => Err(AlphaFillError::validation(
                "fill color must be #rgb, #rrggbb or #rrrrggggbbbb (case-insensitive)",
            )),
        }
    }
}

impl TryFrom<String> for FillColor {
    type Error = AlphaFillError;

    fn try_from(value: String) -> AlphaFillResult<Self> {
        value.parse()
    }
}

impl From<FillColor> for String {
    fn from(value: FillColor) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
