//! Star colors.
//!
//! A [`Palette`] is an ordered, immutable list of colors. Each star stores an
//! index into it, and the renderer walks the palette in order so that every
//! color is set on the surface at most once per frame.
//!
//! ```ignore
//! use starfield::palette::{Color, Palette};
//!
//! let palette = Palette::from_hex(&["#ffffff", "#00bfff", "#ff69b4"])?;
//! assert_eq!(palette.len(), 3);
//! ```

use std::str::FromStr;

use crate::error::{ColorParseError, PaletteError};

/// An sRGB color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Channels as sRGB-encoded floats in `0.0..=1.0`, alpha 1.
    pub fn to_srgb_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }

    /// Channels decoded to linear light, alpha 1.
    ///
    /// Use this when the render target performs the sRGB encoding itself.
    pub fn to_linear_f32(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_srgb_f32();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Parse `#rgb` or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').ok_or(ColorParseError::MissingHash)?;

        let mut nibbles = Vec::with_capacity(6);
        for c in digits.chars() {
            let n = c.to_digit(16).ok_or(ColorParseError::InvalidDigit(c))?;
            nibbles.push(n as u8);
        }

        match nibbles.as_slice() {
            &[r, g, b] => Ok(Color::rgb(r * 17, g * 17, b * 17)),
            &[r1, r0, g1, g0, b1, b0] => Ok(Color::rgb(
                (r1 << 4) | r0,
                (g1 << 4) | g0,
                (b1 << 4) | b0,
            )),
            other => Err(ColorParseError::InvalidLength(other.len())),
        }
    }
}

/// The pink and violet set the starfield ships with.
const DEFAULT_COLORS: [Color; 18] = [
    Color::from_hex(0xffb3f3),
    Color::from_hex(0xff69b4),
    Color::from_hex(0xc71585),
    Color::from_hex(0x8a2be2),
    Color::from_hex(0x7b68ee),
    Color::from_hex(0x00bfff),
    Color::from_hex(0xadd8e6),
    Color::from_hex(0xffffff),
    Color::from_hex(0xff80c0),
    Color::from_hex(0xff4da6),
    Color::from_hex(0xff3399),
    Color::from_hex(0xff99ff),
    Color::from_hex(0xffccff),
    Color::from_hex(0xff66ff),
    Color::from_hex(0xff99cc),
    Color::from_hex(0xffcce5),
    Color::from_hex(0xffb6e6),
    Color::from_hex(0xffd6f0),
];

/// Ordered, immutable sequence of star colors.
///
/// Holds between 1 and 256 entries so every index fits in a `u8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Largest palette whose indices fit in a `u8`.
    pub const MAX_COLORS: usize = 256;

    pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        if colors.len() > Self::MAX_COLORS {
            return Err(PaletteError::TooManyColors(colors.len()));
        }
        Ok(Self { colors })
    }

    /// Build a palette from CSS-style hex strings.
    pub fn from_hex<S: AsRef<str>>(entries: &[S]) -> Result<Self, PaletteError> {
        let colors = entries
            .iter()
            .enumerate()
            .map(|(index, s)| {
                s.as_ref()
                    .parse::<Color>()
                    .map_err(|source| PaletteError::InvalidColor { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(colors)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}
