use std::fmt;
use std::str::FromStr;

use nom::{
    bytes::complete::{tag, take_while_m_n},
    combinator::{all_consuming, map_res},
    sequence::tuple,
    Finish, IResult,
};

use crate::error::ParseError;

/// An 8-bit RGB color with a separate 0..=1 alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, alpha: 0.0 };

    /// What the literal `none` decodes to.
    ///
    /// This is opaque black rather than "no fill": existing assets were
    /// produced with that mapping. `ParseOptions::none_fill` lets callers opt
    /// into `TRANSPARENT` instead.
    pub const NONE: Color = Color::BLACK;

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, alpha: 1.0 }
    }

    pub fn with_alpha(self, alpha: f32) -> Color {
        Color { alpha, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    /// Normalized `[r, g, b, a]`, the layout vertex colors are uploaded in.
    pub fn to_rgba(&self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            self.alpha,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

fn hex_channel(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16)
    })(input)
}

fn hex_color(input: &str) -> IResult<&str, Color> {
    let (rest, (_, r, g, b)) =
        all_consuming(tuple((tag("#"), hex_channel, hex_channel, hex_channel)))(input)?;
    Ok((rest, Color::rgb(r, g, b)))
}

impl FromStr for Color {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(Color::NONE);
        }

        hex_color(s)
            .finish()
            .map(|(_, color)| color)
            .map_err(|_| ParseError::MalformedColor(String::from(s)))
    }
}

/// Uppercase `#RRGGBB`. Alpha is not encoded.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
