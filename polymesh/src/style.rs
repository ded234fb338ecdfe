use std::str::FromStr;

use crate::color::Color;
use crate::error::ParseError;

/// How a `fill:none` declaration resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoneFill {
    /// Opaque black, matching `Color::NONE`.
    Black,
    Transparent,
}

impl Default for NoneFill {
    fn default() -> Self {
        NoneFill::Black
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Color(Color),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayVal {
    Inline,
    None,
}

/// Only `none` hides an element; every other keyword (`inline`, `block`,
/// `inherit`, ...) leaves it rendered.
impl From<&str> for DisplayVal {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("none") {
            DisplayVal::None
        } else {
            DisplayVal::Inline
        }
    }
}

/// The subset of an inline `style` attribute that affects filled polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub display: Option<DisplayVal>,
    pub fill: Option<Paint>,
    pub fill_opacity: Option<f32>,
}

impl Style {
    pub fn new() -> Self {
        Style::default()
    }

    /// Fills every property left unset in `self` from `fallback`.
    pub fn or(self, fallback: Style) -> Style {
        Style {
            display: self.display.or(fallback.display),
            fill: self.fill.or(fallback.fill),
            fill_opacity: self.fill_opacity.or(fallback.fill_opacity),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.display == Some(DisplayVal::None)
    }

    /// Resolves `fill` and `fill-opacity` into a single color. No `fill`
    /// means opaque black.
    pub fn fill_color(&self, none_fill: NoneFill) -> Color {
        let base = match self.fill {
            Some(Paint::Color(color)) => color,
            Some(Paint::None) => match none_fill {
                NoneFill::Black => Color::NONE,
                NoneFill::Transparent => Color::TRANSPARENT,
            },
            None => Color::BLACK,
        };

        match self.fill_opacity {
            Some(alpha) => base.with_alpha(alpha),
            None => base,
        }
    }
}

fn parse_opacity(val: &str, decl: &str) -> Result<f32, ParseError> {
    let opacity: f32 = val
        .parse()
        .map_err(|_| ParseError::MalformedStyle(String::from(decl)))?;
    if !opacity.is_finite() {
        return Err(ParseError::MalformedStyle(String::from(decl)));
    }
    Ok(opacity.max(0.0).min(1.0))
}

impl FromStr for Style {
    type Err = ParseError;

    /// Parses `key:value` declarations separated by `;`. Unknown keys are
    /// skipped, later declarations override earlier ones.
    fn from_str(s: &str) -> Result<Self, ParseError> {
        let decl_err = |decl: &str| ParseError::MalformedStyle(String::from(decl.trim()));

        let mut result = Style::new();

        for decl in s.split(';').filter(|decl| !decl.trim().is_empty()) {
            let (prop_name, val) = decl.split_once(':').ok_or_else(|| decl_err(decl))?;
            let val = val.trim();

            match prop_name.trim() {
                "display" => result.display = Some(DisplayVal::from(val)),
                "fill" if val.eq_ignore_ascii_case("none") => result.fill = Some(Paint::None),
                "fill" => result.fill = Some(Paint::Color(val.parse()?)),
                "fill-opacity" => result.fill_opacity = Some(parse_opacity(val, decl.trim())?),
                _ => (),
            };
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_opacity() {
        let style: Style = "fill:#FF0000;fill-opacity:0.5".parse().unwrap();
        let color = style.fill_color(NoneFill::default());
        assert_eq!((color.r, color.g, color.b), (255, 0, 0));
        assert_eq!(color.alpha, 0.5);
    }

    #[test]
    fn test_declaration_order_is_irrelevant() {
        let a: Style = "fill:#FF0000;fill-opacity:0.5".parse().unwrap();
        let b: Style = "fill-opacity:0.5;fill:#FF0000".parse().unwrap();
        assert_eq!(a.fill_color(NoneFill::Black), b.fill_color(NoneFill::Black));
    }

    #[test]
    fn test_last_opacity_wins() {
        let style: Style = "fill-opacity:0.2;fill:#00FF00;fill-opacity:0.7".parse().unwrap();
        assert_eq!(style.fill_color(NoneFill::Black).alpha, 0.7);
    }

    #[test]
    fn test_default_is_opaque_black() {
        let style: Style = "stroke:#FFFFFF;stroke-width:2".parse().unwrap();
        assert_eq!(style.fill_color(NoneFill::Black), Color::rgb(0, 0, 0));
        assert_eq!("".parse::<Style>().unwrap(), Style::new());
    }

    #[test]
    fn test_fill_none() {
        let style: Style = "fill:none".parse().unwrap();
        assert_eq!(style.fill_color(NoneFill::Black), Color::NONE);
        assert_eq!(style.fill_color(NoneFill::Transparent), Color::TRANSPARENT);
    }

    #[test]
    fn test_whitespace_and_trailing_separator() {
        let style: Style = " fill : #0000FF ; fill-opacity : 1 ;".parse().unwrap();
        assert_eq!(style.fill_color(NoneFill::Black), Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_opacity_is_clamped() {
        let style: Style = "fill-opacity:1.5".parse().unwrap();
        assert_eq!(style.fill_opacity, Some(1.0));
    }

    #[test]
    fn test_or_prefers_self() {
        let style: Style = "fill:#FF0000".parse().unwrap();
        let fallback: Style = "fill:#00FF00;fill-opacity:0.25;display:none".parse().unwrap();
        let merged = style.or(fallback);
        assert_eq!(merged.fill, Some(Paint::Color(Color::rgb(255, 0, 0))));
        assert_eq!(merged.fill_opacity, Some(0.25));
        assert!(merged.is_hidden());
    }

    #[test]
    fn test_display() {
        let hidden: Style = "display:none".parse().unwrap();
        assert!(hidden.is_hidden());
        let shown: Style = "display:inline;fill:#000000".parse().unwrap();
        assert!(!shown.is_hidden());
        assert!(!Style::new().is_hidden());
    }

    #[test]
    fn test_display_keywords() {
        assert_eq!(DisplayVal::from("None"), DisplayVal::None);
        for keyword in &["inline", "block", "inherit", "contents", ""] {
            assert_eq!(DisplayVal::from(*keyword), DisplayVal::Inline);
        }
        let style: Style = "display:inherit".parse().unwrap();
        assert!(!style.is_hidden());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            "fill".parse::<Style>(),
            Err(ParseError::MalformedStyle(String::from("fill")))
        );
        assert_eq!(
            "fill-opacity:half".parse::<Style>(),
            Err(ParseError::MalformedStyle(String::from("fill-opacity:half")))
        );
        assert_eq!(
            "fill:#12".parse::<Style>(),
            Err(ParseError::MalformedColor(String::from("#12")))
        );
    }
}
