//! Parsing of straight-segment path data (`d` attributes).
//!
//! Only `M`, `L`, `m`, `l`, `Z` and `z` are understood. Curve, arc and
//! horizontal/vertical commands are rejected instead of being approximated.

use nom::{
    character::complete::char, combinator::all_consuming, number::complete::double,
    sequence::separated_pair, Finish, IResult,
};
use tracing::warn;

use crate::error::ParseError;
use crate::transform::Transform;
use crate::types::Vertex2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    MoveTo(Position),
    LineTo(Position),
    Close,
    Coordinate(f64, f64),
}

fn coordinate_pair(input: &str) -> IResult<&str, (f64, f64)> {
    all_consuming(separated_pair(double, char(','), double))(input)
}

fn parse_token(token: &str) -> Result<Token, ParseError> {
    let mut chars = token.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_alphabetic() {
            return match letter {
                'M' => Ok(Token::MoveTo(Position::Absolute)),
                'm' => Ok(Token::MoveTo(Position::Relative)),
                'L' => Ok(Token::LineTo(Position::Absolute)),
                'l' => Ok(Token::LineTo(Position::Relative)),
                'Z' | 'z' => Ok(Token::Close),
                _ => Err(ParseError::UnsupportedCommand(String::from(token))),
            };
        }
    }

    coordinate_pair(token)
        .finish()
        .map(|(_, (x, y))| Token::Coordinate(x, y))
        .map_err(|_| ParseError::MalformedCoordinate(String::from(token)))
}

/// Resolves path data into absolute points in the document's own y-down space.
///
/// Relative pairs are offsets from the previous point; the pen starts at the
/// origin. The positioning mode of the last command letter applies to every
/// following bare pair.
pub fn parse_points(data: &str) -> Result<Vec<(f64, f64)>, ParseError> {
    let mut points = Vec::new();
    let mut position = Position::Relative;
    let mut pen = (0.0, 0.0);
    let mut closed = false;

    for token in data.split_whitespace() {
        match parse_token(token)? {
            Token::MoveTo(pos) | Token::LineTo(pos) => position = pos,
            Token::Close => closed = true,
            Token::Coordinate(x, y) => {
                if closed {
                    warn!(data, "path data continues after a close command, merging into one contour");
                    closed = false;
                }

                pen = match position {
                    Position::Absolute => (x, y),
                    Position::Relative => (pen.0 + x, pen.1 + y),
                };
                points.push(pen);
            }
        }
    }

    Ok(points)
}

/// Parses path data into y-up vertices for a canvas of the given `height`.
///
/// `y' = height - y` for absolute pairs; a relative pair `(dx, dy)` moves the
/// previous vertex by `(dx, -dy)`. The implicit starting vertex is `(0, height)`.
pub fn parse_path_data(data: &str, height: f64) -> Result<Vec<Vertex2D>, ParseError> {
    parse_path_data_with(data, &Transform::IDENTITY, height)
}

/// Like [`parse_path_data`], with `transform` applied to each point before the
/// vertical flip.
pub fn parse_path_data_with(
    data: &str,
    transform: &Transform,
    height: f64,
) -> Result<Vec<Vertex2D>, ParseError> {
    let points = parse_points(data)?;

    Ok(points
        .into_iter()
        .map(|(x, y)| {
            let (x, y) = transform.apply(x, y);
            Vertex2D::new(x, height - y)
        })
        .collect())
}
