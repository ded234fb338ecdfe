use std::ops::Mul;
use std::str::FromStr;

use nom::{
    branch::alt,
    character::complete::{alpha1, char, multispace0, multispace1},
    combinator::{all_consuming, opt, value},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, terminated, tuple},
    Finish, IResult,
};

use crate::error::ParseError;

/// A 2D affine transform with cairo-style fields:
/// `x' = xx * x + xy * y + x0`, `y' = yx * x + yy * y + y0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        xx: 1.0,
        yx: 0.0,
        xy: 0.0,
        yy: 1.0,
        x0: 0.0,
        y0: 0.0,
    };

    pub fn translate(dx: f64, dy: f64) -> Self {
        Transform {
            x0: dx,
            y0: dy,
            ..Transform::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform {
            xx: sx,
            yy: sy,
            ..Transform::IDENTITY
        }
    }

    /// SVG `matrix(a, b, c, d, e, f)`.
    pub fn matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform {
            xx: a,
            yx: b,
            xy: c,
            yy: d,
            x0: e,
            y0: f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.xx * x + self.xy * y + self.x0,
            self.yx * x + self.yy * y + self.y0,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// `a * b` applies `b` first, then `a`.
impl Mul for Transform {
    type Output = Transform;

    fn mul(self, b: Transform) -> Transform {
        let a = self;
        Transform {
            xx: a.xx * b.xx + a.xy * b.yx,
            yx: a.yx * b.xx + a.yy * b.yx,
            xy: a.xx * b.xy + a.xy * b.yy,
            yy: a.yx * b.xy + a.yy * b.yy,
            x0: a.xx * b.x0 + a.xy * b.y0 + a.x0,
            y0: a.yx * b.x0 + a.yy * b.y0 + a.y0,
        }
    }
}

fn comma_wsp(input: &str) -> IResult<&str, ()> {
    alt((
        value((), delimited(multispace0, char(','), multispace0)),
        value((), multispace1),
    ))(input)
}

fn css_function(input: &str) -> IResult<&str, (&str, Vec<f64>)> {
    let (rest, (name, _, _, _, args, _, _)) = tuple((
        alpha1,
        multispace0,
        char('('),
        multispace0,
        separated_list1(comma_wsp, double),
        multispace0,
        char(')'),
    ))(input)?;
    Ok((rest, (name, args)))
}

fn transform_list(input: &str) -> IResult<&str, Vec<(&str, Vec<f64>)>> {
    all_consuming(delimited(
        multispace0,
        many0(terminated(
            css_function,
            tuple((multispace0, opt(char(',')), multispace0)),
        )),
        multispace0,
    ))(input)
}

impl FromStr for Transform {
    type Err = ParseError;

    /// Parses a `transform` attribute. Supported functions are `translate`,
    /// `scale` and `matrix`; they compose left to right.
    fn from_str(s: &str) -> Result<Self, ParseError> {
        let err = || ParseError::MalformedTransform(String::from(s.trim()));

        let (_, functions) = transform_list(s).finish().map_err(|_| err())?;

        functions
            .into_iter()
            .try_fold(Transform::IDENTITY, |acc, (name, args)| {
                let next = match (name, args.as_slice()) {
                    ("translate", &[dx]) => Transform::translate(dx, 0.0),
                    ("translate", &[dx, dy]) => Transform::translate(dx, dy),
                    ("scale", &[s]) => Transform::scale(s, s),
                    ("scale", &[sx, sy]) => Transform::scale(sx, sy),
                    ("matrix", &[a, b, c, d, e, f]) => Transform::matrix(a, b, c, d, e, f),
                    _ => return Err(err()),
                };
                Ok(acc * next)
            })
    }
}

/// Parses an optional attribute value, treating absence as identity.
pub(crate) fn parse_optional(attr: Option<&str>) -> Result<Transform, ParseError> {
    match attr {
        Some(attr) => attr.parse(),
        None => Ok(Transform::IDENTITY),
    }
}
