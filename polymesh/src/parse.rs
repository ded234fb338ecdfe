use std::path::Path as FsPath;

use nom::{
    bytes::complete::tag as literal, combinator::{all_consuming, opt}, number::complete::double,
    sequence::terminated, Finish, IResult,
};
use svg::node::element::tag::{self, Type};
use svg::node::Attributes;
use svg::parser::Event;
use tracing::{debug, debug_span, warn};

use crate::error::{DocumentError, ParseError, PathError};
use crate::path_data::parse_path_data_with;
use crate::style::{NoneFill, Style};
use crate::transform::{self, Transform};
use crate::types::{Document, Group, Path};

/// Container elements whose content is never drawn directly.
const NON_RENDERED: &[&str] = &[
    "defs",
    "clipPath",
    "mask",
    "marker",
    "pattern",
    "symbol",
    "linearGradient",
    "radialGradient",
    "metadata",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub none_fill: NoneFill,
}

/// A parsed document together with the paths that had to be skipped.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub document: Document,
    pub rejected: Vec<PathError>,
}

#[derive(Debug, Clone)]
enum Frame {
    Root,
    Group { index: usize, transform: Transform },
    /// Inactive group or non-rendered container; everything inside is dropped.
    Hidden,
    /// Group whose own attributes failed to parse; every path inside is rejected.
    Broken(ParseError),
    Other,
}

fn attr<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes.get(name).map(|value| {
        let value: &str = value;
        value
    })
}

/// Tags may carry an explicit `svg:` prefix.
fn local_name(name: &str) -> &str {
    name.strip_prefix("svg:").unwrap_or(name)
}

fn length(input: &str) -> IResult<&str, f64> {
    all_consuming(terminated(double, opt(literal("px"))))(input)
}

fn parse_length(value: &str) -> Option<f64> {
    length(value.trim())
        .finish()
        .ok()
        .map(|(_, v)| v)
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Width and height of a `viewBox="min-x min-y width height"`.
fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let mut numbers = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .skip(2)
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0));

    match (numbers.next(), numbers.next()) {
        (Some(Some(width)), Some(Some(height))) => Some((width, height)),
        _ => None,
    }
}

fn canvas_size(attributes: &Attributes) -> Result<(f64, f64), DocumentError> {
    let view_box = attr(attributes, "viewBox").and_then(parse_view_box);

    let width = attr(attributes, "width")
        .and_then(parse_length)
        .or_else(|| view_box.map(|vb| vb.0));
    let height = attr(attributes, "height")
        .and_then(parse_length)
        .or_else(|| view_box.map(|vb| vb.1));

    width.zip(height).ok_or(DocumentError::MissingDimensions)
}

/// Style of an element: the `style` attribute, falling back to the
/// `fill`, `fill-opacity` and `display` presentation attributes.
fn element_style(attributes: &Attributes) -> Result<Style, ParseError> {
    let presentation: Vec<String> = ["display", "fill", "fill-opacity"]
        .iter()
        .filter_map(|name| attr(attributes, name).map(|value| format!("{}:{}", name, value)))
        .collect();
    let presentation: Style = presentation.join(";").parse()?;

    let style: Style = match attr(attributes, "style") {
        Some(style) => style.parse()?,
        None => Style::new(),
    };

    Ok(style.or(presentation))
}

struct Loader<'o> {
    options: &'o ParseOptions,
    canvas: Option<(f64, f64)>,
    groups: Vec<Group>,
    stack: Vec<Frame>,
    rejected: Vec<PathError>,
    path_ordinal: usize,
}

impl<'o> Loader<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Loader {
            options,
            canvas: None,
            // Paths placed directly under <svg> land in this implicit group.
            groups: vec![Group::default()],
            stack: Vec::new(),
            rejected: Vec::new(),
            path_ordinal: 0,
        }
    }

    /// Innermost frame that decides where a new element belongs.
    fn context(&self) -> Frame {
        self.stack
            .iter()
            .rev()
            .find(|frame| !matches!(frame, Frame::Other))
            .cloned()
            .unwrap_or(Frame::Other)
    }

    fn handle(&mut self, event: Event<'_>) -> Result<(), DocumentError> {
        match event {
            Event::Error(err) => Err(DocumentError::Xml(err.to_string())),
            Event::Tag(name, kind, attributes) => {
                let name = local_name(name);
                match kind {
                    Type::End => {
                        self.stack.pop();
                    }
                    Type::Start => {
                        let frame = self.open(name, &attributes)?;
                        self.stack.push(frame);
                    }
                    Type::Empty => {
                        self.open(name, &attributes)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn open(&mut self, name: &str, attributes: &Attributes) -> Result<Frame, DocumentError> {
        if self.canvas.is_none() {
            if name != tag::SVG {
                return Ok(Frame::Other);
            }
            let (width, height) = canvas_size(attributes)?;
            debug!(width, height, "canvas");
            self.canvas = Some((width, height));
            return Ok(Frame::Root);
        }

        let context = self.context();
        if let Frame::Hidden = context {
            return Ok(Frame::Hidden);
        }

        Ok(match name {
            tag::Group => self.open_group(attributes, context),
            tag::Path => {
                self.add_path(attributes, context);
                Frame::Other
            }
            tag::SVG => Frame::Hidden,
            name if NON_RENDERED.contains(&name) => Frame::Hidden,
            _ => Frame::Other,
        })
    }

    fn open_group(&mut self, attributes: &Attributes, context: Frame) -> Frame {
        let id = attr(attributes, "id").map(String::from);

        let hidden = match element_style(attributes) {
            Ok(style) => style.is_hidden(),
            Err(err) => {
                warn!(?id, %err, "ignoring unparsable group style");
                false
            }
        };
        if hidden {
            debug!(?id, "skipping inactive group");
            return Frame::Hidden;
        }

        let parent = match context {
            Frame::Group { transform, .. } => transform,
            Frame::Broken(err) => return Frame::Broken(err),
            _ => Transform::IDENTITY,
        };

        match transform::parse_optional(attr(attributes, "transform")) {
            Ok(own) => {
                self.groups.push(Group {
                    id,
                    paths: Vec::new(),
                });
                Frame::Group {
                    index: self.groups.len() - 1,
                    transform: parent * own,
                }
            }
            Err(err) => {
                warn!(?id, %err, "rejecting group");
                Frame::Broken(err)
            }
        }
    }

    fn add_path(&mut self, attributes: &Attributes, context: Frame) {
        let ordinal = self.path_ordinal;
        self.path_ordinal += 1;

        let id = attr(attributes, "id")
            .map(String::from)
            .unwrap_or_else(|| format!("path{}", ordinal));

        let (index, parent) = match context {
            Frame::Group { index, transform } => (index, transform),
            Frame::Broken(source) => return self.reject(id, source),
            _ => (0, Transform::IDENTITY),
        };

        match self.build_path(&id, attributes, parent) {
            Ok(Some(path)) => {
                debug!(%id, vertices = path.vertices.len(), "parsed path");
                self.groups[index].paths.push(path);
            }
            Ok(None) => debug!(%id, "skipping hidden path"),
            Err(source) => self.reject(id, source),
        }
    }

    fn build_path(
        &self,
        id: &str,
        attributes: &Attributes,
        parent: Transform,
    ) -> Result<Option<Path>, ParseError> {
        let style = element_style(attributes)?;
        if style.is_hidden() {
            return Ok(None);
        }

        let transform = parent * transform::parse_optional(attr(attributes, "transform"))?;
        let height = self.canvas.map(|(_, height)| height).unwrap_or_default();
        let vertices = parse_path_data_with(attr(attributes, "d").unwrap_or(""), &transform, height)?;

        Ok(Some(Path {
            id: String::from(id),
            vertices,
            color: style.fill_color(self.options.none_fill),
            draw_order: 0,
        }))
    }

    fn reject(&mut self, id: String, source: ParseError) {
        warn!(%id, %source, "rejecting path");
        self.rejected.push(PathError { id, source });
    }

    fn finish(self) -> Result<Loaded, DocumentError> {
        let (width, height) = self.canvas.ok_or(DocumentError::MissingRoot)?;

        let mut groups = self.groups;
        if groups[0].is_empty() {
            groups.remove(0);
        }

        let mut draw_order = 0;
        for path in groups.iter_mut().flat_map(|group| group.paths.iter_mut()) {
            path.draw_order = draw_order;
            draw_order += 1;
        }

        Ok(Loaded {
            document: Document {
                width,
                height,
                groups,
            },
            rejected: self.rejected,
        })
    }
}

fn load_events<'l, I>(events: I, options: &ParseOptions) -> Result<Loaded, DocumentError>
where
    I: IntoIterator<Item = Event<'l>>,
{
    let mut loader = Loader::new(options);
    for event in events {
        loader.handle(event)?;
    }
    loader.finish()
}

/// Parses an SVG document held in memory.
pub fn read_svg(content: &str, options: &ParseOptions) -> Result<Loaded, DocumentError> {
    let _span = debug_span!("read_svg").entered();
    load_events(svg::read(content)?, options)
}

/// Reads and parses the SVG document at `path`.
pub fn load_svg<P: AsRef<FsPath>>(path: P, options: &ParseOptions) -> Result<Loaded, DocumentError> {
    let _span = debug_span!("load_svg", path = %path.as_ref().display()).entered();
    let mut content = String::new();
    let parser = svg::open(path, &mut content)?;
    load_events(parser, options)
}
