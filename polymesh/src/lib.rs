//! Turns flat-colored SVG artwork into triangle meshes.
//!
//! A document is loaded with [`read_svg`] or [`load_svg`], which keeps only
//! straight-edged `<path>` elements of visible groups. Each path is then
//! triangulated by ear clipping ([`triangulate`]) and packed into render-ready
//! buffers by [`build_meshes`].

pub mod color;
pub mod error;
pub mod mesh;
pub mod parse;
pub mod path_data;
pub mod style;
pub mod transform;
pub mod triangulate;
pub mod types;

pub use color::Color;
pub use error::{DocumentError, MeshError, ParseError, PathError, TriangulationError};
pub use mesh::{build_meshes, MeshBundle, MeshOptions, PathMesh};
pub use parse::{load_svg, read_svg, Loaded, ParseOptions};
pub use path_data::{parse_path_data, parse_path_data_with};
pub use style::{NoneFill, Style};
pub use transform::Transform;
pub use triangulate::{
    triangulate, Orientation, OrientationStrategy, Triangle, TriangulateOptions, Triangulation,
};
pub use types::{Document, Group, Path, Vertex2D};
