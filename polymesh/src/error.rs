use thiserror::Error;

use crate::triangulate::Triangulation;

/// Errors raised while turning the attributes of a single element into model data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("malformed color `{0}`")]
    MalformedColor(String),

    #[error("unsupported path command `{0}`")]
    UnsupportedCommand(String),

    #[error("malformed coordinate `{0}`")]
    MalformedCoordinate(String),

    #[error("malformed style declaration `{0}`")]
    MalformedStyle(String),

    #[error("malformed transform `{0}`")]
    MalformedTransform(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriangulationError {
    #[error("cannot triangulate {count} vertices, at least 3 are required")]
    InsufficientVertices { count: usize },

    /// No ear was left while more than three vertices remained. `partial` holds
    /// every triangle clipped before the stall; the leftover vertices are not
    /// closed into a final triangle.
    #[error("triangulation stalled with {remaining} vertices left")]
    TriangulationStalled {
        remaining: usize,
        partial: Triangulation,
    },

    #[error("{count} vertices exceed the limit of {limit}")]
    VertexLimitExceeded { count: usize, limit: usize },
}

/// Errors that prevent a whole document from loading.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed markup: {0}")]
    Xml(String),

    #[error("no <svg> root element")]
    MissingRoot,

    #[error("the <svg> element has neither width/height nor a viewBox")]
    MissingDimensions,
}

/// A path that was skipped while loading a document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("path `{id}`: {source}")]
pub struct PathError {
    pub id: String,
    pub source: ParseError,
}

/// A path whose vertex list could not be (fully) triangulated.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("path `{id}`: {source}")]
pub struct MeshError {
    pub id: String,
    pub source: TriangulationError,
}
