use std::ops::Sub;

use crate::color::Color;

/// A point in the y-up coordinate space paths are normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex2D {
    pub x: f64,
    pub y: f64,
}

impl Vertex2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Vertex2D { x, y }
    }

    /// z component of the 3D cross product.
    pub fn cross(self, other: Vertex2D) -> f64 {
        self.x * other.y - self.y * other.x
    }
}

impl Sub for Vertex2D {
    type Output = Vertex2D;

    fn sub(self, other: Vertex2D) -> Vertex2D {
        Vertex2D::new(self.x - other.x, self.y - other.y)
    }
}

/// A single filled contour. Vertex order is the winding order as parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub id: String,
    pub vertices: Vec<Vertex2D>,
    pub color: Color,
    /// Position of the path among all paths of its document, in draw order.
    pub draw_order: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    /// `None` for the implicit group holding paths placed directly under `<svg>`.
    pub id: Option<String>,
    pub paths: Vec<Path>,
}

impl Group {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A loaded document: active groups in document order, plus the canvas extents
/// every path was normalized against.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub width: f64,
    pub height: f64,
    pub groups: Vec<Group>,
}

impl Document {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.groups.iter().flat_map(|group| group.paths.iter())
    }

    pub fn path_count(&self) -> usize {
        self.groups.iter().map(|group| group.paths.len()).sum()
    }

    pub fn path(&self, id: &str) -> Option<&Path> {
        self.paths().find(|path| path.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(id: &str, draw_order: usize) -> Path {
        Path {
            id: String::from(id),
            vertices: Vec::new(),
            color: Color::BLACK,
            draw_order,
        }
    }

    #[test]
    fn test_cross() {
        let a = Vertex2D::new(1.0, 0.0);
        let b = Vertex2D::new(0.0, 1.0);
        assert_eq!(a.cross(b), 1.0);
        assert_eq!(b.cross(a), -1.0);
        assert_eq!((b - a), Vertex2D::new(-1.0, 1.0));
    }

    #[test]
    fn test_document_paths_keep_group_order() {
        let doc = Document {
            width: 10.0,
            height: 10.0,
            groups: vec![
                Group {
                    id: Some(String::from("a")),
                    paths: vec![path("p0", 0), path("p1", 1)],
                },
                Group::default(),
                Group {
                    id: Some(String::from("b")),
                    paths: vec![path("p2", 2)],
                },
            ],
        };

        let ids: Vec<&str> = doc.paths().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
        assert_eq!(doc.path_count(), 3);
        assert_eq!(doc.path("p2").map(|p| p.draw_order), Some(2));
        assert!(doc.path("missing").is_none());
    }
}
