use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{MeshError, TriangulationError};
use crate::triangulate::{triangulate, TriangulateOptions, Triangulation};
use crate::types::{Document, Path};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    pub triangulate: TriangulateOptions,
    /// Move the canvas center to the origin.
    pub center: bool,
    /// Emit a mesh from the triangles clipped before a stall.
    pub keep_partial: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        MeshOptions {
            triangulate: TriangulateOptions::default(),
            center: true,
            keep_partial: true,
        }
    }
}

/// Render-ready buffers for one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathMesh {
    pub id: String,
    pub draw_order: usize,
    pub positions: Vec<[f32; 2]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub opaque: bool,
    /// Set when triangulation stalled and `indices` cover only part of the path.
    pub partial: bool,
}

impl PathMesh {
    pub fn build(
        path: &Path,
        width: f64,
        height: f64,
        options: &MeshOptions,
    ) -> Result<PathMesh, TriangulationError> {
        let triangulation = triangulate(&path.vertices, &options.triangulate)?;
        Ok(Self::from_triangulation(path, width, height, options, &triangulation, false))
    }

    fn from_triangulation(
        path: &Path,
        width: f64,
        height: f64,
        options: &MeshOptions,
        triangulation: &Triangulation,
        partial: bool,
    ) -> PathMesh {
        let (dx, dy) = if options.center {
            (width / 2.0, height / 2.0)
        } else {
            (0.0, 0.0)
        };

        let positions: Vec<[f32; 2]> = path
            .vertices
            .iter()
            .map(|v| [(v.x - dx) as f32, (v.y - dy) as f32])
            .collect();
        let colors = vec![path.color.to_rgba(); positions.len()];

        PathMesh {
            id: path.id.clone(),
            draw_order: path.draw_order,
            uvs: positions.clone(),
            positions,
            colors,
            indices: triangulation.indices(),
            opaque: path.color.is_opaque(),
            partial,
        }
    }

    pub fn asset_name(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.id)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Serialize)]
struct FailureRecord<'a> {
    id: &'a str,
    error: String,
}

/// Writes each failure as `{ "id": ..., "error": ... }`.
fn serialize_failures<S: Serializer>(
    failures: &[MeshError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(failures.iter().map(|failure| FailureRecord {
        id: &failure.id,
        error: failure.source.to_string(),
    }))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MeshBundle {
    pub meshes: Vec<PathMesh>,
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<MeshError>,
}

impl MeshBundle {
    /// First mesh with the given id. Ids are not guaranteed unique.
    pub fn mesh(&self, id: &str) -> Option<&PathMesh> {
        self.meshes.iter().find(|mesh| mesh.id == id)
    }

    pub fn by_draw_order(&self, draw_order: usize) -> Option<&PathMesh> {
        self.meshes.iter().find(|mesh| mesh.draw_order == draw_order)
    }
}

/// Triangulates every path of `document` independently, in draw order.
pub fn build_meshes(document: &Document, options: &MeshOptions) -> MeshBundle {
    let mut bundle = MeshBundle::default();

    for path in document.paths() {
        match PathMesh::build(path, document.width, document.height, options) {
            Ok(mesh) => {
                debug!(id = %mesh.id, triangles = mesh.triangle_count(), "built mesh");
                bundle.meshes.push(mesh);
            }
            Err(source) => {
                warn!(id = %path.id, %source, "triangulation failed");

                if let TriangulationError::TriangulationStalled { partial, .. } = &source {
                    if options.keep_partial && !partial.triangles.is_empty() {
                        bundle.meshes.push(PathMesh::from_triangulation(
                            path,
                            document.width,
                            document.height,
                            options,
                            partial,
                            true,
                        ));
                    }
                }

                bundle.failures.push(MeshError {
                    id: path.id.clone(),
                    source,
                });
            }
        }
    }

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::triangulate::{Orientation, Triangle};
    use crate::types::{Group, Vertex2D};

    fn path(id: &str, draw_order: usize, points: &[(f64, f64)]) -> Path {
        Path {
            id: String::from(id),
            vertices: points.iter().map(|&(x, y)| Vertex2D::new(x, y)).collect(),
            color: Color::rgb(255, 0, 0).with_alpha(0.5),
            draw_order,
        }
    }

    fn square() -> Path {
        path("square", 0, &[(0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)])
    }

    #[test]
    fn test_centered_positions() {
        let mesh = PathMesh::build(&square(), 10.0, 10.0, &MeshOptions::default()).unwrap();
        assert_eq!(
            mesh.positions,
            vec![[-5.0, 5.0], [5.0, 5.0], [5.0, -5.0], [-5.0, -5.0]]
        );
        assert_eq!(mesh.uvs, mesh.positions);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_uncentered_positions() {
        let options = MeshOptions {
            center: false,
            ..MeshOptions::default()
        };
        let mesh = PathMesh::build(&square(), 10.0, 10.0, &options).unwrap();
        assert_eq!(mesh.positions[0], [0.0, 10.0]);
    }

    #[test]
    fn test_colors_and_opacity() {
        let mesh = PathMesh::build(&square(), 10.0, 10.0, &MeshOptions::default()).unwrap();
        assert_eq!(mesh.colors, vec![[1.0, 0.0, 0.0, 0.5]; 4]);
        assert!(!mesh.opaque);
        assert_eq!(mesh.asset_name("drawing"), "drawing_square");
    }

    #[test]
    fn test_failures_are_collected() {
        let document = Document {
            width: 10.0,
            height: 10.0,
            groups: vec![Group {
                id: None,
                paths: vec![path("line", 0, &[(0.0, 0.0), (1.0, 1.0)]), {
                    let mut square = square();
                    square.draw_order = 1;
                    square
                }],
            }],
        };

        let bundle = build_meshes(&document, &MeshOptions::default());
        assert_eq!(bundle.meshes.len(), 1);
        assert_eq!(bundle.meshes[0].draw_order, 1);
        assert_eq!(bundle.failures.len(), 1);
        assert_eq!(bundle.failures[0].id, "line");
        assert_eq!(
            bundle.failures[0].source,
            TriangulationError::InsufficientVertices { count: 2 }
        );
    }

    #[test]
    fn test_stall_without_triangles_emits_no_mesh() {
        let flat = path("flat", 0, &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let document = Document {
            width: 10.0,
            height: 10.0,
            groups: vec![Group {
                id: None,
                paths: vec![flat],
            }],
        };

        let bundle = build_meshes(&document, &MeshOptions::default());
        assert!(bundle.meshes.is_empty());
        assert_eq!(bundle.failures.len(), 1);
        assert!(matches!(
            bundle.failures[0].source,
            TriangulationError::TriangulationStalled { remaining: 4, .. }
        ));
    }

    #[test]
    fn test_mesh_from_partial_triangulation() {
        let partial = Triangulation {
            triangles: vec![Triangle([0, 1, 2])],
            orientation: Orientation::Clockwise,
        };
        let mesh = PathMesh::from_triangulation(
            &square(),
            10.0,
            10.0,
            &MeshOptions::default(),
            &partial,
            true,
        );
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.positions.len(), 4);
    }

    fn document(paths: Vec<Path>) -> Document {
        Document {
            width: 10.0,
            height: 10.0,
            groups: vec![Group { id: None, paths }],
        }
    }

    /// Simple polygon with a doubled vertex on which clipping runs out of ears.
    fn stalling_path() -> Path {
        path(
            "p",
            0,
            &[
                (0.0, 0.0),
                (4.0, 0.0),
                (4.0, 4.0),
                (2.0, 4.0),
                (2.0, 4.0),
                (2.0, 8.0),
                (0.0, 8.0),
                (0.0, 2.0),
                (6.0, 2.0),
                (6.0, 6.0),
            ],
        )
    }

    #[test]
    fn test_partial_mesh_is_flagged() {
        let bundle = build_meshes(&document(vec![stalling_path()]), &MeshOptions::default());

        assert_eq!(bundle.meshes.len(), 1);
        assert!(bundle.meshes[0].partial);
        assert_eq!(bundle.failures.len(), 1);
        match &bundle.failures[0].source {
            TriangulationError::TriangulationStalled { remaining, partial } => {
                assert_eq!(*remaining, 4);
                assert_eq!(bundle.meshes[0].triangle_count(), partial.triangles.len());
            }
            other => panic!("expected a stall, got {:?}", other),
        }

        let complete = PathMesh::build(&square(), 10.0, 10.0, &MeshOptions::default()).unwrap();
        assert!(!complete.partial);
    }

    #[test]
    fn test_failures_are_serialized() {
        let bundle = build_meshes(&document(vec![stalling_path()]), &MeshOptions::default());
        let json = serde_json::to_value(&bundle).unwrap();

        assert_eq!(json["meshes"][0]["partial"], serde_json::Value::Bool(true));
        assert_eq!(json["failures"][0]["id"], "p");
        assert_eq!(
            json["failures"][0]["error"],
            "triangulation stalled with 4 vertices left"
        );
    }

    #[test]
    fn test_meshes_by_draw_order() {
        let mut second = square();
        second.draw_order = 1;
        second.vertices.reverse();
        let bundle = build_meshes(&document(vec![square(), second]), &MeshOptions::default());

        assert_eq!(bundle.meshes.len(), 2);
        assert_eq!(bundle.by_draw_order(0).map(|m| m.draw_order), Some(0));
        assert_eq!(bundle.by_draw_order(1).map(|m| m.positions[0]), Some([-5.0, -5.0]));
        assert!(bundle.by_draw_order(2).is_none());
    }
}
