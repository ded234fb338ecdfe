//! Ear-clipping triangulation of simple polygons.
//!
//! The remaining polygon is kept as a circular doubly-linked list over the
//! input indices, so clipping an ear is O(1). Convex, reflex and ear membership
//! live in bitsets that are updated for the two neighbours of every clipped ear.
//! Testing a candidate ear scans the remaining vertices, which makes the whole
//! pass O(n²).

use std::collections::VecDeque;

use tracing::debug;

use crate::error::TriangulationError;
use crate::types::Vertex2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
}

/// How the winding of the input polygon is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationStrategy {
    /// Sign of the shoelace area. A zero area counts as counter-clockwise.
    SignedArea,
    /// Classify every vertex assuming counter-clockwise winding and flip when
    /// reflex vertices outnumber convex ones. A heuristic that holds for
    /// simple polygons.
    ConvexMajority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangulateOptions {
    pub orientation: OrientationStrategy,
    /// Inputs with more vertices fail with `VertexLimitExceeded` up front.
    pub max_vertices: usize,
}

impl Default for TriangulateOptions {
    fn default() -> Self {
        TriangulateOptions {
            orientation: OrientationStrategy::SignedArea,
            max_vertices: 65_536,
        }
    }
}

/// Three indices into the triangulated vertex list, clockwise in y-up space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle(pub [usize; 3]);

#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    pub triangles: Vec<Triangle>,
    /// Winding detected for the input polygon.
    pub orientation: Orientation,
}

impl Triangulation {
    /// Flat index list, three entries per triangle.
    pub fn indices(&self) -> Vec<u32> {
        self.triangles
            .iter()
            .flat_map(|Triangle(corners)| corners.iter().map(|&i| i as u32))
            .collect()
    }
}

/// Twice the signed area; positive for counter-clockwise polygons.
fn doubled_area(vertices: &[Vertex2D]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum()
}

/// Shoelace area, positive for counter-clockwise polygons in y-up space.
pub fn signed_area(vertices: &[Vertex2D]) -> f64 {
    doubled_area(vertices) / 2.0
}

/// Inclusive: points on an edge or corner count as inside.
fn point_in_triangle(p: Vertex2D, a: Vertex2D, b: Vertex2D, c: Vertex2D) -> bool {
    let d1 = (b - a).cross(p - a);
    let d2 = (c - b).cross(p - b);
    let d3 = (a - c).cross(p - c);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

/// Membership over `0..capacity`.
#[derive(Debug, Clone)]
struct IndexSet {
    members: Vec<bool>,
    len: usize,
}

impl IndexSet {
    fn with_capacity(capacity: usize) -> Self {
        IndexSet {
            members: vec![false; capacity],
            len: 0,
        }
    }

    fn contains(&self, i: usize) -> bool {
        self.members[i]
    }

    fn insert(&mut self, i: usize) -> bool {
        let inserted = !self.members[i];
        if inserted {
            self.members[i] = true;
            self.len += 1;
        }
        inserted
    }

    fn remove(&mut self, i: usize) -> bool {
        let removed = self.members[i];
        if removed {
            self.members[i] = false;
            self.len -= 1;
        }
        removed
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Circular doubly-linked list over vertex indices.
#[derive(Debug, Clone)]
struct Ring {
    prev: Vec<usize>,
    next: Vec<usize>,
    head: usize,
    len: usize,
}

impl Ring {
    fn new(len: usize) -> Self {
        Ring {
            prev: (0..len).map(|i| (i + len - 1) % len).collect(),
            next: (0..len).map(|i| (i + 1) % len).collect(),
            head: 0,
            len,
        }
    }

    fn remove(&mut self, i: usize) {
        let (prev, next) = (self.prev[i], self.next[i]);
        self.next[prev] = next;
        self.prev[next] = prev;
        if self.head == i {
            self.head = next;
        }
        self.len -= 1;
    }

    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.head;
        (0..self.len).map(move |_| {
            let current = cursor;
            cursor = self.next[cursor];
            current
        })
    }
}

struct EarClipper<'a> {
    vertices: &'a [Vertex2D],
    orientation: Orientation,
    ring: Ring,
    convex: IndexSet,
    reflex: IndexSet,
    ears: IndexSet,
    /// Discovery order of ears. Entries whose index left `ears` are stale.
    ear_queue: VecDeque<usize>,
}

impl<'a> EarClipper<'a> {
    fn new(vertices: &'a [Vertex2D], orientation: Orientation) -> Self {
        let n = vertices.len();
        EarClipper {
            vertices,
            orientation,
            ring: Ring::new(n),
            convex: IndexSet::with_capacity(n),
            reflex: IndexSet::with_capacity(n),
            ears: IndexSet::with_capacity(n),
            ear_queue: VecDeque::new(),
        }
    }

    fn corners(&self, i: usize) -> (usize, usize) {
        (self.ring.prev[i], self.ring.next[i])
    }

    /// Positive for a left turn at `i`, zero for collinear neighbours.
    fn turn(&self, i: usize) -> f64 {
        let (prev, next) = self.corners(i);
        let v0 = self.vertices[prev];
        let v1 = self.vertices[i];
        let v2 = self.vertices[next];
        (v1 - v0).cross(v2 - v1)
    }

    /// Collinear corners count as reflex, so they never become ears.
    fn is_reflex(&self, i: usize) -> bool {
        let turn = self.turn(i);

        match self.orientation {
            Orientation::CounterClockwise => turn <= 0.0,
            Orientation::Clockwise => turn >= 0.0,
        }
    }

    /// No other remaining vertex lies inside or on the triangle at `i`.
    /// Vertices sharing a position with one of the corners are ignored.
    fn is_empty_ear(&self, i: usize) -> bool {
        let (prev, next) = self.corners(i);
        let v0 = self.vertices[prev];
        let v1 = self.vertices[i];
        let v2 = self.vertices[next];

        self.ring
            .iter()
            .filter(|&j| j != prev && j != i && j != next)
            .map(|j| self.vertices[j])
            .filter(|&p| p != v0 && p != v1 && p != v2)
            .all(|p| !point_in_triangle(p, v0, v1, v2))
    }

    fn classify(&mut self, i: usize) {
        let reflex = self.is_reflex(i);
        if reflex {
            self.convex.remove(i);
            self.reflex.insert(i);
        } else {
            self.reflex.remove(i);
            self.convex.insert(i);
        }

        let ear = !reflex && self.is_empty_ear(i);
        if ear {
            if !self.ears.contains(i) {
                self.ears.insert(i);
                self.ear_queue.push_back(i);
            }
        } else {
            self.ears.remove(i);
        }
    }

    fn classify_all(&mut self) {
        let indices: Vec<usize> = self.ring.iter().collect();
        for i in indices {
            self.classify(i);
        }
    }

    fn pop_ear(&mut self) -> Option<usize> {
        while let Some(i) = self.ear_queue.pop_front() {
            if self.ears.remove(i) {
                return Some(i);
            }
        }
        None
    }

    fn oriented(&self, prev: usize, ear: usize, next: usize) -> Triangle {
        match self.orientation {
            Orientation::Clockwise => Triangle([prev, ear, next]),
            Orientation::CounterClockwise => Triangle([next, ear, prev]),
        }
    }

    fn clip(mut self) -> Result<Triangulation, TriangulationError> {
        let mut triangles = Vec::with_capacity(self.vertices.len() - 2);

        while self.ring.len > 3 {
            let ear = match self.pop_ear() {
                Some(ear) => ear,
                None => {
                    return Err(TriangulationError::TriangulationStalled {
                        remaining: self.ring.len,
                        partial: Triangulation {
                            triangles,
                            orientation: self.orientation,
                        },
                    })
                }
            };

            let (prev, next) = self.corners(ear);
            triangles.push(self.oriented(prev, ear, next));

            self.ring.remove(ear);
            self.convex.remove(ear);
            self.reflex.remove(ear);

            self.classify(prev);
            self.classify(next);
        }

        let first = self.ring.head;
        let second = self.ring.next[first];
        let third = self.ring.next[second];
        triangles.push(self.oriented(first, second, third));

        Ok(Triangulation {
            triangles,
            orientation: self.orientation,
        })
    }
}

fn detect_orientation(vertices: &[Vertex2D], strategy: OrientationStrategy) -> Orientation {
    match strategy {
        OrientationStrategy::SignedArea => {
            if doubled_area(vertices) >= 0.0 {
                Orientation::CounterClockwise
            } else {
                Orientation::Clockwise
            }
        }
        OrientationStrategy::ConvexMajority => {
            let mut probe = EarClipper::new(vertices, Orientation::CounterClockwise);
            probe.classify_all();
            // Collinear vertices are reflex for clipping but say nothing about winding.
            let collinear = probe.ring.iter().filter(|&i| probe.turn(i) == 0.0).count();
            if probe.reflex.len() - collinear > probe.convex.len() {
                Orientation::Clockwise
            } else {
                Orientation::CounterClockwise
            }
        }
    }
}

/// Triangulates a simple polygon given as a cyclic vertex list.
///
/// Produces `n - 2` triangles for valid input, all wound clockwise whatever the
/// input winding. The vertex list is only read, so independent polygons can be
/// triangulated concurrently.
pub fn triangulate(
    vertices: &[Vertex2D],
    options: &TriangulateOptions,
) -> Result<Triangulation, TriangulationError> {
    let count = vertices.len();
    if count < 3 {
        return Err(TriangulationError::InsufficientVertices { count });
    }
    if count > options.max_vertices {
        return Err(TriangulationError::VertexLimitExceeded {
            count,
            limit: options.max_vertices,
        });
    }

    let orientation = detect_orientation(vertices, options.orientation);
    debug!(count, ?orientation, "triangulating polygon");

    let mut clipper = EarClipper::new(vertices, orientation);
    clipper.classify_all();
    clipper.clip()
}
