use crate::{coord::Coord, triangle::Triangle};
use serde::{Deserialize, Serialize};

/// Triangle mesh over sampled points.
///
/// Triangles index into `points`; every triangle in a finalized mesh is
/// valid (finite vertices, non-degenerate area) and references real points
/// only, never the synthetic super-triangle corners.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// List of points.
    pub points: Vec<Coord>,
    /// List of triangles.
    pub triangles: Vec<Triangle>,
}

impl TriangleMesh {
    /// Returns the centroid of a triangle, `(a + b + c) / 3`.
    pub fn centroid(&self, triangle: &Triangle) -> Coord {
        (self.points[triangle.a] + self.points[triangle.b] + self.points[triangle.c]) / 3.0
    }

    /// Returns the vertex coordinates of a triangle.
    pub fn vertices(&self, triangle: &Triangle) -> [Coord; 3] {
        [
            self.points[triangle.a],
            self.points[triangle.b],
            self.points[triangle.c],
        ]
    }
}
