use crate::{coord::Coord, mesh::TriangleMesh, triangle::Triangle, Scalar};
use std::collections::BTreeMap;

/// Minimal absolute signed doubled area of a valid triangle.
pub const AREA_EPSILON: Scalar = 1e-8;
/// Safety cap factor: triangulation stops once the running triangle count
/// exceeds `MAX_TRIANGLE_FACTOR * (points + 3)`.
pub const MAX_TRIANGLE_FACTOR: usize = 30;

const SUPER_MARGIN: Scalar = 20.0;
const CIRCUMCIRCLE_EPSILON: Scalar = 1e-9;
const TICK_INTERVAL: usize = 10;

/// Triangulation vertex: a coordinate plus the id used to canonicalize
/// edges. Real points carry sequential positive ids; the three synthetic
/// super-triangle corners use the reserved ids -1, -2 and -3.
struct Vertex {
    pos: Coord,
    id: i32,
}

/// Canonical unordered edge occurrence record, keyed externally by the
/// ordered id pair of its endpoints.
struct EdgeRecord {
    a: usize,
    b: usize,
    count: u32,
}

/// Incrementally build a Delaunay triangulation over the given points using
/// the Bowyer-Watson algorithm.
///
/// Construction is seeded with a synthetic super-triangle enclosing the
/// analysis extent with margin `20 * max(width, height)`. Each point removes
/// every triangle whose circumcircle contains it and re-triangulates the
/// cavity boundary. Degenerate candidates (non-finite vertices, collinear
/// triples) are dropped locally and never surface as errors; if the running
/// triangle count exceeds the safety cap, insertion stops early and the
/// partial mesh is returned. Finalization strips every triangle touching a
/// super-triangle corner.
///
/// # Arguments
/// * `points` - Points in analysis space, consumed in input order.
/// * `width` - Analysis extent width.
/// * `height` - Analysis extent height.
/// * `on_tick` - Progress hook invoked with `(processed, total)` every 10
///   points.
///
/// # Returns
/// Finalized mesh; empty when fewer than 3 points are supplied.
pub fn triangulate_points<F>(
    points: &[Coord],
    width: Scalar,
    height: Scalar,
    mut on_tick: F,
) -> TriangleMesh
where
    F: FnMut(usize, usize),
{
    if points.len() < 3 {
        return TriangleMesh::default();
    }
    let count = points.len();
    let mut vertices = points
        .iter()
        .enumerate()
        .map(|(i, p)| Vertex {
            pos: *p,
            id: i as i32 + 1,
        })
        .collect::<Vec<_>>();

    let delta = width.max(height);
    let mid = Coord::new(width / 2.0, height / 2.0);
    vertices.push(Vertex {
        pos: Coord::new(mid.x - SUPER_MARGIN * delta, mid.y - delta),
        id: -1,
    });
    vertices.push(Vertex {
        pos: Coord::new(mid.x, mid.y + SUPER_MARGIN * delta),
        id: -2,
    });
    vertices.push(Vertex {
        pos: Coord::new(mid.x + SUPER_MARGIN * delta, mid.y - delta),
        id: -3,
    });

    let mut triangles = vec![Triangle {
        a: count,
        b: count + 1,
        c: count + 2,
    }];
    if !is_valid(&vertices, &triangles[0]) {
        return TriangleMesh::default();
    }
    let cap = MAX_TRIANGLE_FACTOR * (count + 3);

    for pi in 0..count {
        let point = vertices[pi].pos;
        if !point.is_finite() {
            continue;
        }

        let bad = triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| circumcircle_contains(&vertices, t, point))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        let mut edges = BTreeMap::new();
        for &i in &bad {
            let t = triangles[i];
            for (a, b) in [(t.a, t.b), (t.b, t.c), (t.c, t.a)] {
                record_edge(&mut edges, &vertices, a, b);
            }
        }
        for &i in bad.iter().rev() {
            triangles.swap_remove(i);
        }
        for record in edges.values() {
            // Edges seen once bound the cavity; shared edges lie inside it.
            if record.count == 1 {
                let candidate = Triangle {
                    a: record.a,
                    b: record.b,
                    c: pi,
                };
                if is_valid(&vertices, &candidate) {
                    triangles.push(candidate);
                }
            }
        }

        if triangles.len() > cap {
            log::debug!(
                "triangle count {} exceeded cap {}, stopping at point {} of {}",
                triangles.len(),
                cap,
                pi,
                count,
            );
            break;
        }
        if pi % TICK_INTERVAL == 0 {
            on_tick(pi, count);
        }
    }

    let triangles = triangles
        .into_iter()
        .filter(|t| is_valid(&vertices, t) && t.a < count && t.b < count && t.c < count)
        .collect::<Vec<_>>();
    TriangleMesh {
        points: points.to_vec(),
        triangles,
    }
}

fn record_edge(
    edges: &mut BTreeMap<(i32, i32), EdgeRecord>,
    vertices: &[Vertex],
    a: usize,
    b: usize,
) {
    if !vertices[a].pos.is_finite() || !vertices[b].pos.is_finite() {
        return;
    }
    let (ia, ib) = (vertices[a].id, vertices[b].id);
    let key = if ia < ib { (ia, ib) } else { (ib, ia) };
    edges
        .entry(key)
        .or_insert(EdgeRecord { a, b, count: 0 })
        .count += 1;
}

fn doubled_area(a: Coord, b: Coord, c: Coord) -> Scalar {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn is_valid(vertices: &[Vertex], triangle: &Triangle) -> bool {
    let a = vertices[triangle.a].pos;
    let b = vertices[triangle.b].pos;
    let c = vertices[triangle.c].pos;
    a.is_finite() && b.is_finite() && c.is_finite() && doubled_area(a, b, c).abs() > AREA_EPSILON
}

/// Closed-form circumcircle membership via perpendicular-bisector algebra.
/// Near-collinear triples make the denominator vanish; those are treated as
/// not containing the point rather than fabricating a circumcenter.
fn circumcircle_contains(vertices: &[Vertex], triangle: &Triangle, point: Coord) -> bool {
    if !is_valid(vertices, triangle) {
        return false;
    }
    let pa = vertices[triangle.a].pos;
    let pb = vertices[triangle.b].pos;
    let pc = vertices[triangle.c].pos;
    let ab = pb - pa;
    let ac = pc - pa;
    let e = ab.x * (pa.x + pb.x) + ab.y * (pa.y + pb.y);
    let f = ac.x * (pa.x + pc.x) + ac.y * (pa.y + pc.y);
    let g = 2.0 * (ab.x * (pc.y - pb.y) - ab.y * (pc.x - pb.x));
    if g.abs() < CIRCUMCIRCLE_EPSILON {
        return false;
    }
    let center = Coord::new((ac.y * e - ab.y * f) / g, (ab.x * f - ac.x * e) / g);
    let radius_sqr = (center - pa).sqr_magnitude();
    (point - center).sqr_magnitude() <= radius_sqr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mesh_is_sound(mesh: &TriangleMesh, point_count: usize) {
        for t in &mesh.triangles {
            assert!(t.a < point_count && t.b < point_count && t.c < point_count);
            assert!(t.a != t.b && t.b != t.c && t.c != t.a);
            let [a, b, c] = mesh.vertices(t);
            assert!(a.is_finite() && b.is_finite() && c.is_finite());
            assert!(doubled_area(a, b, c).abs() > AREA_EPSILON);
        }
    }

    #[test]
    fn too_few_points_yield_empty_mesh() {
        let points = [Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)];
        let mesh = triangulate_points(&points, 2.0, 2.0, |_, _| {});
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn convex_quad_splits_into_two_triangles() {
        let points = [
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(1.0, 3.0),
        ];
        let mesh = triangulate_points(&points, 5.0, 5.0, |_, _| {});
        assert_eq!(mesh.triangles.len(), 2);
        assert_mesh_is_sound(&mesh, points.len());
    }

    #[test]
    fn interior_point_fans_out() {
        let points = [
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
            Coord::new(2.0, 2.0),
        ];
        let mesh = triangulate_points(&points, 4.0, 4.0, |_, _| {});
        assert_eq!(mesh.triangles.len(), 4);
        assert_mesh_is_sound(&mesh, points.len());
    }

    #[test]
    fn collinear_points_produce_no_triangles() {
        let points = [
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(2.0, 2.0),
            Coord::new(3.0, 3.0),
        ];
        let mesh = triangulate_points(&points, 4.0, 4.0, |_, _| {});
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let points = [
            Coord::new(0.0, 0.0),
            Coord::new(Scalar::NAN, 1.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(1.0, 3.0),
        ];
        let mesh = triangulate_points(&points, 5.0, 5.0, |_, _| {});
        assert_eq!(mesh.triangles.len(), 2);
        assert_mesh_is_sound(&mesh, points.len());
        for t in &mesh.triangles {
            assert!(t.a != 1 && t.b != 1 && t.c != 1);
        }
    }

    #[test]
    fn progress_hook_fires_every_ten_points() {
        let points = (0..25)
            .map(|i| Coord::new((i % 5) as Scalar * 7.0, (i / 5) as Scalar * 7.0 + (i % 3) as Scalar))
            .collect::<Vec<_>>();
        let mut ticks = Vec::new();
        triangulate_points(&points, 35.0, 35.0, |done, total| ticks.push((done, total)));
        assert_eq!(ticks, vec![(0, 25), (10, 25), (20, 25)]);
    }

    #[test]
    fn deterministic_triangle_order() {
        let points = (0..30)
            .map(|i| {
                Coord::new(
                    ((i * 37) % 23) as Scalar + (i % 7) as Scalar * 0.31,
                    ((i * 53) % 19) as Scalar + (i % 5) as Scalar * 0.17,
                )
            })
            .collect::<Vec<_>>();
        let a = triangulate_points(&points, 24.0, 20.0, |_, _| {});
        let b = triangulate_points(&points, 24.0, 20.0, |_, _| {});
        assert_eq!(a, b);
    }
}
