use tracing::{debug, warn};

use super::{
    merge::reduce_polygons,
    predicates::{coincident, cull_ring, orientation, point_in_triangle_inclusive, NEARLY_ZERO},
    winding::{are_polygons_valid, correct_polygon_winding},
};
use crate::{
    error::{GeometryError, Result},
    types::{PolygonCollection, Vertex},
};

/// Drop vertices on a straight line through their neighbors, never going
/// below a triangle.
fn remove_collinear_vertices(ring: &mut Vec<Vertex>) {
    cull_ring(ring, 3, |a, b, c| orientation(a, b, c).abs() < NEARLY_ZERO);
}

/// `ring[b]` is a convex corner and no other vertex lies inside or on the
/// triangle it forms with its neighbors. Vertices coinciding with a corner of
/// that triangle (the doubled ends of a hole bridge) do not block it.
fn is_ear(ring: &[Vertex], b: usize) -> bool {
    let n = ring.len();
    let (a_index, c_index) = ((b + n - 1) % n, (b + 1) % n);
    let (a, tip, c) = (ring[a_index], ring[b], ring[c_index]);

    if orientation(a, tip, c) < -NEARLY_ZERO {
        return false;
    }

    !ring.iter().enumerate().any(|(index, &point)| {
        index != a_index
            && index != b
            && index != c_index
            && !coincident(point, a)
            && !coincident(point, tip)
            && !coincident(point, c)
            && point_in_triangle_inclusive(point, a, tip, c)
    })
}

/// Ear-clip one CCW ring into a flat triangle list.
///
/// With `keep_collinear` unset, vertices on a straight line through their
/// neighbors are dropped first. Rings with fewer than three vertices yield
/// no triangles. A ring where no ear can be found returns
/// [`GeometryError::TriangulationFailed`].
pub fn triangulate_polygon(points: &[Vertex], keep_collinear: bool) -> Result<Vec<Vertex>> {
    let mut triangles = Vec::new();
    if points.len() < 3 {
        return Ok(triangles);
    }

    let mut ring = points.to_vec();
    if !keep_collinear {
        remove_collinear_vertices(&mut ring);
    }

    triangles.reserve((ring.len() - 2) * 3);
    while ring.len() >= 3 {
        let n = ring.len();
        let Some(b) = (0..n).find(|&b| is_ear(&ring, b)) else {
            return Err(GeometryError::TriangulationFailed {
                remaining: n,
                vertex_count: points.len(),
            });
        };

        triangles.push(ring[(b + n - 1) % n]);
        triangles.push(ring[b]);
        triangles.push(ring[(b + 1) % n]);
        ring.remove(b);
    }

    Ok(triangles)
}

/// Triangulate each ring on its own; a ring that fails contributes nothing
/// and is logged.
pub fn triangulate_rings(rings: &[Vec<Vertex>], keep_collinear: bool) -> Vec<Vertex> {
    let mut triangles = Vec::new();
    for (index, ring) in rings.iter().enumerate() {
        match triangulate_polygon(ring, keep_collinear) {
            Ok(generated) => triangles.extend(generated),
            Err(error) => warn!(polygon = index, %error, "skipping polygon"),
        }
    }
    triangles
}

fn same_triangle(a: &[Vertex], b: &[Vertex]) -> bool {
    a.iter().all(|point| b.contains(point)) && b.iter().all(|point| a.contains(point))
}

/// Clean up triangles from overlapping additive polygons: weld coincident
/// vertices, then drop zero-area triangles, duplicates and triangles lying
/// entirely inside another triangle.
pub fn remove_redundant_triangles(triangles: &[Vertex]) -> Vec<Vertex> {
    let mut welded: Vec<Vertex> = Vec::new();
    let mut corners: Vec<Vertex> = Vec::with_capacity(triangles.len());
    for &point in triangles {
        let existing = welded.iter().copied().find(|known| {
            (known.x - point.x).abs() <= NEARLY_ZERO && (known.y - point.y).abs() <= NEARLY_ZERO
        });
        match existing {
            Some(known) => corners.push(known),
            None => {
                welded.push(point);
                corners.push(point);
            }
        }
    }

    let mut unique: Vec<&[Vertex]> = Vec::new();
    for triangle in corners.chunks_exact(3) {
        if orientation(triangle[0], triangle[1], triangle[2]).abs() < NEARLY_ZERO {
            continue;
        }
        if unique.iter().any(|kept| same_triangle(kept, triangle)) {
            continue;
        }
        unique.push(triangle);
    }

    let mut result = Vec::with_capacity(unique.len() * 3);
    for (index, triangle) in unique.iter().enumerate() {
        let covered = unique.iter().enumerate().any(|(other_index, other)| {
            other_index != index
                && triangle
                    .iter()
                    .all(|&point| point_in_triangle_inclusive(point, other[0], other[1], other[2]))
        });
        if !covered {
            result.extend_from_slice(triangle);
        }
    }

    debug!(before = triangles.len() / 3, after = result.len() / 3, "removed redundant triangles");
    result
}

/// Full triangulation of a polygon collection into a flat CCW triangle list.
///
/// Winding is corrected first. An invalid set (crossing holes or
/// self-intersecting polygons) yields no triangles. Holes are bridged into
/// their additive polygons, each resulting ring is ear-clipped on its own and
/// a failing ring is skipped. When several hole-free polygons were
/// triangulated with vertex merging allowed, redundant triangles are removed.
pub fn triangulate_collection(collection: &PolygonCollection) -> Vec<Vertex> {
    let has_holes = collection.has_holes();
    let corrected = correct_polygon_winding(&collection.polygons);

    if !are_polygons_valid(&corrected) {
        warn!(polygons = corrected.len(), "polygon set is invalid, producing no triangles");
        return Vec::new();
    }

    let rings = reduce_polygons(&corrected);
    let keep_collinear = collection.avoid_vertex_merging || has_holes;
    let triangles = triangulate_rings(&rings, keep_collinear);

    if !has_holes && !collection.avoid_vertex_merging && collection.polygons.len() > 1 && triangles.len() > 3 {
        return remove_redundant_triangles(&triangles);
    }
    triangles
}
