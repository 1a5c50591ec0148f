//! Resolve subtractive polygons by bridging each hole into the additive
//! polygon that contains it.

use tracing::{debug, warn};

use super::predicates::{coincident, orientation, point_in_polygon, point_in_triangle_inclusive, NEARLY_ZERO};
use crate::types::{Polygon, Vertex};

fn max_x_index(points: &[Vertex]) -> usize {
    let mut best = 0;
    for (index, point) in points.iter().enumerate() {
        if point.x > points[best].x {
            best = index;
        }
    }
    best
}

/// Where a rightward ray from `origin` first meets the ring.
struct RayHit {
    point: Vertex,
    /// Ring vertex the ray hit exactly, if any
    vertex: Option<usize>,
    /// Endpoint of the hit edge with the larger x
    far_endpoint: usize,
}

/// Cast a ray from `origin` towards +X against the edges of a CCW ring whose
/// y increases along the edge, and return the nearest hit.
fn cast_ray(ring: &[Vertex], origin: Vertex) -> Option<RayHit> {
    let n = ring.len();
    let mut best: Option<RayHit> = None;

    for i in 0..n {
        let j = (i + 1) % n;
        let (a, b) = (ring[i], ring[j]);
        if b.y <= a.y || origin.y < a.y || origin.y > b.y {
            continue;
        }

        let x = a.x + (origin.y - a.y) * (b.x - a.x) / (b.y - a.y);
        if x < origin.x || best.as_ref().is_some_and(|hit| x >= hit.point.x) {
            continue;
        }

        let vertex = if origin.y == a.y {
            Some(i)
        } else if origin.y == b.y {
            Some(j)
        } else {
            None
        };

        best = Some(RayHit {
            point: Vertex { x, y: origin.y },
            vertex,
            far_endpoint: if b.x > a.x { j } else { i },
        });
    }

    best
}

fn is_reflex(ring: &[Vertex], index: usize) -> bool {
    let n = ring.len();
    let previous = ring[(index + n - 1) % n];
    let next = ring[(index + 1) % n];
    orientation(previous, ring[index], next) < -NEARLY_ZERO
}

/// Index of an outer vertex mutually visible from `m`, the max-x vertex of a hole.
fn find_bridge_vertex(outer: &[Vertex], m: Vertex) -> Option<usize> {
    let hit = cast_ray(outer, m)?;
    if let Some(vertex) = hit.vertex {
        return Some(vertex);
    }

    let p_index = hit.far_endpoint;
    let p = outer[p_index];

    // A reflex vertex inside triangle (M, I, P) would block the view of P;
    // the one closest in angle to the ray is visible instead
    let mut best = p_index;
    let mut best_angle = (p.y - m.y).atan2(p.x - m.x).abs();
    let mut best_distance = (p.x - m.x).powi(2) + (p.y - m.y).powi(2);

    for (index, &vertex) in outer.iter().enumerate() {
        if index == p_index || coincident(vertex, p) || coincident(vertex, m) {
            continue;
        }
        if !is_reflex(outer, index) || !point_in_triangle_inclusive(vertex, m, hit.point, p) {
            continue;
        }

        let angle = (vertex.y - m.y).atan2(vertex.x - m.x).abs();
        let distance = (vertex.x - m.x).powi(2) + (vertex.y - m.y).powi(2);
        if angle < best_angle - NEARLY_ZERO
            || ((angle - best_angle).abs() <= NEARLY_ZERO && distance < best_distance)
        {
            best = index;
            best_angle = angle;
            best_distance = distance;
        }
    }

    Some(best)
}

/// Splice `hole` into `outer` through the bridge `outer[r]` ↔ `hole[m]`.
///
/// Both bridge endpoints appear twice in the result, which therefore has
/// `outer.len() + hole.len() + 2` vertices.
fn splice_hole(outer: &[Vertex], r: usize, hole: &[Vertex], m: usize) -> Vec<Vertex> {
    let mut merged = Vec::with_capacity(outer.len() + hole.len() + 2);
    merged.extend_from_slice(&outer[..=r]);
    merged.extend_from_slice(&hole[m..]);
    merged.extend_from_slice(&hole[..=m]);
    merged.extend_from_slice(&outer[r..]);
    merged
}

/// Merge every hole into the additive polygon containing it.
///
/// Input must already be winding-corrected (additive CCW, holes CW). The
/// result holds one hole-free CCW ring per additive polygon, in input order.
/// Holes nested inside other holes, holes outside every additive polygon and
/// holes no bridge can reach are dropped with a warning. Bridged rings contain
/// zero-width seams and must be triangulated with collinear vertices kept.
pub fn reduce_polygons(polygons: &[Polygon]) -> Vec<Vec<Vertex>> {
    let holes: Vec<&Polygon> = polygons
        .iter()
        .filter(|polygon| polygon.negative_winding && !polygon.is_degenerate())
        .collect();
    let mut claimed = vec![false; holes.len()];
    let mut result = Vec::new();

    for polygon in polygons.iter().filter(|polygon| !polygon.negative_winding) {
        if polygon.is_degenerate() {
            continue;
        }

        let mut candidates: Vec<usize> = (0..holes.len())
            .filter(|&h| !claimed[h] && point_in_polygon(holes[h].vertices[0], &polygon.vertices))
            .collect();
        for &h in &candidates {
            claimed[h] = true;
        }

        // Islands inside holes are not supported
        let nested: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&h| {
                candidates
                    .iter()
                    .any(|&other| other != h && point_in_polygon(holes[h].vertices[0], &holes[other].vertices))
            })
            .collect();
        if !nested.is_empty() {
            warn!(count = nested.len(), "dropping holes nested inside other holes");
            candidates.retain(|h| !nested.contains(h));
        }

        candidates.sort_by(|&a, &b| {
            let max_a = holes[a].vertices[max_x_index(&holes[a].vertices)].x;
            let max_b = holes[b].vertices[max_x_index(&holes[b].vertices)].x;
            max_b.total_cmp(&max_a)
        });

        let mut outer = polygon.vertices.clone();
        for h in candidates {
            let hole = &holes[h].vertices;
            let m = max_x_index(hole);
            match find_bridge_vertex(&outer, hole[m]) {
                Some(r) => {
                    debug!(hole = h, outer_vertex = r, hole_vertex = m, "bridged hole");
                    outer = splice_hole(&outer, r, hole, m);
                }
                None => warn!(hole = h, "no bridge found for hole, dropping it"),
            }
        }
        result.push(outer);
    }

    let orphans = claimed.iter().filter(|claimed| !**claimed).count();
    if orphans > 0 {
        warn!(count = orphans, "dropping holes that are not inside any additive polygon");
    }

    result
}
