//! Shared tolerance-aware geometric predicates.

use std::f32::consts::PI;

use geo::Area;
use geo_types::{LineString, Polygon};

use crate::types::Vertex;

/// Tolerance for "nearly zero" areas and cross products, in coordinate units.
pub const NEARLY_ZERO: f32 = 1.0e-4;

/// z component of `a × b`.
#[inline]
pub fn cross(a: Vertex, b: Vertex) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
pub fn dot(a: Vertex, b: Vertex) -> f32 {
    a.x * b.x + a.y * b.y
}

#[inline]
pub fn length_squared(a: Vertex) -> f32 {
    dot(a, a)
}

/// Twice the signed area of triangle `(a, b, c)`; positive when CCW.
#[inline]
pub fn orientation(a: Vertex, b: Vertex, c: Vertex) -> f32 {
    cross(b - a, c - a)
}

/// Signed area of a closed ring; positive for CCW rings.
pub fn signed_area(points: &[Vertex]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    Polygon::new(LineString::from(points.to_vec()), Vec::new()).signed_area()
}

/// Segments `p1`–`p2` and `q1`–`q2` cross at a single interior point.
/// Touching endpoints and collinear overlap do not count.
pub fn segments_cross(p1: Vertex, p2: Vertex, q1: Vertex, q2: Vertex) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    let straddles = |a: f32, b: f32| (a > NEARLY_ZERO && b < -NEARLY_ZERO) || (a < -NEARLY_ZERO && b > NEARLY_ZERO);
    straddles(d1, d2) && straddles(d3, d4)
}

/// `point` lies inside or on the boundary of triangle `(a, b, c)`.
pub fn point_in_triangle_inclusive(point: Vertex, a: Vertex, b: Vertex, c: Vertex) -> bool {
    let d1 = orientation(a, b, point);
    let d2 = orientation(b, c, point);
    let d3 = orientation(c, a, point);
    (d1 >= -NEARLY_ZERO && d2 >= -NEARLY_ZERO && d3 >= -NEARLY_ZERO)
        || (d1 <= NEARLY_ZERO && d2 <= NEARLY_ZERO && d3 <= NEARLY_ZERO)
}

/// Point-in-polygon by summing the signed angles each edge subtends at
/// `point`: near zero outside, near ±2π inside. Works for concave rings of
/// either winding.
pub fn point_in_polygon(point: Vertex, polygon: &[Vertex]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut angle_sum = 0.0f32;
    let mut previous = polygon[polygon.len() - 1] - point;
    for &vertex in polygon {
        let current = vertex - point;
        angle_sum += cross(previous, current).atan2(dot(previous, current));
        previous = current;
    }
    angle_sum.abs() > PI
}

/// Exact coordinate equality; used where coincident bridge vertices must be
/// told apart from merely nearby ones.
#[inline]
pub fn coincident(a: Vertex, b: Vertex) -> bool {
    a.x == b.x && a.y == b.y
}

/// Drop ring vertices for which `is_redundant(previous, vertex, next)` holds,
/// comparing against the surviving neighbors, until no more can go or only
/// `min_len` remain. Survivors keep their order.
pub(crate) fn cull_ring<T: Copy>(ring: &mut Vec<T>, min_len: usize, is_redundant: impl Fn(T, T, T) -> bool) {
    let n = ring.len();
    let min_len = min_len.max(2);
    if n <= min_len {
        return;
    }

    let mut omit = vec![false; n];
    let mut live = n;
    let mut changed = true;
    while changed && live > min_len {
        changed = false;
        for index in 0..n {
            if omit[index] || live <= min_len {
                continue;
            }
            let previous = step_live(&omit, index, n - 1);
            let next = step_live(&omit, index, 1);
            if is_redundant(ring[previous], ring[index], ring[next]) {
                omit[index] = true;
                live -= 1;
                changed = true;
            }
        }
    }

    let mut index = 0;
    ring.retain(|_| {
        let keep = !omit[index];
        index += 1;
        keep
    });
}

/// Nearest live index from `from`, moving by `stride` around the ring.
fn step_live(omit: &[bool], from: usize, stride: usize) -> usize {
    let n = omit.len();
    let mut index = (from + stride) % n;
    while omit[index] && index != from {
        index = (index + stride) % n;
    }
    index
}
