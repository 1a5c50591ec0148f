//! Winding classification/repair and polygon-set validity.

use tracing::{debug, warn};

use super::predicates::{signed_area, segments_cross, NEARLY_ZERO};
use crate::types::{Polygon, Vertex};

/// CCW by signed shoelace area. Degenerate (zero-area) rings count as CCW.
pub fn is_polygon_winding_ccw(points: &[Vertex]) -> bool {
    signed_area(points) >= -NEARLY_ZERO
}

/// Copy of `polygons` where every ring is wound to match its
/// `negative_winding` flag: additive CCW, subtractive CW. Rings with fewer
/// than three vertices are dropped. Zero-area rings are left as they are.
pub fn correct_polygon_winding(polygons: &[Polygon]) -> Vec<Polygon> {
    polygons
        .iter()
        .filter(|polygon| {
            if polygon.is_degenerate() {
                debug!(vertices = polygon.len(), "dropping degenerate polygon");
                false
            } else {
                true
            }
        })
        .map(|polygon| {
            let area = signed_area(&polygon.vertices);
            let wrong_way = if polygon.negative_winding {
                area > NEARLY_ZERO
            } else {
                area < -NEARLY_ZERO
            };

            let mut fixed = polygon.clone();
            if wrong_way {
                fixed.vertices.reverse();
            }
            fixed
        })
        .collect()
}

fn edges(points: &[Vertex]) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
    (0..points.len()).map(move |i| (points[i], points[(i + 1) % points.len()]))
}

/// Any pair of non-adjacent edges of the ring cross.
pub fn is_self_intersecting(points: &[Vertex]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a1, a2) = (points[i], points[(i + 1) % n]);
        for j in (i + 2)..n {
            // Edge n-1 closes the ring back onto edge 0
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b1, b2) = (points[j], points[(j + 1) % n]);
            if segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

fn rings_cross(a: &[Vertex], b: &[Vertex]) -> bool {
    edges(a).any(|(a1, a2)| edges(b).any(|(b1, b2)| segments_cross(a1, a2, b1, b2)))
}

/// Whether the set can be merged and triangulated safely.
///
/// Fails when an edge of a subtractive polygon crosses an edge of any other
/// polygon, or when any polygon crosses itself. Additive polygons may overlap
/// each other freely. Quadratic in edge count; meant for simplified input.
pub fn are_polygons_valid(polygons: &[Polygon]) -> bool {
    for (index, polygon) in polygons.iter().enumerate() {
        if is_self_intersecting(&polygon.vertices) {
            warn!(polygon = index, "polygon is self-intersecting");
            return false;
        }
    }

    for i in 0..polygons.len() {
        for j in (i + 1)..polygons.len() {
            let (a, b) = (&polygons[i], &polygons[j]);
            if !a.negative_winding && !b.negative_winding {
                continue;
            }
            if rings_cross(&a.vertices, &b.vertices) {
                warn!(first = i, second = j, "hole polygon edges cross another polygon");
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;

    fn ring(points: &[(f32, f32)]) -> Vec<Vertex> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn square(x: f32, y: f32, size: f32) -> Vec<Vertex> {
        ring(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    #[test]
    fn reversing_flips_winding() {
        let shapes = [
            square(0.0, 0.0, 10.0),
            ring(&[(0.0, 0.0), (5.0, 1.0), (2.0, 6.0)]),
            ring(&[(0.0, 0.0), (9.0, 0.0), (9.0, 9.0), (6.0, 9.0), (6.0, 3.0), (3.0, 3.0), (3.0, 9.0), (0.0, 9.0)]),
        ];
        for shape in shapes {
            let mut reversed = shape.clone();
            reversed.reverse();
            assert_eq!(is_polygon_winding_ccw(&reversed), !is_polygon_winding_ccw(&shape));
        }
    }

    #[test]
    fn degenerate_ring_counts_as_ccw() {
        assert!(is_polygon_winding_ccw(&ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])));
        assert!(is_polygon_winding_ccw(&[]));
    }

    #[test]
    fn correction_matches_flags_and_drops_degenerates() {
        let mut cw_square = square(0.0, 0.0, 10.0);
        cw_square.reverse();

        let polygons = vec![
            Polygon::new(cw_square.clone()),
            Polygon::hole(square(3.0, 3.0, 4.0)),
            Polygon::new(ring(&[(0.0, 0.0), (1.0, 1.0)])),
            Polygon::hole(ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])),
        ];

        let corrected = correct_polygon_winding(&polygons);
        assert_eq!(corrected.len(), 3);
        assert!(is_polygon_winding_ccw(&corrected[0].vertices));
        assert!(!is_polygon_winding_ccw(&corrected[1].vertices));

        // Idempotent, including for the zero-area hole
        assert_eq!(correct_polygon_winding(&corrected), corrected);
    }

    #[test]
    fn bow_tie_is_self_intersecting() {
        let bow_tie = ring(&[(0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (0.0, 4.0)]);
        assert!(is_self_intersecting(&bow_tie));
        assert!(!is_self_intersecting(&square(0.0, 0.0, 4.0)));
        assert!(!are_polygons_valid(&[Polygon::new(bow_tie)]));
    }

    #[test]
    fn overlapping_additive_polygons_are_valid() {
        let polygons = vec![
            Polygon::new(square(0.0, 0.0, 10.0)),
            Polygon::new(square(5.0, 5.0, 10.0)),
        ];
        assert!(are_polygons_valid(&polygons));
    }

    #[test]
    fn hole_crossing_its_outline_is_invalid() {
        let mut hole = square(8.0, 3.0, 4.0);
        hole.reverse();
        let polygons = vec![Polygon::new(square(0.0, 0.0, 10.0)), Polygon::hole(hole)];
        assert!(!are_polygons_valid(&polygons));

        let mut inner = square(3.0, 3.0, 4.0);
        inner.reverse();
        let contained = vec![Polygon::new(square(0.0, 0.0, 10.0)), Polygon::hole(inner)];
        assert!(are_polygons_valid(&contained));
    }
}
