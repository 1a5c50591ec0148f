use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use geo_types::LineString;

use super::predicates::{cross, dot, length_squared, NEARLY_ZERO};
use crate::{traits::PolygonSimplifier, types::Vertex};

/// Which simplifier reduces traced contours.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SimplificationMethod {
    /// Bounded-deviation simplification for smooth outlines
    DouglasPeucker,
    /// Removes pixel staircases and flat runs without cutting convex corners
    #[default]
    Staircase,
}

impl PolygonSimplifier for SimplificationMethod {
    fn simplify(&self, points: &[Vertex], epsilon: f32) -> Vec<Vertex> {
        match self {
            Self::DouglasPeucker => DouglasPeuckerSimplifier.simplify(points, epsilon),
            Self::Staircase => StaircaseSimplifier::default().simplify(points, epsilon),
        }
    }
}

/// Douglas-Peucker over a closed ring, using geo's implementation.
///
/// Every removed vertex lies within `epsilon` of the edge of the result that
/// spans it. `epsilon` is floored at [`NEARLY_ZERO`], so a zero tolerance
/// still drops collinear points.
#[derive(Debug, Clone, Default)]
pub struct DouglasPeuckerSimplifier;

impl PolygonSimplifier for DouglasPeuckerSimplifier {
    fn simplify(&self, points: &[Vertex], epsilon: f32) -> Vec<Vertex> {
        use geo::Simplify;

        if points.len() < 3 {
            return points.to_vec();
        }

        let mut closed = points.to_vec();
        closed.push(points[0]);
        let mut result = LineString::new(closed).simplify(&epsilon.max(NEARLY_ZERO)).0;
        result.pop();

        // Whole ring within epsilon of one vertex; keep it rather than collapse it
        if result.len() < 3 {
            return points.to_vec();
        }
        result
    }
}

/// Staircase remover for traced pixel outlines.
///
/// From each kept anchor A, a run of following vertices is dropped while
/// every one of them stays within `epsilon` of the line from A to the vertex
/// after the run, and none of them is a convex corner relative to that line.
/// Only concave detail is removed, so the simplified outline never cuts into
/// the filled area.
#[derive(Debug, Clone)]
pub struct StaircaseSimplifier {
    /// Later passes clean up remnants the first pass leaves between anchors
    pub passes: usize,
}

impl Default for StaircaseSimplifier {
    fn default() -> Self {
        Self { passes: 2 }
    }
}

impl StaircaseSimplifier {
    fn is_flat(a: Vertex, b: Vertex, c: Vertex, epsilon_sq: f32) -> bool {
        let ca = c - a;
        let ba = b - a;
        let ca_length_sq = length_squared(ca);

        let rejection_sq = if ca_length_sq <= f32::EPSILON {
            length_squared(ba)
        } else {
            length_squared(ba - ca * (dot(ba, ca) / ca_length_sq))
        };

        rejection_sq <= epsilon_sq && cross(ca, ba) >= -NEARLY_ZERO
    }

    fn next_live(omit: &[bool], from: usize) -> usize {
        let n = omit.len();
        let mut index = (from + 1) % n;
        while omit[index] && index != from {
            index = (index + 1) % n;
        }
        index
    }

    fn pass(points: &[Vertex], epsilon_sq: f32) -> Vec<Vertex> {
        let n = points.len();
        let mut omit = vec![false; n];
        let mut live = n;

        for anchor in 0..n {
            if live <= 3 {
                break;
            }
            if omit[anchor] {
                continue;
            }

            let a = points[anchor];
            let mut run: Vec<usize> = Vec::new();
            let mut removable = 0;
            let mut cursor = Self::next_live(&omit, anchor);

            while cursor != anchor {
                let candidate = Self::next_live(&omit, cursor);
                if candidate == anchor {
                    break;
                }
                run.push(cursor);
                if live - run.len() < 3 {
                    break;
                }

                let c = points[candidate];
                if !run.iter().all(|&b| Self::is_flat(a, points[b], c, epsilon_sq)) {
                    break;
                }
                removable = run.len();
                cursor = candidate;
            }

            for &index in &run[..removable] {
                omit[index] = true;
            }
            live -= removable;
        }

        points
            .iter()
            .zip(&omit)
            .filter(|(_, omitted)| !**omitted)
            .map(|(point, _)| *point)
            .collect()
    }
}

impl PolygonSimplifier for StaircaseSimplifier {
    fn simplify(&self, points: &[Vertex], epsilon: f32) -> Vec<Vertex> {
        if points.len() < 3 {
            return points.to_vec();
        }

        let epsilon_sq = epsilon.max(0.0) * epsilon.max(0.0);
        let mut result = points.to_vec();
        for _ in 0..self.passes {
            if result.len() <= 3 {
                break;
            }
            result = Self::pass(&result, epsilon_sq);
        }
        result
    }
}
