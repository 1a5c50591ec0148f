use crate::{
    bitmap::BoundaryBitmap,
    types::{Pixel, PixelRect, Vertex},
};

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract outer boundary polygons of the filled pixels inside `scan`
    fn extract_contours(&self, bitmap: &BoundaryBitmap, scan: PixelRect) -> Vec<Vec<Pixel>>;
}

/// Trait for polygon simplification algorithms
pub trait PolygonSimplifier: Send + Sync {
    /// Reduce a closed ring to a subsequence of its vertices
    fn simplify(&self, points: &[Vertex], epsilon: f32) -> Vec<Vertex>;
}
