//! # Sprite Geometry Library
//!
//! Turns the alpha channel of a sprite into render geometry: the polygons
//! covering its visible pixels and a flat triangle list for drawing them.
//!
//! ## Core Features
//!
//! - **Geometry modes**: source rectangle, tight rectangle, traced
//!   ("shrink-wrapped") outlines, diced grid cells, or hand-authored polygons
//! - **Contour tracing**: downsampled Moore-neighbourhood boundary walk
//! - **Simplification**: staircase removal for pixel outlines and
//!   Douglas-Peucker for smooth ones
//! - **Holes**: subtractive polygons are bridged into the additive polygon
//!   around them before ear-clipping
//! - **Sprite sheets**: auto-slicing and point selection of sprite rects
//! - **GeoJSON Support**: export/import of polygon collections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sprite_geometry::{GeometryMode, GeometryPipeline};
//!
//! let pipeline = GeometryPipeline::builder()
//!     .mode(GeometryMode::shrink_wrapped(0.5, 2.0))
//!     .build();
//!
//! let geometry = pipeline.process_file("sprite.png")?;
//! let vertices = geometry.bake_render_vertices(geometry.image_width, geometry.image_height);
//! println!("{} triangles", vertices.len() / 3);
//!
//! geometry.save_json("sprite.geometry.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Sprite Sheets
//!
//! ```rust,no_run
//! use sprite_geometry::{extract_sprite_rects, load_alpha_image, GeometryPipeline};
//!
//! let sheet = load_alpha_image("sheet.png")?;
//! for rect in extract_sprite_rects(&sheet) {
//!     let geometry = GeometryPipeline::builder()
//!         .source_region(rect)
//!         .with_dicing(16)
//!         .build()
//!         .process(&sheet);
//!     println!("{rect:?}: {} triangles", geometry.triangle_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod bitmap;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod traits;
pub mod types;

pub use algorithms::{
    are_polygons_valid, correct_polygon_winding, divisor_from_detail, find_contours, is_polygon_winding_ccw,
    reduce_polygons, remove_collinear_points, remove_redundant_triangles, trace_contour, triangulate_collection,
    triangulate_polygon, triangulate_rings, DouglasPeuckerSimplifier, MooreContourTracer, SimplificationMethod,
    StaircaseSimplifier,
};
pub use bitmap::BoundaryBitmap;
pub use error::{GeometryError, Result};
pub use io::{alpha_channel, load_alpha_image};
pub use pipeline::{
    builder::GeometryPipelineBuilder, extract_source_region_from_point, extract_sprite_rects, GeometryMode,
    GeometryPipeline,
};
pub use traits::{ContourExtractor, PolygonSimplifier};
pub use types::{Pixel, PixelRect, Polygon, PolygonCollection, RenderVertex, SpriteGeometry, Vertex};

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use image::{GrayImage, Luma};

    fn create_test_image() -> GrayImage {
        let mut img = GrayImage::new(100, 100);
        for y in 20..80 {
            for x in 20..80 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    fn triangle_area(triangles: &[Vertex]) -> f64 {
        triangles
            .chunks_exact(3)
            .map(|t| {
                geo_types::Triangle::new(t[0], t[1], t[2])
                    .to_polygon()
                    .unsigned_area() as f64
            })
            .sum()
    }

    #[test]
    fn test_source_bounding_box() {
        let pipeline = GeometryPipeline::builder().mode(GeometryMode::SourceBoundingBox).build();
        let geometry = pipeline.process(&create_test_image());

        assert_eq!(geometry.polygons.polygons.len(), 1);
        assert_eq!(geometry.polygons.polygons[0].bounding_box, Some(PixelRect::new(0, 0, 100, 100)));
        assert_eq!(geometry.triangle_count(), 2);
        assert_eq!(geometry.image_width, 100);
        assert_eq!(geometry.image_height, 100);
    }

    #[test]
    fn test_tight_bounding_box() {
        let pipeline = GeometryPipeline::builder().build();
        let geometry = pipeline.process(&create_test_image());

        assert_eq!(geometry.polygons.polygons[0].bounding_box, Some(PixelRect::new(20, 20, 60, 60)));
        assert!((triangle_area(&geometry.triangles) - 3600.0).abs() < 1e-3);
    }

    #[test]
    fn test_shrink_wrapped_square() {
        let pipeline = GeometryPipeline::builder().with_shrink_wrap(0.5, 2.0).build();
        let geometry = pipeline.process(&create_test_image());

        assert_eq!(geometry.polygons.polygons.len(), 1);
        let polygon = &geometry.polygons.polygons[0];
        assert!(!polygon.negative_winding);
        assert!(polygon
            .vertices
            .iter()
            .all(|v| (20.0..=80.0).contains(&v.x) && (20.0..=80.0).contains(&v.y)));

        assert_eq!(geometry.triangles.len() % 3, 0);
        assert!(triangle_area(&geometry.triangles) > 3000.0);
        assert!(is_polygon_winding_ccw(&polygon.vertices));
    }

    #[test]
    fn test_shrink_wrapped_empty_image() {
        let pipeline = GeometryPipeline::builder().with_shrink_wrap(1.0, 1.0).build();
        let geometry = pipeline.process(&GrayImage::new(32, 32));

        assert!(geometry.polygons.polygons.is_empty());
        assert!(geometry.triangles.is_empty());
    }

    #[test]
    fn test_diced_opaque_square() {
        let pipeline = GeometryPipeline::builder().with_dicing(30).build();
        let geometry = pipeline.process(&create_test_image());

        // Cells at 0, 30, 60 overlap the 20..80 square in a 3×3 grid
        assert_eq!(geometry.polygons.polygons.len(), 9);
        assert_eq!(geometry.alternate_split, Some(0));
        assert!((triangle_area(&geometry.triangles) - 3600.0).abs() < 1e-2);
    }

    #[test]
    fn test_render_vertices() {
        let pipeline = GeometryPipeline::builder().build();
        let geometry = pipeline.process(&create_test_image());
        let baked = geometry.bake_render_vertices(100, 100);

        assert_eq!(baked.len(), geometry.triangles.len());
        assert!(baked.iter().all(|v| (0.2..=0.8).contains(&v.uv[0]) && (0.2..=0.8).contains(&v.uv[1])));
    }

    #[test]
    fn test_geojson_export() {
        let pipeline = GeometryPipeline::builder().build();
        let geometry = pipeline.process(&create_test_image());

        let geojson = geometry.to_geojson();
        assert_eq!(geojson.features.len(), 1);
    }
}
