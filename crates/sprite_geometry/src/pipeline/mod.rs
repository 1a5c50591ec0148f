pub mod builder;
pub mod mode;

pub use mode::{alpha_threshold_to_u8, GeometryMode};

use std::path::Path;

use geo_types::Coord;
use image::GrayImage;
use tracing::debug;

use crate::{
    algorithms::{divisor_from_detail, is_polygon_winding_ccw, triangulate_collection, MooreContourTracer, SimplificationMethod},
    bitmap::BoundaryBitmap,
    error::Result,
    io::load_alpha_image,
    traits::{ContourExtractor, PolygonSimplifier},
    types::{PixelRect, Polygon, PolygonCollection, SpriteGeometry, Vertex},
};

/// Search radius used when a selection point misses the sprite.
pub const SELECT_SEARCH_RADIUS: i32 = 10;

/// Builds polygons for one sprite region and triangulates them
pub struct GeometryPipeline {
    source_region: Option<PixelRect>,
    mode: GeometryMode,
    avoid_vertex_merging: bool,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    simplifier: Option<Box<dyn PolygonSimplifier>>,
}

impl GeometryPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::GeometryPipelineBuilder {
        builder::GeometryPipelineBuilder::new()
    }

    pub fn new(
        source_region: Option<PixelRect>,
        mode: GeometryMode,
        avoid_vertex_merging: bool,
        contour_extractor: Option<Box<dyn ContourExtractor>>,
        simplifier: Option<Box<dyn PolygonSimplifier>>,
    ) -> Self {
        Self {
            source_region,
            mode,
            avoid_vertex_merging,
            contour_extractor,
            simplifier,
        }
    }

    pub fn mode(&self) -> &GeometryMode {
        &self.mode
    }

    /// The configured source region, or the whole image
    pub fn source_region_for(&self, image: &GrayImage) -> PixelRect {
        self.source_region
            .unwrap_or_else(|| PixelRect::new(0, 0, image.width() as i32, image.height() as i32))
    }

    /// Build and triangulate the sprite's geometry.
    ///
    /// Diced mode appends the fully opaque cells after the translucent ones
    /// and reports where they start in `alternate_split`.
    pub fn process(&self, image: &GrayImage) -> SpriteGeometry {
        let (mut polygons, alternate) = self.build_polygons(image);
        let mut triangles = triangulate_collection(&polygons);

        let mut alternate_split = None;
        if let Some(alternate) = alternate.filter(|alternate| !alternate.polygons.is_empty()) {
            alternate_split = Some(triangles.len());
            triangles.extend(triangulate_collection(&alternate));
            polygons.polygons.extend(alternate.polygons);
        }

        debug!(
            mode = %self.mode,
            polygons = polygons.polygons.len(),
            triangles = triangles.len() / 3,
            "built sprite geometry"
        );

        SpriteGeometry {
            polygons,
            triangles,
            alternate_split,
            image_width: image.width(),
            image_height: image.height(),
        }
    }

    /// Load the alpha channel of an image file and process it
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<SpriteGeometry> {
        let image = load_alpha_image(path)?;
        Ok(self.process(&image))
    }

    /// Polygons for the configured mode, plus the opaque set in diced mode.
    pub fn build_polygons(&self, image: &GrayImage) -> (PolygonCollection, Option<PolygonCollection>) {
        let source = self.source_region_for(image);
        let mut collection = PolygonCollection {
            polygons: Vec::new(),
            alpha_threshold: self.mode.alpha_threshold(),
            simplify_epsilon: self.mode.simplify_epsilon(),
            avoid_vertex_merging: self.avoid_vertex_merging,
        };

        match &self.mode {
            GeometryMode::SourceBoundingBox => {
                if !source.is_empty() {
                    collection.add_rectangle_polygon(source);
                }
            }
            GeometryMode::TightBoundingBox { alpha_threshold } => {
                let bitmap = BoundaryBitmap::from_alpha(image, alpha_threshold_to_u8(*alpha_threshold));
                if bitmap.is_valid() && !source.is_empty() {
                    collection.add_rectangle_polygon(bitmap.find_texture_bounding_box(source));
                }
            }
            GeometryMode::ShrinkWrapped {
                alpha_threshold,
                detail,
                simplify_epsilon,
                simplifier,
            } => {
                collection.polygons =
                    self.shrink_wrap(image, source, *alpha_threshold, *detail, *simplify_epsilon, simplifier);
            }
            GeometryMode::Diced {
                alpha_threshold,
                pixels_per_subdivision_x,
                pixels_per_subdivision_y,
            } => {
                let mut opaque = collection.clone();
                dice(
                    image,
                    source,
                    *alpha_threshold,
                    (*pixels_per_subdivision_x, *pixels_per_subdivision_y),
                    &mut collection,
                    &mut opaque,
                );
                return (collection, Some(opaque));
            }
            GeometryMode::FullyCustom { polygons } => {
                collection.polygons = polygons.clone();
            }
        }

        (collection, None)
    }

    fn shrink_wrap(
        &self,
        image: &GrayImage,
        source: PixelRect,
        alpha_threshold: f32,
        detail: f32,
        simplify_epsilon: f32,
        method: &SimplificationMethod,
    ) -> Vec<Polygon> {
        let bitmap = BoundaryBitmap::from_alpha(image, alpha_threshold_to_u8(alpha_threshold));
        if !bitmap.is_valid() || source.is_empty() {
            return Vec::new();
        }
        let scan = bitmap.find_texture_bounding_box(source);

        let default_tracer = MooreContourTracer::new(detail);
        let extractor: &dyn ContourExtractor = self.contour_extractor.as_deref().unwrap_or(&default_tracer);
        let simplifier: &dyn PolygonSimplifier = self.simplifier.as_deref().unwrap_or(method);

        // Traced vertices sit on the downsampled grid
        let epsilon = simplify_epsilon * divisor_from_detail(detail) as f32;

        let polygons: Vec<Polygon> = extractor
            .extract_contours(&bitmap, scan)
            .into_iter()
            .filter_map(|contour| {
                let points: Vec<Vertex> = contour
                    .iter()
                    .map(|pixel| Coord {
                        x: pixel.x as f32,
                        y: pixel.y as f32,
                    })
                    .collect();
                let vertices = simplifier.simplify(&points, epsilon);
                if vertices.len() < 3 {
                    return None;
                }
                let negative_winding = !is_polygon_winding_ccw(&vertices);
                Some(Polygon {
                    vertices,
                    negative_winding,
                    bounding_box: None,
                })
            })
            .collect();

        debug!(polygons = polygons.len(), epsilon, "shrink-wrapped sprite");
        polygons
    }
}

/// Split `source` into grid cells, tighten each non-empty cell to its
/// content and sort it into `translucent` or, when every pixel is opaque,
/// `opaque`.
fn dice(
    image: &GrayImage,
    source: PixelRect,
    alpha_threshold: f32,
    (cell_width, cell_height): (i32, i32),
    translucent: &mut PolygonCollection,
    opaque: &mut PolygonCollection,
) {
    let mut bitmap = BoundaryBitmap::from_luma(image);
    if !bitmap.is_valid() || source.is_empty() {
        return;
    }
    // Alpha at or below the threshold is empty, as in the occupancy masks
    let Some(low) = alpha_threshold_to_u8(alpha_threshold).checked_add(1) else {
        debug!(alpha_threshold, "no alpha value is above the threshold, nothing to dice");
        return;
    };
    bitmap.threshold_both_ways(low, u8::MAX);

    let region = bitmap.bounds();
    let (left, top) = (source.x.max(region.x), source.y.max(region.y));
    let (right, bottom) = (source.right().min(region.right()), source.bottom().min(region.bottom()));
    let cell_width = cell_width.max(1);
    let cell_height = cell_height.max(1);

    for y in (top..bottom).step_by(cell_height as usize) {
        let height = cell_height.min(bottom - y);
        for x in (left..right).step_by(cell_width as usize) {
            let width = cell_width.min(right - x);
            if bitmap.is_region_empty(x, y, x + width - 1, y + height - 1) {
                continue;
            }

            let cell = bitmap.tighten_bounds(PixelRect::new(x, y, width, height));
            if bitmap.is_region_equal(cell.x, cell.y, cell.right() - 1, cell.bottom() - 1, u8::MAX) {
                opaque.add_rectangle_polygon(cell);
            } else {
                translucent.add_rectangle_polygon(cell);
            }
        }
    }

    debug!(
        translucent = translucent.polygons.len(),
        opaque = opaque.polygons.len(),
        "diced sprite"
    );
}

/// Sprite rect under `(x, y)`: the connected region at (or within
/// [`SELECT_SEARCH_RADIUS`] pixels of) the point, grown to absorb regions
/// crossing its bounds.
pub fn extract_source_region_from_point(image: &GrayImage, x: f32, y: f32) -> Option<PixelRect> {
    let bitmap = BoundaryBitmap::from_alpha(image, 0);
    let seed = bitmap.find_closest_valid_point(x.round() as i32, y.round() as i32, SELECT_SEARCH_RADIUS)?;
    bitmap
        .has_connected_rect(seed.x, seed.y, false)
        .filter(|rect| !rect.is_empty())
}

/// Auto-slice a sprite sheet into non-overlapping sprite rects.
pub fn extract_sprite_rects(image: &GrayImage) -> Vec<PixelRect> {
    BoundaryBitmap::from_alpha(image, 0).extract_rects()
}
