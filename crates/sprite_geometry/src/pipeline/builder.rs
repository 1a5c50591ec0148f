use crate::{
    pipeline::{GeometryMode, GeometryPipeline},
    traits::{ContourExtractor, PolygonSimplifier},
    types::PixelRect,
};

/// Builder for creating geometry pipelines with a fluent API
pub struct GeometryPipelineBuilder {
    source_region: Option<PixelRect>,
    mode: GeometryMode,
    avoid_vertex_merging: bool,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    simplifier: Option<Box<dyn PolygonSimplifier>>,
}

impl GeometryPipelineBuilder {
    pub fn new() -> Self {
        Self {
            source_region: None,
            mode: GeometryMode::default(),
            avoid_vertex_merging: false,
            contour_extractor: None,
            simplifier: None,
        }
    }

    /// Restrict the pipeline to one sprite of a sheet (default: whole image)
    pub fn source_region(mut self, rect: PixelRect) -> Self {
        self.source_region = Some(rect);
        self
    }

    pub fn mode(mut self, mode: GeometryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep collinear vertices during triangulation
    pub fn avoid_vertex_merging(mut self, avoid: bool) -> Self {
        self.avoid_vertex_merging = avoid;
        self
    }

    /// Replace the contour tracer used in shrink-wrapped mode
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Replace the simplifier selected by the shrink-wrapped mode
    pub fn set_simplifier<S>(mut self, simplifier: S) -> Self
    where
        S: PolygonSimplifier + 'static,
    {
        self.simplifier = Some(Box::new(simplifier));
        self
    }

    /// Shrink-wrap with the given detail and simplification tolerance
    pub fn with_shrink_wrap(self, detail: f32, simplify_epsilon: f32) -> Self {
        self.mode(GeometryMode::shrink_wrapped(detail, simplify_epsilon))
    }

    /// Dice into square cells of `pixels_per_subdivision`
    pub fn with_dicing(self, pixels_per_subdivision: i32) -> Self {
        self.mode(GeometryMode::diced(pixels_per_subdivision))
    }

    pub fn build(self) -> GeometryPipeline {
        GeometryPipeline::new(
            self.source_region,
            self.mode,
            self.avoid_vertex_merging,
            self.contour_extractor,
            self.simplifier,
        )
    }

    /// One tight rectangle per sprite
    pub fn build_tight_bounds(alpha_threshold: f32) -> GeometryPipeline {
        Self::new()
            .mode(GeometryMode::TightBoundingBox { alpha_threshold })
            .build()
    }
}

impl Default for GeometryPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
