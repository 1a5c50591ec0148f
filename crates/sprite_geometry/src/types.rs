use geo_types::{Coord, LineString};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate in image space.
pub type Pixel = Coord<i32>;

/// Floating-point position in texture (pixel) space.
pub type Vertex = Coord<f32>;

/// Axis-aligned integer rectangle. `x`/`y` are inclusive, `x + width` and
/// `y + height` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build a rect from inclusive min/max pixel bounds.
    pub fn from_inclusive_bounds(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True when the two rects share at least one pixel.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn union(&self, other: &PixelRect) -> PixelRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        PixelRect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[derive(JsonSchema)]
#[allow(dead_code)]
struct VertexSchema {
    x: f32,
    y: f32,
}

/// A polygon in texture space.
///
/// Additive polygons are wound CCW (positive shoelace area), subtractive
/// polygons (holes) are wound CW once [`correct_polygon_winding`] has run.
///
/// [`correct_polygon_winding`]: crate::algorithms::winding::correct_polygon_winding
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Polygon {
    #[schemars(with = "Vec<VertexSchema>")]
    pub vertices: Vec<Vertex>,
    /// True when the polygon is a hole rather than solid fill
    #[serde(default)]
    pub negative_winding: bool,
    /// Cached bounds, only set for bounding-box and diced polygons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<PixelRect>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self {
            vertices,
            negative_winding: false,
            bounding_box: None,
        }
    }

    pub fn hole(vertices: Vec<Vertex>) -> Self {
        Self {
            vertices,
            negative_winding: true,
            bounding_box: None,
        }
    }

    /// Axis-aligned rectangle wound CCW, with its bounds cached.
    pub fn rectangle(rect: PixelRect) -> Self {
        let (x0, y0) = (rect.x as f32, rect.y as f32);
        let (x1, y1) = (rect.right() as f32, rect.bottom() as f32);
        Self {
            vertices: vec![
                Coord { x: x0, y: y0 },
                Coord { x: x1, y: y0 },
                Coord { x: x1, y: y1 },
                Coord { x: x0, y: y1 },
            ],
            negative_winding: false,
            bounding_box: Some(rect),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Fewer than three vertices; dropped before winding, merge and triangulation.
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    pub fn to_geo_polygon(&self) -> geo_types::Polygon<f32> {
        geo_types::Polygon::new(LineString::new(self.vertices.clone()), vec![])
    }

    /// Unsigned area of the ring
    pub fn area(&self) -> f32 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }
}

/// Polygons sharing one set of extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolygonCollection {
    pub polygons: Vec<Polygon>,
    /// Alpha values at or below this (0..1) are empty
    pub alpha_threshold: f32,
    /// Simplification tolerance in pixels
    pub simplify_epsilon: f32,
    /// Keep collinear and coincident vertices during triangulation. Required
    /// whenever holes may be bridged into additive polygons.
    pub avoid_vertex_merging: bool,
}

impl Default for PolygonCollection {
    fn default() -> Self {
        Self {
            polygons: Vec::new(),
            alpha_threshold: 0.0,
            simplify_epsilon: 2.0,
            avoid_vertex_merging: false,
        }
    }
}

impl PolygonCollection {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons,
            ..Default::default()
        }
    }

    pub fn add_rectangle_polygon(&mut self, rect: PixelRect) {
        self.polygons.push(Polygon::rectangle(rect));
    }

    pub fn has_holes(&self) -> bool {
        self.polygons.iter().any(|polygon| polygon.negative_winding)
    }
}

/// A baked vertex: pixel-space position plus normalized texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Polygons and triangles built for one sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteGeometry {
    pub polygons: PolygonCollection,
    /// Flat triangle list, three CCW vertices per triangle
    pub triangles: Vec<Vertex>,
    /// Vertex index where fully opaque (diced) triangles start
    pub alternate_split: Option<usize>,
    pub image_width: u32,
    pub image_height: u32,
}

impl SpriteGeometry {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Pair each triangle vertex with its UV in a `texture_width × texture_height` texture.
    pub fn bake_render_vertices(&self, texture_width: u32, texture_height: u32) -> Vec<RenderVertex> {
        let width = if texture_width == 0 { 1.0 } else { texture_width as f32 };
        let height = if texture_height == 0 { 1.0 } else { texture_height as f32 };

        self.triangles
            .iter()
            .map(|vertex| RenderVertex {
                position: [vertex.x, vertex.y],
                uv: [vertex.x / width, vertex.y / height],
            })
            .collect()
    }

    /// Triangles drawn with the translucent and the opaque material.
    pub fn split_triangles(&self) -> (&[Vertex], &[Vertex]) {
        let split = self.alternate_split.unwrap_or(self.triangles.len()).min(self.triangles.len());
        self.triangles.split_at(split)
    }
}
