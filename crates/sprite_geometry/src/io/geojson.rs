use std::path::Path;

use geo_types::Coord;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};

use crate::{
    error::{GeometryError, Result},
    types::{Polygon, PolygonCollection, SpriteGeometry, Vertex},
};

fn geometry_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn json_number(value: f64) -> JsonValue {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

/// Closed GeoJSON ring: the first position is repeated at the end.
fn to_ring(vertices: &[Vertex]) -> Vec<Vec<f64>> {
    vertices
        .iter()
        .chain(vertices.first())
        .map(|vertex| vec![vertex.x as f64, vertex.y as f64])
        .collect()
}

fn from_ring(ring: &[Vec<f64>]) -> Result<Vec<Vertex>> {
    let mut vertices = ring
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord {
                x: *x as f32,
                y: *y as f32,
            }),
            _ => Err(GeometryError::InvalidGeoJson(format!(
                "position needs two coordinates, got {}",
                position.len()
            ))),
        })
        .collect::<Result<Vec<Vertex>>>()?;

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    Ok(vertices)
}

impl PolygonCollection {
    /// One Polygon feature per polygon; the collection parameters travel as
    /// foreign members.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .polygons
            .iter()
            .enumerate()
            .map(|(i, polygon)| {
                let mut properties = Map::new();
                properties.insert("negative_winding".to_string(), JsonValue::Bool(polygon.negative_winding));
                properties.insert("area".to_string(), json_number(polygon.area() as f64));

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![to_ring(&polygon.vertices)]))),
                    id: Some(geojson::feature::Id::Number(Number::from(i))),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("alpha_threshold".to_string(), json_number(self.alpha_threshold as f64));
        foreign_members.insert("simplify_epsilon".to_string(), json_number(self.simplify_epsilon as f64));
        foreign_members.insert("avoid_vertex_merging".to_string(), JsonValue::Bool(self.avoid_vertex_merging));

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson())?)
    }

    /// Read polygons back from a feature collection.
    ///
    /// Interior rings become hole polygons. Features without a
    /// `negative_winding` property are additive, and missing collection
    /// parameters fall back to their defaults.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self> {
        let geojson: FeatureCollection = geojson_str.parse()?;
        let mut collection = PolygonCollection::default();

        if let Some(members) = &geojson.foreign_members {
            if let Some(value) = members.get("alpha_threshold").and_then(JsonValue::as_f64) {
                collection.alpha_threshold = value as f32;
            }
            if let Some(value) = members.get("simplify_epsilon").and_then(JsonValue::as_f64) {
                collection.simplify_epsilon = value as f32;
            }
            if let Some(value) = members.get("avoid_vertex_merging").and_then(JsonValue::as_bool) {
                collection.avoid_vertex_merging = value;
            }
        }

        for feature in geojson.features {
            let negative_winding = feature
                .property("negative_winding")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);

            let Some(geometry) = feature.geometry else {
                continue;
            };
            let rings = match geometry.value {
                Value::Polygon(rings) => rings,
                other => {
                    return Err(GeometryError::InvalidGeoJson(format!(
                        "expected Polygon geometry, found {}",
                        geometry_name(&other)
                    )))
                }
            };

            for (ring_index, ring) in rings.iter().enumerate() {
                let vertices = from_ring(ring)?;
                collection.polygons.push(Polygon {
                    vertices,
                    negative_winding: negative_winding || ring_index > 0,
                    bounding_box: None,
                });
            }
        }

        Ok(collection)
    }

    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&geojson_str)
    }
}

impl SpriteGeometry {
    /// Polygons as GeoJSON, tagged with the image size and triangle count
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut collection = self.polygons.to_geojson();
        let members = collection.foreign_members.get_or_insert_with(Map::new);
        members.insert("image_width".to_string(), JsonValue::Number(Number::from(self.image_width)));
        members.insert("image_height".to_string(), JsonValue::Number(Number::from(self.image_height)));
        members.insert("triangle_count".to_string(), JsonValue::Number(Number::from(self.triangle_count())));
        collection
    }

    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(&self.to_geojson())?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
