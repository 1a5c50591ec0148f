use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Triangulation failed: no ear found with {remaining} of {vertex_count} vertices remaining")]
    TriangulationFailed { remaining: usize, vertex_count: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
}

pub type Result<T> = std::result::Result<T, GeometryError>;
