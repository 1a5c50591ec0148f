pub mod alpha;
pub mod geojson;

pub use alpha::{alpha_channel, load_alpha_image};
