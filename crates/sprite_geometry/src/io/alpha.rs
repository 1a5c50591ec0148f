use std::path::Path;

use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::error::Result;

/// Alpha channel of any decoded image; images without alpha are fully opaque.
pub fn alpha_channel(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| image::Luma([rgba.get_pixel(x, y)[3]]))
}

/// Decode an image file and keep its alpha channel
pub fn load_alpha_image<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();
    let image = image::open(path)?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
    Ok(alpha_channel(&image))
}
