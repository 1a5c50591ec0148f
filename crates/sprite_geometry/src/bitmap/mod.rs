//! Bounded pixel storage with out-of-region reads and connected-region queries.

mod regions;

use image::GrayImage;

use crate::types::{Pixel, PixelRect};

/// Row-major byte bitmap covering the region `[x0, x0 + width) × [y0, y0 + height)`.
///
/// Reads outside the region return the out-of-bounds value and writes outside
/// it are ignored, so boundary walks can read one pixel past the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryBitmap {
    pixels: Vec<u8>,
    out_of_bounds_value: u8,
    x0: i32,
    y0: i32,
    width: i32,
    height: i32,
}

impl BoundaryBitmap {
    /// Zero-filled bitmap covering `width × height` pixels starting at `origin`.
    pub fn new(origin: Pixel, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            pixels: vec![0; width as usize * height as usize],
            out_of_bounds_value: 0,
            x0: origin.x,
            y0: origin.y,
            width,
            height,
        }
    }

    /// Zero-filled bitmap at the origin.
    pub fn with_size(width: i32, height: i32) -> Self {
        Self::new(Pixel { x: 0, y: 0 }, width, height)
    }

    /// Value returned for reads outside the region.
    pub fn with_out_of_bounds_value(mut self, value: u8) -> Self {
        self.out_of_bounds_value = value;
        self
    }

    /// Raw intensities copied from a grayscale (alpha) image.
    pub fn from_luma(image: &GrayImage) -> Self {
        Self {
            pixels: image.as_raw().clone(),
            out_of_bounds_value: 0,
            x0: 0,
            y0: 0,
            width: image.width() as i32,
            height: image.height() as i32,
        }
    }

    /// Occupancy mask: 255 where the alpha value is strictly above `threshold`, 0 elsewhere.
    pub fn from_alpha(image: &GrayImage, threshold: u8) -> Self {
        Self::from_luma(&imageproc::contrast::threshold(image, threshold))
    }

    /// Same geometry as `self`, zero-filled.
    pub fn blank_like(&self) -> Self {
        Self::new(self.origin(), self.width, self.height)
    }

    pub fn origin(&self) -> Pixel {
        Pixel { x: self.x0, y: self.y0 }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(self.x0, self.y0, self.width, self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let (local_x, local_y) = ((x - self.x0) as usize, (y - self.y0) as usize);
        Some(local_x + local_y * self.width as usize)
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> u8 {
        match self.index(x, y) {
            Some(index) => self.pixels[index],
            None => self.out_of_bounds_value,
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = value;
        }
    }

    pub fn is_filled(&self, x: i32, y: i32) -> bool {
        self.get_pixel(x, y) != 0
    }

    /// Values below `low` become 0, values at or above `high` become 255.
    pub fn threshold_both_ways(&mut self, low: u8, high: u8) {
        for pixel in &mut self.pixels {
            if *pixel < low {
                *pixel = 0;
            } else if *pixel >= high {
                *pixel = 255;
            }
        }
    }

    /// Inclusive span `[x0, x1]` of row `y` holds no nonzero pixel.
    pub fn is_row_empty(&self, x0: i32, x1: i32, y: i32) -> bool {
        (x0..=x1).all(|x| !self.is_filled(x, y))
    }

    /// Inclusive span `[y0, y1]` of column `x` holds no nonzero pixel.
    pub fn is_column_empty(&self, x: i32, y0: i32, y1: i32) -> bool {
        (y0..=y1).all(|y| !self.is_filled(x, y))
    }

    /// Inclusive rectangle holds no nonzero pixel.
    pub fn is_region_empty(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        (y0..=y1).all(|y| self.is_row_empty(x0, x1, y))
    }

    /// Every pixel of the inclusive rectangle equals `value`.
    pub fn is_region_equal(&self, x0: i32, y0: i32, x1: i32, y1: i32, value: u8) -> bool {
        (y0..=y1).all(|y| (x0..=x1).all(|x| self.get_pixel(x, y) == value))
    }

    /// Shrink `rect` until every edge row/column holds a nonzero pixel.
    /// Rects with no content collapse to a single pixel, matching
    /// [`BoundaryBitmap::find_texture_bounding_box`].
    pub fn tighten_bounds(&self, rect: PixelRect) -> PixelRect {
        if rect.is_empty() {
            return rect;
        }

        let mut left = rect.x;
        let mut right = rect.right() - 1;
        let mut top = rect.y;
        let mut bottom = rect.bottom() - 1;

        while top < bottom && self.is_row_empty(left, right, top) {
            top += 1;
        }
        while bottom > top && self.is_row_empty(left, right, bottom) {
            bottom -= 1;
        }
        while left < right && self.is_column_empty(left, top, bottom) {
            left += 1;
        }
        while right > left && self.is_column_empty(right, top, bottom) {
            right -= 1;
        }

        PixelRect::from_inclusive_bounds(left, top, right, bottom)
    }

    /// Tight bounds of the content inside `source`, after clamping `source` to the bitmap.
    pub fn find_texture_bounding_box(&self, source: PixelRect) -> PixelRect {
        if !self.is_valid() {
            return source;
        }

        let max_x = self.x0 + self.width - 1;
        let max_y = self.y0 + self.height - 1;
        let left = source.x.clamp(self.x0, max_x);
        let right = (source.right() - 1).clamp(self.x0, max_x);
        let top = source.y.clamp(self.y0, max_y);
        let bottom = (source.bottom() - 1).clamp(self.y0, max_y);

        self.tighten_bounds(PixelRect::from_inclusive_bounds(left, top, right, bottom))
    }

    /// Bounding box of every nonzero pixel, or `None` for an empty bitmap.
    pub fn content_bounds(&self) -> Option<PixelRect> {
        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for local_y in 0..self.height {
            for local_x in 0..self.width {
                if self.pixels[(local_x + local_y * self.width) as usize] == 0 {
                    continue;
                }
                let (x, y) = (self.x0 + local_x, self.y0 + local_y);
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds.map(|(x0, y0, x1, y1)| PixelRect::from_inclusive_bounds(x0, y0, x1, y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn reads_outside_region_return_default() {
        let mut bitmap = BoundaryBitmap::new(Pixel { x: -1, y: -1 }, 4, 4);
        bitmap.set_pixel(-1, -1, 7);
        bitmap.set_pixel(10, 10, 9);

        assert_eq!(bitmap.get_pixel(-1, -1), 7);
        assert_eq!(bitmap.get_pixel(10, 10), 0);
        assert_eq!(bitmap.get_pixel(-2, 0), 0);

        let padded = bitmap.with_out_of_bounds_value(3);
        assert_eq!(padded.get_pixel(100, -100), 3);
    }

    #[test]
    fn zero_sized_bitmap_is_invalid() {
        let mut bitmap = BoundaryBitmap::with_size(0, 5);
        bitmap.set_pixel(0, 0, 1);

        assert!(!bitmap.is_valid());
        assert_eq!(bitmap.get_pixel(0, 0), 0);
        assert_eq!(bitmap.content_bounds(), None);
    }

    #[test]
    fn alpha_threshold_is_exclusive() {
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(0, 0, Luma([10]));
        image.put_pixel(1, 0, Luma([11]));
        image.put_pixel(2, 0, Luma([255]));

        let bitmap = BoundaryBitmap::from_alpha(&image, 10);
        assert_eq!(bitmap.get_pixel(0, 0), 0);
        assert_eq!(bitmap.get_pixel(1, 0), 255);
        assert_eq!(bitmap.get_pixel(2, 0), 255);
        assert_eq!(bitmap.content_bounds(), Some(PixelRect::new(1, 0, 2, 1)));
    }

    #[test]
    fn alpha_mask_matches_luma_copy_of_a_thresholded_image() {
        let mut image = GrayImage::new(4, 4);
        for (index, pixel) in image.pixels_mut().enumerate() {
            *pixel = Luma([(index * 17) as u8]);
        }

        let bitmap = BoundaryBitmap::from_alpha(&image, 100);
        let filled = (0..4)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .filter(|&(x, y)| bitmap.is_filled(x, y))
            .count();
        // 17 * index > 100 from index 6 on
        assert_eq!(filled, 10);
        assert!(!bitmap.is_filled(1, 1));
        assert!(bitmap.is_filled(2, 1));
        assert!(bitmap.is_region_equal(2, 1, 3, 3, 255));
    }

    #[test]
    fn texture_bounding_box_pulls_edges_inward() {
        let mut bitmap = BoundaryBitmap::with_size(20, 20);
        for y in 5..9 {
            for x in 3..12 {
                bitmap.set_pixel(x, y, 1);
            }
        }

        let bounds = bitmap.find_texture_bounding_box(PixelRect::new(0, 0, 20, 20));
        assert_eq!(bounds, PixelRect::new(3, 5, 9, 4));

        // A source rect reaching past the bitmap is clamped first
        let clamped = bitmap.find_texture_bounding_box(PixelRect::new(-10, -10, 100, 100));
        assert_eq!(clamped, bounds);
    }

    #[test]
    fn threshold_both_ways_splits_opaque_and_empty() {
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(0, 0, Luma([5]));
        image.put_pixel(1, 0, Luma([128]));
        image.put_pixel(2, 0, Luma([255]));

        let mut bitmap = BoundaryBitmap::from_luma(&image);
        bitmap.threshold_both_ways(64, 255);

        assert_eq!(bitmap.get_pixel(0, 0), 0);
        assert_eq!(bitmap.get_pixel(1, 0), 128);
        assert_eq!(bitmap.get_pixel(2, 0), 255);
        assert!(bitmap.is_region_equal(2, 0, 2, 0, 255));
        assert!(!bitmap.is_region_equal(1, 0, 2, 0, 255));
    }
}
