use tracing::{debug, warn};

use super::BoundaryBitmap;
use crate::types::{Pixel, PixelRect};

/// Upper bound on flood-fill/re-seed rounds in [`BoundaryBitmap::has_connected_rect`].
/// Interlocking island patterns can otherwise keep growing the rect for a long time.
pub const MAX_CONNECTED_RECT_PASSES: usize = 40;

const NEIGHBORS_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl BoundaryBitmap {
    /// Mark every pixel 4-connected to the seed that is nonzero in `self` and
    /// still zero in `mask`. Marked pixels are set to 1 in `mask`.
    pub fn flood_fill(&self, mask: &mut BoundaryBitmap, start_x: i32, start_y: i32) {
        if !self.is_valid() || !self.can_fill(mask, start_x, start_y) {
            return;
        }

        mask.set_pixel(start_x, start_y, 1);
        let mut stack = vec![(start_x, start_y)];

        while let Some((x, y)) = stack.pop() {
            for (dx, dy) in NEIGHBORS_4 {
                let (nx, ny) = (x + dx, y + dy);
                if self.can_fill(mask, nx, ny) {
                    mask.set_pixel(nx, ny, 1);
                    stack.push((nx, ny));
                }
            }
        }
    }

    fn can_fill(&self, mask: &BoundaryBitmap, x: i32, y: i32) -> bool {
        self.contains(x, y) && mask.contains(x, y) && self.is_filled(x, y) && !mask.is_filled(x, y)
    }

    /// First pixel on the border of `rect` (or, with `extend`, on the ring just
    /// outside it) that is nonzero here but was not reached by `mask`.
    pub fn has_overlapping_island(
        &self,
        mask: &BoundaryBitmap,
        rect: PixelRect,
        extend: bool,
    ) -> Option<Pixel> {
        if rect.is_empty() {
            return None;
        }

        let grow = i32::from(extend);
        let left = rect.x - grow;
        let right = rect.right() - 1 + grow;
        let top = rect.y - grow;
        let bottom = rect.bottom() - 1 + grow;

        let is_island = |x: i32, y: i32| self.is_filled(x, y) && !mask.is_filled(x, y);

        (left..=right)
            .flat_map(|x| [(x, top), (x, bottom)])
            .chain((top..=bottom).flat_map(|y| [(left, y), (right, y)]))
            .find(|&(x, y)| self.contains(x, y) && is_island(x, y))
            .map(|(x, y)| Pixel { x, y })
    }

    /// Smallest rect holding the region connected to `(x, y)`, grown to absorb
    /// any other region that crosses its border. `extend` also absorbs regions
    /// that only touch the rect from outside.
    pub fn has_connected_rect(&self, x: i32, y: i32, extend: bool) -> Option<PixelRect> {
        if !self.is_valid() || !self.is_filled(x, y) {
            return None;
        }

        let mut mask = self.blank_like();
        let mut seed = Pixel { x, y };
        let mut rect = PixelRect::new(x, y, 1, 1);

        for pass in 0..MAX_CONNECTED_RECT_PASSES {
            self.flood_fill(&mut mask, seed.x, seed.y);
            rect = mask.content_bounds()?;

            match self.has_overlapping_island(&mask, rect, extend) {
                Some(island) => {
                    debug!(pass, island_x = island.x, island_y = island.y, "connected rect absorbed an island");
                    seed = island;
                }
                None => return Some(rect),
            }
        }

        warn!(
            x,
            y,
            passes = MAX_CONNECTED_RECT_PASSES,
            "connected rect search hit its pass limit"
        );
        Some(rect)
    }

    /// Auto-slice the bitmap into candidate sprite rects. Rects whose bounds
    /// overlap are merged until no two results overlap.
    pub fn extract_rects(&self) -> Vec<PixelRect> {
        let mut rects: Vec<PixelRect> = Vec::new();
        if !self.is_valid() {
            return rects;
        }

        let mut visited = self.blank_like();
        let bounds = self.bounds();

        for y in bounds.y..bounds.bottom() {
            for x in bounds.x..bounds.right() {
                if !self.is_filled(x, y) || visited.is_filled(x, y) {
                    continue;
                }

                let Some(mut rect) = self.has_connected_rect(x, y, false) else {
                    continue;
                };

                for vy in rect.y..rect.bottom() {
                    for vx in rect.x..rect.right() {
                        visited.set_pixel(vx, vy, 1);
                    }
                }

                while let Some(index) = rects.iter().position(|other| other.intersects(&rect)) {
                    rect = rect.union(&rects.remove(index));
                }
                rects.push(rect);
            }
        }

        debug!(count = rects.len(), "extracted sprite rects");
        rects
    }

    /// Nearest nonzero pixel within `max_distance` (Chebyshev rings, nearest
    /// Euclidean pixel inside the first ring that has one).
    pub fn find_closest_valid_point(&self, x: i32, y: i32, max_distance: i32) -> Option<Pixel> {
        if !self.is_valid() {
            return None;
        }
        if self.is_filled(x, y) {
            return Some(Pixel { x, y });
        }

        for radius in 1..=max_distance {
            let ring = (-radius..=radius).flat_map(|d| {
                [
                    (x + d, y - radius),
                    (x + d, y + radius),
                    (x - radius, y + d),
                    (x + radius, y + d),
                ]
            });

            let closest = ring
                .filter(|&(px, py)| self.is_filled(px, py))
                .min_by_key(|&(px, py)| {
                    let (dx, dy) = ((px - x) as i64, (py - y) as i64);
                    dx * dx + dy * dy
                });

            if let Some((px, py)) = closest {
                return Some(Pixel { x: px, y: py });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(bitmap: &mut BoundaryBitmap, rect: PixelRect) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                bitmap.set_pixel(x, y, 1);
            }
        }
    }

    #[test]
    fn flood_fill_is_four_connected() {
        let mut bitmap = BoundaryBitmap::with_size(10, 10);
        fill(&mut bitmap, PixelRect::new(0, 0, 3, 3));
        // Diagonal neighbour only, must not be reached
        bitmap.set_pixel(3, 3, 1);

        let mut mask = bitmap.blank_like();
        bitmap.flood_fill(&mut mask, 1, 1);

        assert_eq!(mask.content_bounds(), Some(PixelRect::new(0, 0, 3, 3)));
        assert_eq!(mask.get_pixel(3, 3), 0);
    }

    #[test]
    fn flood_fill_handles_large_regions_without_recursion() {
        let mut bitmap = BoundaryBitmap::with_size(512, 512);
        fill(&mut bitmap, PixelRect::new(0, 0, 512, 512));

        let mut mask = bitmap.blank_like();
        bitmap.flood_fill(&mut mask, 0, 0);

        assert_eq!(mask.content_bounds(), Some(PixelRect::new(0, 0, 512, 512)));
    }

    #[test]
    fn connected_rect_absorbs_crossing_islands() {
        let mut bitmap = BoundaryBitmap::with_size(20, 20);
        // An L-shaped frame with a separate bar poking through its bounding box
        fill(&mut bitmap, PixelRect::new(2, 2, 8, 1));
        fill(&mut bitmap, PixelRect::new(2, 2, 1, 8));
        fill(&mut bitmap, PixelRect::new(5, 5, 10, 1));

        let rect = bitmap.has_connected_rect(2, 2, false);
        assert_eq!(rect, Some(PixelRect::new(2, 2, 13, 8)));
    }

    #[test]
    fn connected_rect_extend_absorbs_touching_regions() {
        let mut bitmap = BoundaryBitmap::with_size(20, 20);
        fill(&mut bitmap, PixelRect::new(2, 2, 3, 3));
        // Touches the first block diagonally
        fill(&mut bitmap, PixelRect::new(5, 5, 3, 3));

        assert_eq!(bitmap.has_connected_rect(3, 3, false), Some(PixelRect::new(2, 2, 3, 3)));
        assert_eq!(bitmap.has_connected_rect(3, 3, true), Some(PixelRect::new(2, 2, 6, 6)));
    }

    #[test]
    fn connected_rect_on_empty_pixel_is_none() {
        let bitmap = BoundaryBitmap::with_size(4, 4);
        assert_eq!(bitmap.has_connected_rect(1, 1, false), None);
        assert_eq!(BoundaryBitmap::with_size(0, 0).has_connected_rect(0, 0, true), None);
    }

    #[test]
    fn extract_rects_merges_overlapping_rectangles() {
        let mut bitmap = BoundaryBitmap::with_size(32, 32);
        fill(&mut bitmap, PixelRect::new(2, 2, 8, 8));
        fill(&mut bitmap, PixelRect::new(8, 8, 8, 8));

        assert_eq!(bitmap.extract_rects(), vec![PixelRect::new(2, 2, 14, 14)]);
    }

    #[test]
    fn extract_rects_keeps_disconnected_regions_apart() {
        let mut bitmap = BoundaryBitmap::with_size(32, 32);
        fill(&mut bitmap, PixelRect::new(2, 2, 6, 5));
        fill(&mut bitmap, PixelRect::new(9, 2, 4, 7));

        assert_eq!(
            bitmap.extract_rects(),
            vec![PixelRect::new(2, 2, 6, 5), PixelRect::new(9, 2, 4, 7)]
        );
    }

    #[test]
    fn extract_rects_merges_bounds_that_overlap_without_touching() {
        let mut bitmap = BoundaryBitmap::with_size(32, 32);
        // Two interleaved L shapes: their boxes overlap, their pixels never meet
        fill(&mut bitmap, PixelRect::new(0, 0, 10, 1));
        fill(&mut bitmap, PixelRect::new(0, 0, 1, 10));
        fill(&mut bitmap, PixelRect::new(15, 5, 1, 11));
        fill(&mut bitmap, PixelRect::new(5, 15, 11, 1));

        assert_eq!(bitmap.extract_rects(), vec![PixelRect::new(0, 0, 16, 16)]);
    }

    #[test]
    fn extract_rects_skips_regions_inside_an_earlier_rect() {
        let mut bitmap = BoundaryBitmap::with_size(32, 32);
        // A hollow frame and a dot sitting inside it
        fill(&mut bitmap, PixelRect::new(0, 0, 10, 1));
        fill(&mut bitmap, PixelRect::new(0, 9, 10, 1));
        fill(&mut bitmap, PixelRect::new(0, 0, 1, 10));
        fill(&mut bitmap, PixelRect::new(9, 0, 1, 10));
        bitmap.set_pixel(5, 5, 1);

        assert_eq!(bitmap.extract_rects(), vec![PixelRect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn closest_valid_point_searches_outward() {
        let mut bitmap = BoundaryBitmap::with_size(20, 20);
        bitmap.set_pixel(10, 13, 1);
        bitmap.set_pixel(14, 10, 1);

        assert_eq!(bitmap.find_closest_valid_point(10, 10, 10), Some(Pixel { x: 10, y: 13 }));
        assert_eq!(bitmap.find_closest_valid_point(10, 10, 2), None);
    }
}
