use geo_types::Coord;
use tracing::{debug, warn};

use super::predicates::cull_ring;
use crate::{
    bitmap::BoundaryBitmap,
    traits::ContourExtractor,
    types::{Pixel, PixelRect},
};

// Clockwise from the top-left, assuming the previous pixel sits to the left:
// 0 1 2
// 7   3
// 6 5 4
const NEIGHBOR_X: [i32; 8] = [-1, 0, 1, 1, 1, 0, -1, -1];
const NEIGHBOR_Y: [i32; 8] = [-1, -1, -1, 0, 1, 1, 1, 0];
// Phase to resume from after stepping onto a neighbor
const PHASE_AFTER_MOVE: [usize; 8] = [5, 6, 7, 0, 1, 2, 3, 4];

// East, south, west, north in y-down image space
const DIRECTION_X: [i32; 4] = [1, 0, -1, 0];
const DIRECTION_Y: [i32; 4] = [0, 1, 0, -1];

/// Boundary walk step limit, per downsampled cell
const MAX_STEPS_PER_CELL: usize = 8;

/// Downsample factor ("pixel size") for a detail level: 8 at detail 0 down to 1 at detail 1.
pub fn divisor_from_detail(detail: f32) -> i32 {
    ((8.0 - 7.0 * detail.clamp(0.0, 1.0)) as i32).clamp(1, 8)
}

/// Moore-neighbor boundary tracer over an occupancy bitmap.
#[derive(Debug, Clone)]
pub struct MooreContourTracer {
    /// 0..1, higher keeps more of the full pixel resolution
    pub detail: f32,
}

impl Default for MooreContourTracer {
    fn default() -> Self {
        Self { detail: 0.5 }
    }
}

impl MooreContourTracer {
    pub fn new(detail: f32) -> Self {
        Self { detail }
    }

    pub fn divisor(&self) -> i32 {
        divisor_from_detail(self.detail)
    }
}

impl ContourExtractor for MooreContourTracer {
    fn extract_contours(&self, bitmap: &BoundaryBitmap, scan: PixelRect) -> Vec<Vec<Pixel>> {
        find_contours(bitmap, scan, self.detail)
    }
}

/// OR-combine `divisor × divisor` blocks of the scan region into one cell each.
fn downsample(bitmap: &BoundaryBitmap, scan: PixelRect, divisor: i32) -> BoundaryBitmap {
    let width = (scan.width + divisor - 1) / divisor;
    let height = (scan.height + divisor - 1) / divisor;
    let mut cells = BoundaryBitmap::with_size(width, height);

    for y in 0..scan.height {
        for x in 0..scan.width {
            if bitmap.is_filled(scan.x + x, scan.y + y) {
                cells.set_pixel(x / divisor, y / divisor, 1);
            }
        }
    }
    cells
}

enum Walk {
    Closed(Vec<Pixel>),
    Isolated,
    StepLimit,
}

/// Moore-neighbor walk from `start`, tagging every visited pixel in `boundary`.
///
/// Stops when about to leave the start pixel with the same move it first left
/// it by, so shapes that pass through the start more than once are still
/// walked completely.
fn walk_boundary(cells: &BoundaryBitmap, boundary: &mut BoundaryBitmap, start: Pixel) -> Walk {
    let max_steps = MAX_STEPS_PER_CELL * (cells.width() as usize * cells.height() as usize) + 8;

    boundary.set_pixel(start.x, start.y, 1);
    let mut chain = vec![start];

    let mut phase = 0usize;
    let mut current = start;
    let mut first_move: Option<usize> = None;
    let mut misses = 0;

    loop {
        let candidate = Coord {
            x: current.x + NEIGHBOR_X[phase],
            y: current.y + NEIGHBOR_Y[phase],
        };

        if !cells.is_filled(candidate.x, candidate.y) {
            phase = (phase + 1) % 8;
            misses += 1;
            if misses >= 8 {
                return Walk::Isolated;
            }
            continue;
        }

        if current == start {
            match first_move {
                Some(first) if first == phase => break,
                Some(_) => {}
                None => first_move = Some(phase),
            }
        }

        boundary.set_pixel(candidate.x, candidate.y, phase as u8 + 1);
        chain.push(candidate);
        if chain.len() > max_steps {
            return Walk::StepLimit;
        }

        current = candidate;
        phase = PHASE_AFTER_MOVE[phase];
        misses = 0;
    }

    if chain.len() > 1 && chain.last() == Some(&start) {
        chain.pop();
    }
    Walk::Closed(chain)
}

/// Turn a closed chain of boundary pixels into the corner points of the
/// pixel-edge outline that wraps it.
///
/// Corners are in cell-corner coordinates: pixel `(x, y)` spans
/// `[x, x + 1] × [y, y + 1]`.
pub fn trace_contour(points: &[Pixel]) -> Vec<Pixel> {
    let mut result = Vec::new();
    let count = points.len();
    if count < 2 {
        return result;
    }

    let first_delta = (points[1].x - points[0].x, points[1].y - points[0].y);
    let start_direction = match first_delta {
        (1, 0) | (1, -1) => 0,
        (1, 1) | (0, 1) => 1,
        (-1, 1) | (-1, 0) => 2,
        (-1, -1) | (0, -1) => 3,
        _ => 0,
    };

    let start = points[0];
    let mut current = start;
    let mut direction = start_direction;
    let mut index = 0usize;
    let mut turns_in_place = 0;

    loop {
        let next = points[(index + 1) % count];
        let next_dx = next.x - current.x;
        let next_dy = next.y - current.y;

        let left = (direction + 3) % 4;
        let (forward_dx, forward_dy) = (DIRECTION_X[direction], DIRECTION_Y[direction]);
        let (left_dx, left_dy) = (DIRECTION_X[left], DIRECTION_Y[left]);

        let mut moved = true;
        if next_dx != 0 || next_dy != 0 {
            if (next_dx, next_dy) == (left_dx, left_dy) {
                direction = left;
                current.x += left_dx;
                current.y += left_dy;
            } else {
                // Wall on the left, so this is a corner of the outline
                result.push(Coord {
                    x: current.x + (1 + forward_dx + left_dx) / 2,
                    y: current.y + (1 + forward_dy + left_dy) / 2,
                });

                if (next_dx, next_dy) == (forward_dx, forward_dy) {
                    current.x += forward_dx;
                    current.y += forward_dy;
                } else if (next_dx, next_dy) == (forward_dx + left_dx, forward_dy + left_dy) {
                    current.x += forward_dx + left_dx;
                    current.y += forward_dy + left_dy;
                    direction = left;
                } else {
                    direction = (direction + 1) % 4;
                    moved = false;
                }
            }
        }

        if moved {
            index += 1;
            turns_in_place = 0;
        } else {
            turns_in_place += 1;
            if turns_in_place >= 4 {
                warn!(index, "contour chain has a step no direction can follow");
                break;
            }
        }

        if index >= count && current == start && direction == start_direction {
            break;
        }
        if index > count {
            warn!(count, "contour trace did not close after one lap");
            break;
        }
    }

    result
}

/// Drop every point lying on the line through its neighbors, wrapping around
/// the closed ring. Duplicate points are removed as well.
pub fn remove_collinear_points(points: &mut Vec<Pixel>) {
    cull_ring(points, 2, |a, b, c| {
        let area = a.x as i64 * (b.y - c.y) as i64
            + b.x as i64 * (c.y - a.y) as i64
            + c.x as i64 * (a.y - b.y) as i64;
        area == 0
    });
}

fn doubled_area(points: &[Pixel]) -> i64 {
    let mut sum = 0i64;
    let mut previous = points[points.len() - 1];
    for &point in points {
        sum += previous.x as i64 * point.y as i64 - previous.y as i64 * point.x as i64;
        previous = point;
    }
    sum
}

/// Outer boundary polygons of the filled pixels of `bitmap` inside `scan`.
///
/// The region is first downsampled by [`divisor_from_detail`]. Traced loops
/// that wind clockwise (hole boundaries) are dropped. Surviving polygons are
/// wound CCW, in image coordinates, scaled back up and clamped to `scan`.
pub fn find_contours(bitmap: &BoundaryBitmap, scan: PixelRect, detail: f32) -> Vec<Vec<Pixel>> {
    let mut contours = Vec::new();
    if scan.is_empty() || !bitmap.is_valid() {
        return contours;
    }

    let divisor = divisor_from_detail(detail);
    let cells = downsample(bitmap, scan, divisor);
    let mut boundary = BoundaryBitmap::new(Coord { x: -1, y: -1 }, cells.width() + 2, cells.height() + 2);

    let mut inside_boundary = false;
    for y in -1..cells.height() + 1 {
        for x in -1..cells.width() + 1 {
            let already_tagged = boundary.is_filled(x, y);
            let filled = cells.is_filled(x, y);

            if inside_boundary {
                if !filled {
                    inside_boundary = false;
                }
                continue;
            }

            if already_tagged {
                inside_boundary = true;
                continue;
            }
            if !filled {
                continue;
            }

            let chain = match walk_boundary(&cells, &mut boundary, Coord { x, y }) {
                Walk::Closed(chain) => {
                    inside_boundary = true;
                    chain
                }
                Walk::Isolated => {
                    debug!(x, y, "skipping isolated pixel");
                    continue;
                }
                Walk::StepLimit => {
                    warn!(x, y, "boundary walk hit its step limit");
                    continue;
                }
            };

            let mut corners = trace_contour(&chain);
            remove_collinear_points(&mut corners);
            if corners.len() < 3 {
                continue;
            }

            if doubled_area(&corners) <= 0 {
                debug!(x, y, vertices = corners.len(), "dropping clockwise contour, traced holes are unsupported");
                continue;
            }

            for corner in &mut corners {
                corner.x = (scan.x + corner.x * divisor).min(scan.right());
                corner.y = (scan.y + corner.y * divisor).min(scan.bottom());
            }
            contours.push(corners);
        }
    }

    debug!(count = contours.len(), divisor, "traced contours");
    contours
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

    fn bounds(points: &[Pixel]) -> (i32, i32, i32, i32) {
        let min_x = points.iter().map(|p| p.x).min().unwrap();
        let min_y = points.iter().map(|p| p.y).min().unwrap();
        let max_x = points.iter().map(|p| p.x).max().unwrap();
        let max_y = points.iter().map(|p| p.y).max().unwrap();
        (min_x, min_y, max_x, max_y)
    }

    #[test]
    fn divisor_spans_eight_to_one() {
        assert_eq!(divisor_from_detail(0.0), 8);
        assert_eq!(divisor_from_detail(1.0), 1);
        assert_eq!(divisor_from_detail(0.5), 4);
        assert_eq!(divisor_from_detail(-3.0), 8);
        assert_eq!(divisor_from_detail(7.0), 1);
        assert_eq!(divisor_from_detail(f32::NAN), 1);
    }

    #[test]
    fn corner_trace_of_a_square_chain() {
        let chain: Vec<Pixel> = [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();

        let mut corners = trace_contour(&chain);
        assert_eq!(corners.len(), 12);

        remove_collinear_points(&mut corners);
        let expected: Vec<Pixel> = [(3, 0), (3, 3), (0, 3), (0, 0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        assert_eq!(corners, expected);
    }

    #[test]
    fn collinear_removal_handles_long_runs_and_duplicates() {
        let mut points: Vec<Pixel> = (0..50)
            .map(|x| Coord { x, y: 0 })
            .chain([(50, 0), (50, 0), (50, 10), (25, 10), (0, 10), (0, 5)].map(|(x, y)| Coord { x, y }))
            .collect();

        remove_collinear_points(&mut points);
        let expected: Vec<Pixel> = [(0, 0), (50, 0), (50, 10), (0, 10)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        assert_eq!(points, expected);

        let mut line: Vec<Pixel> = (0..4).map(|x| Coord { x, y: 0 }).collect();
        remove_collinear_points(&mut line);
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn filled_rectangle_traces_to_one_ccw_quad() {
        let mut bitmap = BoundaryBitmap::with_size(32, 32);
        let rect = PixelRect::new(5, 7, 12, 9);
        fill(&mut bitmap, rect);

        let contours = find_contours(&bitmap, PixelRect::new(0, 0, 32, 32), 1.0);
        assert_eq!(contours.len(), 1);

        let contour = &contours[0];
        assert_eq!(contour.len(), 4);
        assert!(doubled_area(contour) > 0);
        assert_eq!(bounds(contour), (5, 7, 17, 16));
    }

    #[test]
    fn thin_bar_traces_to_its_outline() {
        let mut bitmap = BoundaryBitmap::with_size(8, 8);
        fill(&mut bitmap, PixelRect::new(2, 3, 3, 1));

        let contours = find_contours(&bitmap, bitmap.bounds(), 1.0);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(bounds(&contours[0]), (2, 3, 5, 4));
    }

    #[test]
    fn isolated_pixel_yields_nothing() {
        let mut bitmap = BoundaryBitmap::with_size(8, 8);
        bitmap.set_pixel(4, 4, 1);

        assert!(find_contours(&bitmap, bitmap.bounds(), 1.0).is_empty());
    }

    #[test]
    fn empty_and_zero_sized_scans_yield_nothing() {
        let bitmap = BoundaryBitmap::with_size(8, 8);
        assert!(find_contours(&bitmap, bitmap.bounds(), 1.0).is_empty());
        assert!(find_contours(&bitmap, PixelRect::new(0, 0, 0, 8), 1.0).is_empty());
    }

    #[test]
    fn separate_blobs_trace_separately() {
        let mut bitmap = BoundaryBitmap::with_size(32, 16);
        fill(&mut bitmap, PixelRect::new(1, 1, 6, 6));
        fill(&mut bitmap, PixelRect::new(12, 3, 8, 8));

        let contours = find_contours(&bitmap, bitmap.bounds(), 1.0);
        assert_eq!(contours.len(), 2);
        assert_eq!(bounds(&contours[0]), (1, 1, 7, 7));
        assert_eq!(bounds(&contours[1]), (12, 3, 20, 11));
    }

    #[test]
    fn ring_keeps_only_its_outer_boundary() {
        let mut bitmap = BoundaryBitmap::with_size(16, 16);
        fill(&mut bitmap, PixelRect::new(2, 2, 10, 10));
        for y in 5..9 {
            for x in 5..9 {
                bitmap.set_pixel(x, y, 0);
            }
        }

        let contours = find_contours(&bitmap, bitmap.bounds(), 1.0);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(bounds(&contours[0]), (2, 2, 12, 12));
    }

    #[test]
    fn downsampled_contour_is_clamped_to_the_scan() {
        let mut bitmap = BoundaryBitmap::with_size(20, 20);
        fill(&mut bitmap, PixelRect::new(0, 0, 10, 10));

        // Divisor 8: the 10x10 block covers two cells per axis, which would
        // reach 16 without the clamp
        let scan = PixelRect::new(0, 0, 10, 10);
        let contours = find_contours(&bitmap, scan, 0.0);
        assert_eq!(contours.len(), 1);
        assert_eq!(bounds(&contours[0]), (0, 0, 10, 10));
    }
}
