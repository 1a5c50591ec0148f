pub mod contour;
pub mod merge;
pub mod predicates;
pub mod simplification;
pub mod triangulation;
pub mod winding;

pub use contour::{divisor_from_detail, find_contours, remove_collinear_points, trace_contour, MooreContourTracer};
pub use merge::reduce_polygons;
pub use simplification::{DouglasPeuckerSimplifier, SimplificationMethod, StaircaseSimplifier};
pub use triangulation::{
    remove_redundant_triangles, triangulate_collection, triangulate_polygon, triangulate_rings,
};
pub use winding::{are_polygons_valid, correct_polygon_winding, is_polygon_winding_ccw, is_self_intersecting};
