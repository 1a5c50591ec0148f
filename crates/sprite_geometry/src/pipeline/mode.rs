use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::{algorithms::SimplificationMethod, types::Polygon};

fn default_detail() -> f32 {
    0.5
}

fn default_simplify_epsilon() -> f32 {
    2.0
}

fn default_subdivision() -> i32 {
    32
}

/// How a sprite's polygons are produced from its source region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Display, IntoStaticStr)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeometryMode {
    /// One rectangle covering the whole source region
    SourceBoundingBox,

    /// One rectangle around the pixels above the alpha threshold
    TightBoundingBox {
        #[serde(default)]
        #[schemars(range(min = 0.0, max = 1.0))]
        alpha_threshold: f32,
    },

    /// Traced, simplified outlines of the opaque pixels
    ShrinkWrapped {
        #[serde(default)]
        #[schemars(range(min = 0.0, max = 1.0))]
        alpha_threshold: f32,
        /// 0 traces at 1/8 resolution, 1 at full resolution
        #[serde(default = "default_detail")]
        #[schemars(range(min = 0.0, max = 1.0))]
        detail: f32,
        /// In pixels, before scaling by the trace resolution
        #[serde(default = "default_simplify_epsilon")]
        simplify_epsilon: f32,
        #[serde(default)]
        simplifier: SimplificationMethod,
    },

    /// Grid of tightened rectangles, with fully opaque cells split out
    Diced {
        #[serde(default)]
        #[schemars(range(min = 0.0, max = 1.0))]
        alpha_threshold: f32,
        #[serde(default = "default_subdivision")]
        #[schemars(range(min = 1))]
        pixels_per_subdivision_x: i32,
        #[serde(default = "default_subdivision")]
        #[schemars(range(min = 1))]
        pixels_per_subdivision_y: i32,
    },

    /// Hand-authored polygons, used as given
    FullyCustom { polygons: Vec<Polygon> },
}

impl Default for GeometryMode {
    fn default() -> Self {
        Self::TightBoundingBox { alpha_threshold: 0.0 }
    }
}

impl GeometryMode {
    pub fn shrink_wrapped(detail: f32, simplify_epsilon: f32) -> Self {
        Self::ShrinkWrapped {
            alpha_threshold: 0.0,
            detail,
            simplify_epsilon,
            simplifier: SimplificationMethod::default(),
        }
    }

    pub fn diced(pixels_per_subdivision: i32) -> Self {
        Self::Diced {
            alpha_threshold: 0.0,
            pixels_per_subdivision_x: pixels_per_subdivision,
            pixels_per_subdivision_y: pixels_per_subdivision,
        }
    }

    /// Threshold in 0..1; alpha at or below it counts as empty
    pub fn alpha_threshold(&self) -> f32 {
        match self {
            Self::TightBoundingBox { alpha_threshold }
            | Self::ShrinkWrapped { alpha_threshold, .. }
            | Self::Diced { alpha_threshold, .. } => *alpha_threshold,
            Self::SourceBoundingBox | Self::FullyCustom { .. } => 0.0,
        }
    }

    pub fn simplify_epsilon(&self) -> f32 {
        match self {
            Self::ShrinkWrapped { simplify_epsilon, .. } => *simplify_epsilon,
            _ => default_simplify_epsilon(),
        }
    }
}

/// 0..1 alpha threshold as an 8-bit cutoff.
pub fn alpha_threshold_to_u8(alpha_threshold: f32) -> u8 {
    (alpha_threshold * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_wrapped_fills_in_defaults() {
        let mode: GeometryMode = serde_json::from_str(r#"{ "mode": "shrink_wrapped" }"#).unwrap();
        assert_eq!(mode, GeometryMode::shrink_wrapped(0.5, 2.0));
        assert_eq!(mode.to_string(), "shrink_wrapped");
    }

    #[test]
    fn diced_round_trips_through_json() {
        let mode = GeometryMode::Diced {
            alpha_threshold: 0.25,
            pixels_per_subdivision_x: 16,
            pixels_per_subdivision_y: 8,
        };
        let json = serde_json::to_string(&mode).unwrap();
        assert!(json.contains(r#""mode":"diced""#));
        assert_eq!(serde_json::from_str::<GeometryMode>(&json).unwrap(), mode);
    }

    #[test]
    fn alpha_threshold_maps_to_bytes() {
        assert_eq!(alpha_threshold_to_u8(0.0), 0);
        assert_eq!(alpha_threshold_to_u8(0.5), 127);
        assert_eq!(alpha_threshold_to_u8(1.0), 255);
        assert_eq!(alpha_threshold_to_u8(4.0), 255);
        assert_eq!(alpha_threshold_to_u8(-1.0), 0);
    }
}
