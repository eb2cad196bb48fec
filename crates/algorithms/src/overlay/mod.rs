//! Raster algebra and multi-criteria overlay
//!
//! - Raster math: scalar/binary arithmetic, threshold tests, in-place accumulation
//! - Weighted overlay: rescale, weight and sum factor rasters

mod raster_math;
mod weighted;

pub use raster_math::{binary_op, greater_than, in_place_add, scalar_op, MathOp};
pub use weighted::{weighted_overlay, OverlayFactor, WeightedOverlayParams};
