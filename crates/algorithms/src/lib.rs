//! # stochvuln-algorithms
//!
//! Raster algorithms used by the Monte Carlo vulnerability simulation.
//!
//! ## Modules
//!
//! - **terrain**: Slope, Gaussian filtering
//! - **hydrology**: Depression breaching, D8 flow direction, elevation above
//!   stream, downslope distance to stream
//! - **overlay**: Raster math, thresholding, weighted overlay
//! - **stochastic**: Gaussian random fields for DEM error perturbation

pub mod hydrology;
pub mod overlay;
pub mod stochastic;
pub mod terrain;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        breach_depressions, downslope_distance_to_stream, elevation_above_stream,
        flow_direction, BreachParams,
    };
    pub use crate::overlay::{
        binary_op, greater_than, in_place_add, scalar_op, weighted_overlay, MathOp,
        OverlayFactor, WeightedOverlayParams,
    };
    pub use crate::stochastic::{random_field, standard_normal};
    pub use crate::terrain::{gaussian_filter, slope, GaussianFilterParams, SlopeParams, SlopeUnits};
    pub use stochvuln_core::prelude::*;
}
