//! Terrain analysis algorithms
//!
//! - Slope: rate of change of elevation (Horn 1981)
//! - Gaussian filter: spatial low-pass used to give error fields autocorrelation

mod gaussian;
mod slope;

pub use gaussian::{gaussian_filter, GaussianFilterParams};
pub use slope::{slope, SlopeParams, SlopeUnits};
