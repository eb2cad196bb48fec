//! Geoprocessing capability used by the simulation.
//!
//! Every operation takes raster paths (or scalars) and writes its result to
//! an output path. Calls are synchronous and either fully succeed or return
//! an error; the simulation never inspects raster contents itself.

use std::path::Path;
use stochvuln_core::Result;

/// One factor of a weighted overlay, referenced by file
#[derive(Debug, Clone, Copy)]
pub struct OverlayInput<'a> {
    pub raster: &'a Path,
    pub weight: f64,
    /// Low raw values score high
    pub cost: bool,
}

/// Raster operations the Monte Carlo pipeline is built from
pub trait Toolbox {
    /// Raster on `base`'s grid filled with `value` (nodata stays nodata)
    fn new_raster_from_base(&mut self, base: &Path, output: &Path, value: f64) -> Result<()>;

    /// Independent standard-normal value per valid cell of `base`
    fn random_field(&mut self, base: &Path, output: &Path) -> Result<()>;

    /// Gaussian smoothing, `sigma` in cells
    fn gaussian_filter(&mut self, input: &Path, output: &Path, sigma: f64) -> Result<()>;

    fn multiply(&mut self, input: &Path, scalar: f64, output: &Path) -> Result<()>;

    fn add(&mut self, a: &Path, b: &Path, output: &Path) -> Result<()>;

    /// Slope in degrees
    fn slope(&mut self, dem: &Path, output: &Path) -> Result<()>;

    /// Least-cost breaching within `max_dist` cells of each pit, then filling
    fn breach_depressions_least_cost(
        &mut self,
        dem: &Path,
        output: &Path,
        max_dist: usize,
    ) -> Result<()>;

    /// Height above the first stream cell on each D8 flow path
    fn elevation_above_stream(&mut self, dem: &Path, streams: &Path, output: &Path) -> Result<()>;

    /// D8 flow-path length to the first stream cell
    fn downslope_distance_to_stream(
        &mut self,
        dem: &Path,
        streams: &Path,
        output: &Path,
    ) -> Result<()>;

    /// Rescale each factor to `[0, scale_max]` and combine with normalized weights
    fn weighted_overlay(
        &mut self,
        factors: &[OverlayInput<'_>],
        scale_max: f64,
        output: &Path,
    ) -> Result<()>;

    /// 1 where strictly greater than `threshold`, else 0
    fn greater_than(&mut self, input: &Path, threshold: f64, output: &Path) -> Result<()>;

    /// `accumulator += increment` in place, where both are valid
    fn in_place_add(&mut self, accumulator: &Path, increment: &Path) -> Result<()>;

    fn divide(&mut self, input: &Path, scalar: f64, output: &Path) -> Result<()>;
}

impl<T: Toolbox + ?Sized> Toolbox for &mut T {
    fn new_raster_from_base(&mut self, base: &Path, output: &Path, value: f64) -> Result<()> {
        (**self).new_raster_from_base(base, output, value)
    }

    fn random_field(&mut self, base: &Path, output: &Path) -> Result<()> {
        (**self).random_field(base, output)
    }

    fn gaussian_filter(&mut self, input: &Path, output: &Path, sigma: f64) -> Result<()> {
        (**self).gaussian_filter(input, output, sigma)
    }

    fn multiply(&mut self, input: &Path, scalar: f64, output: &Path) -> Result<()> {
        (**self).multiply(input, scalar, output)
    }

    fn add(&mut self, a: &Path, b: &Path, output: &Path) -> Result<()> {
        (**self).add(a, b, output)
    }

    fn slope(&mut self, dem: &Path, output: &Path) -> Result<()> {
        (**self).slope(dem, output)
    }

    fn breach_depressions_least_cost(
        &mut self,
        dem: &Path,
        output: &Path,
        max_dist: usize,
    ) -> Result<()> {
        (**self).breach_depressions_least_cost(dem, output, max_dist)
    }

    fn elevation_above_stream(&mut self, dem: &Path, streams: &Path, output: &Path) -> Result<()> {
        (**self).elevation_above_stream(dem, streams, output)
    }

    fn downslope_distance_to_stream(
        &mut self,
        dem: &Path,
        streams: &Path,
        output: &Path,
    ) -> Result<()> {
        (**self).downslope_distance_to_stream(dem, streams, output)
    }

    fn weighted_overlay(
        &mut self,
        factors: &[OverlayInput<'_>],
        scale_max: f64,
        output: &Path,
    ) -> Result<()> {
        (**self).weighted_overlay(factors, scale_max, output)
    }

    fn greater_than(&mut self, input: &Path, threshold: f64, output: &Path) -> Result<()> {
        (**self).greater_than(input, threshold, output)
    }

    fn in_place_add(&mut self, accumulator: &Path, increment: &Path) -> Result<()> {
        (**self).in_place_add(accumulator, increment)
    }

    fn divide(&mut self, input: &Path, scalar: f64, output: &Path) -> Result<()> {
        (**self).divide(input, scalar, output)
    }
}
