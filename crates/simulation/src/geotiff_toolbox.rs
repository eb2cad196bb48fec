//! Toolbox backed by GeoTIFF files and the native raster algorithms

use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use stochvuln_algorithms::hydrology::{
    breach_depressions, downslope_distance_to_stream, elevation_above_stream, BreachParams,
};
use stochvuln_algorithms::overlay::{
    binary_op, greater_than, in_place_add, scalar_op, weighted_overlay, MathOp, OverlayFactor,
    WeightedOverlayParams,
};
use stochvuln_algorithms::stochastic::random_field;
use stochvuln_algorithms::terrain::{
    gaussian_filter, slope, GaussianFilterParams, SlopeParams, SlopeUnits,
};
use stochvuln_core::io::{read_geotiff, write_geotiff};
use stochvuln_core::{Raster, Result};

use crate::toolbox::{OverlayInput, Toolbox};

/// Reads every input from disk, runs the algorithm in memory and writes the
/// result as a 32-bit float GeoTIFF.
///
/// The random field draws from a `ChaCha8Rng`, so a fixed seed reproduces a
/// whole run.
#[derive(Debug, Clone)]
pub struct GeoTiffToolbox {
    rng: ChaCha8Rng,
}

impl GeoTiffToolbox {
    /// Seeded toolbox, or one seeded from OS entropy when `seed` is `None`
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    fn read(&self, path: &Path) -> Result<Raster<f64>> {
        trace!(path = %path.display(), "read raster");
        read_geotiff(path)
    }

    fn write(&self, raster: &Raster<f64>, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        trace!(path = %path.display(), "write raster");
        write_geotiff(raster, path)
    }
}

impl Default for GeoTiffToolbox {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Toolbox for GeoTiffToolbox {
    fn new_raster_from_base(&mut self, base: &Path, output: &Path, value: f64) -> Result<()> {
        let base = self.read(base)?;
        let out = base.filled_like(value)?;
        self.write(&out, output)
    }

    fn random_field(&mut self, base: &Path, output: &Path) -> Result<()> {
        let base = self.read(base)?;
        let field = random_field(&base, &mut self.rng)?;
        self.write(&field, output)
    }

    fn gaussian_filter(&mut self, input: &Path, output: &Path, sigma: f64) -> Result<()> {
        let raster = self.read(input)?;
        let smoothed = gaussian_filter(&raster, GaussianFilterParams { sigma })?;
        self.write(&smoothed, output)
    }

    fn multiply(&mut self, input: &Path, scalar: f64, output: &Path) -> Result<()> {
        let raster = self.read(input)?;
        self.write(&scalar_op(&raster, scalar, MathOp::Multiply)?, output)
    }

    fn add(&mut self, a: &Path, b: &Path, output: &Path) -> Result<()> {
        let a = self.read(a)?;
        let b = self.read(b)?;
        self.write(&binary_op(&a, &b, MathOp::Add)?, output)
    }

    fn slope(&mut self, dem: &Path, output: &Path) -> Result<()> {
        let dem = self.read(dem)?;
        let params = SlopeParams {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
        };
        self.write(&slope(&dem, params)?, output)
    }

    fn breach_depressions_least_cost(
        &mut self,
        dem: &Path,
        output: &Path,
        max_dist: usize,
    ) -> Result<()> {
        let dem = self.read(dem)?;
        let params = BreachParams {
            max_dist,
            ..Default::default()
        };
        self.write(&breach_depressions(&dem, params)?, output)
    }

    fn elevation_above_stream(&mut self, dem: &Path, streams: &Path, output: &Path) -> Result<()> {
        let dem = self.read(dem)?;
        let streams = self.read(streams)?;
        self.write(&elevation_above_stream(&dem, &streams)?, output)
    }

    fn downslope_distance_to_stream(
        &mut self,
        dem: &Path,
        streams: &Path,
        output: &Path,
    ) -> Result<()> {
        let dem = self.read(dem)?;
        let streams = self.read(streams)?;
        self.write(&downslope_distance_to_stream(&dem, &streams)?, output)
    }

    fn weighted_overlay(
        &mut self,
        factors: &[OverlayInput<'_>],
        scale_max: f64,
        output: &Path,
    ) -> Result<()> {
        let rasters = factors
            .iter()
            .map(|f| self.read(f.raster))
            .collect::<Result<Vec<_>>>()?;
        let overlay_factors: Vec<OverlayFactor<'_>> = factors
            .iter()
            .zip(&rasters)
            .map(|(f, raster)| OverlayFactor {
                raster,
                weight: f.weight,
                cost: f.cost,
            })
            .collect();

        let combined = weighted_overlay(&overlay_factors, WeightedOverlayParams { scale_max })?;
        self.write(&combined, output)
    }

    fn greater_than(&mut self, input: &Path, threshold: f64, output: &Path) -> Result<()> {
        let raster = self.read(input)?;
        self.write(&greater_than(&raster, threshold)?, output)
    }

    fn in_place_add(&mut self, accumulator: &Path, increment: &Path) -> Result<()> {
        let mut acc = self.read(accumulator)?;
        let inc = self.read(increment)?;
        in_place_add(&mut acc, &inc)?;
        self.write(&acc, accumulator)
    }

    fn divide(&mut self, input: &Path, scalar: f64, output: &Path) -> Result<()> {
        let raster = self.read(input)?;
        self.write(&scalar_op(&raster, scalar, MathOp::Divide)?, output)
    }
}
