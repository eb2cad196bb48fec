//! Monte Carlo driver.
//!
//! Each iteration perturbs the DEM with a spatially autocorrelated error
//! field, re-derives the terrain factors, overlays them and adds the three
//! threshold exceedance masks to the frequency accumulators. After the last
//! iteration the accumulators are divided by the iteration count.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{FactorWeight, OverlayWeights, SimulationConfig};
use crate::error::{Result, SimulationError};
use crate::paths::{RunPaths, Severity, Transient};
use crate::toolbox::{OverlayInput, Toolbox};

/// Tolerance on the overlay weight sum before a warning is logged
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Hooks called while a simulation runs
pub trait ProgressObserver {
    /// Called before iteration `iteration` (1-based) of `total`
    fn on_iteration(&mut self, _iteration: usize, _total: usize) {}

    /// Called once, after the last iteration and before normalization
    fn on_finalize(&mut self) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub iterations: usize,
    pub elapsed: Duration,
    /// Frequency rasters, low / moderate / high
    pub frequency: [PathBuf; 3],
    /// Uncertainty (frequency / N) rasters, low / moderate / high
    pub uncertainty: [PathBuf; 3],
}

/// A validated simulation bound to a toolbox
pub struct Simulation<T: Toolbox> {
    config: SimulationConfig,
    paths: RunPaths,
    toolbox: T,
}

impl<T: Toolbox> Simulation<T> {
    /// Validate `config`, resolve the run paths and check the static inputs
    /// exist. No toolbox call is made here.
    pub fn new(config: SimulationConfig, toolbox: T) -> Result<Self> {
        config.validate()?;
        let paths = RunPaths::new(&config);

        for (name, path) in paths.inputs() {
            if !path.is_file() {
                return Err(SimulationError::MissingInput {
                    name,
                    path: path.to_path_buf(),
                });
            }
        }

        if let Some(weight_sum) = unnormalized_weight_sum(&config.overlay) {
            warn!(weight_sum, "overlay weights do not sum to 1; they will be normalized");
        }

        Ok(Self {
            config,
            paths,
            toolbox,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn paths(&self) -> &RunPaths {
        &self.paths
    }

    /// Consume the simulation and hand back its toolbox
    pub fn into_toolbox(self) -> T {
        self.toolbox
    }

    /// Run every iteration without progress callbacks
    pub fn run(&mut self) -> Result<SimulationOutcome> {
        self.run_with_progress(&mut NoProgress)
    }

    /// Run every iteration, reporting progress to `observer`.
    ///
    /// The first failing toolbox call aborts the run; frequency rasters left
    /// on disk are then partial and not normalized.
    pub fn run_with_progress<O: ProgressObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<SimulationOutcome> {
        let start = Instant::now();
        let n = self.config.iterations;
        let paths = &self.paths;
        let toolbox = &mut self.toolbox;

        info!(
            iterations = n,
            dem = %paths.dem.display(),
            scratch = %paths.scratch_dir.display(),
            "starting stochastic simulation"
        );

        for severity in Severity::ALL {
            toolbox.new_raster_from_base(&paths.dem, &paths.frequency(severity), 0.0)?;
        }

        let random = paths.transient(Transient::RandomField);
        let smoothed = paths.transient(Transient::SmoothedField);
        let error_model = paths.transient(Transient::ErrorModel);
        let dem = paths.transient(Transient::PerturbedDem);
        let slope = paths.transient(Transient::Slope);
        let breached = paths.transient(Transient::BreachedDem);
        let hand = paths.transient(Transient::Hand);
        let distance = paths.transient(Transient::StreamDistance);
        let overlay = paths.transient(Transient::Overlay);

        let weights = &self.config.overlay;
        let factors = [
            overlay_input(&slope, &weights.slope),
            overlay_input(&hand, &weights.hand),
            overlay_input(&distance, &weights.stream_distance),
            overlay_input(&paths.land_use, &weights.land_use),
            overlay_input(&paths.dam_proximity, &weights.dam_proximity),
        ];

        for i in 1..=n {
            observer.on_iteration(i, n);
            debug!(iteration = i, total = n, "iteration");

            let step = |name: &'static str| {
                move |source| SimulationError::Step {
                    iteration: i,
                    step: name,
                    source,
                }
            };

            toolbox.random_field(&paths.dem, &random).map_err(step("random_field"))?;
            toolbox
                .gaussian_filter(&random, &smoothed, self.config.gaussian_sigma)
                .map_err(step("gaussian_filter"))?;
            toolbox
                .multiply(&smoothed, self.config.rmse, &error_model)
                .map_err(step("multiply"))?;
            toolbox.add(&error_model, &paths.dem, &dem).map_err(step("add"))?;

            toolbox.slope(&dem, &slope).map_err(step("slope"))?;
            toolbox
                .breach_depressions_least_cost(&dem, &breached, self.config.breach_distance)
                .map_err(step("breach_depressions_least_cost"))?;
            toolbox
                .elevation_above_stream(&breached, &paths.river, &hand)
                .map_err(step("elevation_above_stream"))?;
            toolbox
                .downslope_distance_to_stream(&breached, &paths.river, &distance)
                .map_err(step("downslope_distance_to_stream"))?;

            toolbox
                .weighted_overlay(&factors, weights.scale_max, &overlay)
                .map_err(step("weighted_overlay"))?;

            for severity in Severity::ALL {
                let cells = paths.transient(Transient::Exceedance(severity));
                toolbox
                    .greater_than(&overlay, severity.threshold(&self.config.thresholds), &cells)
                    .map_err(step("greater_than"))?;
                toolbox
                    .in_place_add(&paths.frequency(severity), &cells)
                    .map_err(step("in_place_add"))?;
            }
        }

        observer.on_finalize();
        info!("Calculating uncertainty...");

        for severity in Severity::ALL {
            toolbox.divide(&paths.frequency(severity), n as f64, &paths.uncertainty(severity))?;
        }

        let elapsed = start.elapsed();
        info!("Stochastic simulation completed in: {}", format_elapsed(elapsed));

        if !self.config.keep_transients {
            remove_transients(paths);
        }

        Ok(SimulationOutcome {
            iterations: n,
            elapsed,
            frequency: Severity::ALL.map(|s| paths.frequency(s)),
            uncertainty: Severity::ALL.map(|s| paths.uncertainty(s)),
        })
    }
}

fn overlay_input<'a>(raster: &'a Path, factor: &FactorWeight) -> OverlayInput<'a> {
    OverlayInput {
        raster,
        weight: factor.weight,
        cost: factor.cost,
    }
}

/// The weight sum when it is off from 1 by more than the tolerance
pub(crate) fn unnormalized_weight_sum(overlay: &OverlayWeights) -> Option<f64> {
    let sum = overlay.weight_sum();
    ((sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE).then_some(sum)
}

/// Delete the last iteration's transient rasters. Failures are logged only.
fn remove_transients(paths: &RunPaths) {
    for transient in Transient::ALL {
        let path = paths.transient(transient);
        remove_if_present(&path);
    }
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed transient"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove transient"),
    }
}

/// Render a duration as `H:MM:SS.ss` (hundredths truncated).
pub fn format_elapsed(elapsed: Duration) -> String {
    let centis = elapsed.as_millis() / 10;
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let seconds = (centis / 100) % 60;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_sum_tolerance() {
        let mut overlay = OverlayWeights::default();
        assert_eq!(unnormalized_weight_sum(&overlay), None);

        overlay.land_use.weight += 0.5e-6;
        assert_eq!(unnormalized_weight_sum(&overlay), None);

        overlay.land_use.weight = 2.0;
        let sum = unnormalized_weight_sum(&overlay).unwrap();
        assert!((sum - 2.73).abs() < 1e-9, "sum = {}", sum);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0:00:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(5_129)), "0:00:05.12");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "1:02:05.00");
        assert_eq!(
            format_elapsed(Duration::from_secs(36_000 + 59 * 60 + 59)),
            "10:59:59.00"
        );
    }
}
