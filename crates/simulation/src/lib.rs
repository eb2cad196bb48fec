//! # stochvuln-simulation
//!
//! Monte Carlo uncertainty analysis for a terrain-based multi-criteria
//! vulnerability model.
//!
//! A [`Simulation`] sequences calls against a [`Toolbox`]: it perturbs a DEM
//! with Gaussian-smoothed random error scaled by the DEM's RMSE, derives
//! slope, HAND and downslope distance to stream from the perturbed surface,
//! combines them with land use and dam proximity in a weighted overlay, and
//! counts per cell how often the score exceeds each of three thresholds.
//! The counts divided by the number of iterations are the final
//! uncertainty rasters.
//!
//! [`GeoTiffToolbox`] implements the toolbox over GeoTIFF files with the
//! algorithms from `stochvuln-algorithms`.

pub mod config;
pub mod error;
pub mod geotiff_toolbox;
pub mod paths;
pub mod simulation;
pub mod toolbox;

pub use config::{FactorWeight, InputRasters, OverlayWeights, SimulationConfig, Thresholds};
pub use error::{Result, SimulationError};
pub use geotiff_toolbox::GeoTiffToolbox;
pub use paths::{RunPaths, Severity, Transient};
pub use simulation::{format_elapsed, NoProgress, ProgressObserver, Simulation, SimulationOutcome};
pub use toolbox::{OverlayInput, Toolbox};
