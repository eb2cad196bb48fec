//! Simulation configuration.
//!
//! A `SimulationConfig` is plain serde data, normally loaded from a JSON file
//! and then patched by command-line overrides. [`SimulationConfig::validate`]
//! is the single gate every run goes through before any raster is touched.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SimulationError};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Static input rasters. Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRasters {
    /// Base DEM; every output shares its grid
    pub dem: PathBuf,
    pub land_use: PathBuf,
    /// Rasterized river network (cells > 0 are streams)
    pub river: PathBuf,
    /// Distance-to-dam raster
    pub dam_proximity: PathBuf,
}

impl Default for InputRasters {
    fn default() -> Self {
        Self {
            dem: PathBuf::from("merseyMosaic.tif"),
            land_use: PathBuf::from("LandUse_ReclassifiedInvert.tif"),
            river: PathBuf::from("RasterizedRiver.tif"),
            dam_proximity: PathBuf::from("Proximity_Dams.tif"),
        }
    }
}

/// Overlay score thresholds; a cell is vulnerable at a level when its score
/// is strictly greater than the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 15.0,
            moderate: 25.0,
            high: 40.0,
        }
    }
}

/// Weight and direction of one overlay factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeight {
    pub weight: f64,
    /// When true, low raw values score high
    #[serde(default)]
    pub cost: bool,
}

impl FactorWeight {
    pub fn new(weight: f64) -> Self {
        Self { weight, cost: false }
    }
}

/// Weighted overlay settings, one entry per factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayWeights {
    /// Upper end of the range every factor is rescaled to
    pub scale_max: f64,
    pub slope: FactorWeight,
    pub hand: FactorWeight,
    pub stream_distance: FactorWeight,
    pub land_use: FactorWeight,
    pub dam_proximity: FactorWeight,
}

impl OverlayWeights {
    /// Factors in overlay order: slope, HAND, downslope distance, land use,
    /// dam proximity.
    pub fn factors(&self) -> [(&'static str, FactorWeight); 5] {
        [
            ("slope", self.slope),
            ("hand", self.hand),
            ("stream_distance", self.stream_distance),
            ("land_use", self.land_use),
            ("dam_proximity", self.dam_proximity),
        ]
    }

    pub fn weight_sum(&self) -> f64 {
        self.factors().iter().map(|(_, f)| f.weight).sum()
    }
}

impl Default for OverlayWeights {
    fn default() -> Self {
        Self {
            scale_max: 100.0,
            slope: FactorWeight::new(0.226),
            hand: FactorWeight::new(0.221),
            stream_distance: FactorWeight::new(0.165),
            land_use: FactorWeight::new(0.270),
            dam_proximity: FactorWeight::new(0.118),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level configuration
// ---------------------------------------------------------------------------

/// Full configuration of a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Directory holding the inputs and receiving the final rasters
    pub working_dir: PathBuf,

    /// Directory for per-iteration transients (defaults to `working_dir`)
    pub scratch_dir: Option<PathBuf>,

    /// File name prefix for transients (defaults to `mc<pid>`)
    pub run_prefix: Option<String>,

    pub inputs: InputRasters,
    pub thresholds: Thresholds,

    /// Vertical RMSE of the DEM, in elevation units
    pub rmse: f64,

    /// Gaussian filter sigma applied to the random field, in cells
    pub gaussian_sigma: f64,

    pub iterations: usize,

    /// Search window (cells) for least-cost breaching
    pub breach_distance: usize,

    pub overlay: OverlayWeights,

    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,

    /// Keep the last iteration's transient rasters after a successful run
    pub keep_transients: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            scratch_dir: None,
            run_prefix: None,
            inputs: InputRasters::default(),
            thresholds: Thresholds::default(),
            rmse: 6.6,
            gaussian_sigma: 3.0,
            iterations: 50,
            breach_distance: 128,
            overlay: OverlayWeights::default(),
            seed: None,
            keep_transients: false,
        }
    }
}

impl SimulationConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve a path against the working directory unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Check every numeric parameter and the overlay weight set.
    ///
    /// Thresholds must be strictly ascending (`low < moderate < high`) so that
    /// exceedance frequencies are nested cell by cell. Weights need not sum to
    /// one; the overlay normalizes them.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SimulationError::invalid_config("iterations", "must be at least 1"));
        }
        if !(self.rmse.is_finite() && self.rmse > 0.0) {
            return Err(SimulationError::invalid_config(
                "rmse",
                format!("must be finite and > 0, got {}", self.rmse),
            ));
        }
        if !(self.gaussian_sigma.is_finite() && self.gaussian_sigma > 0.0) {
            return Err(SimulationError::invalid_config(
                "gaussian_sigma",
                format!("must be finite and > 0, got {}", self.gaussian_sigma),
            ));
        }
        if self.breach_distance == 0 {
            return Err(SimulationError::invalid_config(
                "breach_distance",
                "must be at least 1 cell",
            ));
        }

        let t = &self.thresholds;
        for (field, value) in [
            ("thresholds.low", t.low),
            ("thresholds.moderate", t.moderate),
            ("thresholds.high", t.high),
        ] {
            if !value.is_finite() {
                return Err(SimulationError::invalid_config(
                    field,
                    format!("must be finite, got {}", value),
                ));
            }
        }
        if !(t.low < t.moderate && t.moderate < t.high) {
            return Err(SimulationError::invalid_config(
                "thresholds",
                format!(
                    "must ascend (low < moderate < high), got {} / {} / {}",
                    t.low, t.moderate, t.high
                ),
            ));
        }

        let overlay = &self.overlay;
        if !(overlay.scale_max.is_finite() && overlay.scale_max > 0.0) {
            return Err(SimulationError::invalid_config(
                "overlay.scale_max",
                format!("must be finite and > 0, got {}", overlay.scale_max),
            ));
        }
        for (name, factor) in overlay.factors() {
            if !(factor.weight.is_finite() && factor.weight >= 0.0) {
                return Err(SimulationError::invalid_config(
                    "overlay",
                    format!("weight of `{}` must be finite and >= 0, got {}", name, factor.weight),
                ));
            }
        }
        if overlay.weight_sum() <= 0.0 {
            return Err(SimulationError::invalid_config(
                "overlay",
                "at least one weight must be > 0",
            ));
        }

        if let Some(prefix) = &self.run_prefix {
            if prefix.is_empty() || prefix.contains(['/', '\\']) {
                return Err(SimulationError::invalid_config(
                    "run_prefix",
                    format!("must be a non-empty file name fragment, got {:?}", prefix),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_relative_eq!(config.overlay.weight_sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config =
            SimulationConfig::from_json_str(r#"{ "iterations": 3, "rmse": 1.5 }"#).unwrap();
        assert_eq!(config.iterations, 3);
        assert_eq!(config.rmse, 1.5);
        assert_eq!(config.breach_distance, 128);
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn test_json_round_trip_keeps_cost_flags() {
        let mut config = SimulationConfig::default();
        config.overlay.dam_proximity.cost = true;
        let text = config.to_json_pretty().unwrap();
        assert_eq!(SimulationConfig::from_json_str(&text).unwrap(), config);
    }

    /// Whether `validate` fails once `edit` has been applied to the defaults
    fn rejects(edit: impl FnOnce(&mut SimulationConfig)) -> bool {
        let mut config = SimulationConfig::default();
        edit(&mut config);
        config.validate().is_err()
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = SimulationConfig {
            iterations: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(SimulationError::InvalidConfig { field, .. }) => assert_eq!(field, "iterations"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_rmse_and_sigma() {
        assert!(rejects(|c| c.rmse = 0.0));
        assert!(rejects(|c| c.rmse = f64::NAN));
        assert!(rejects(|c| c.gaussian_sigma = -1.0));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        assert!(rejects(|c| {
            c.thresholds = Thresholds {
                low: 25.0,
                moderate: 15.0,
                high: 40.0,
            }
        }));
        assert!(rejects(|c| c.thresholds.moderate = c.thresholds.low));
        assert!(rejects(|c| c.thresholds.high = f64::INFINITY));
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut config = SimulationConfig::default();
        config.overlay.hand.weight = -0.1;
        assert!(config.validate().is_err());

        let mut zero = SimulationConfig::default();
        for f in [
            &mut zero.overlay.slope,
            &mut zero.overlay.hand,
            &mut zero.overlay.stream_distance,
            &mut zero.overlay.land_use,
            &mut zero.overlay.dam_proximity,
        ] {
            f.weight = 0.0;
        }
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_unnormalized_weights_accepted() {
        let mut config = SimulationConfig::default();
        config.overlay.land_use.weight = 5.0;
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_breach_distance_and_bad_prefix() {
        assert!(rejects(|c| c.breach_distance = 0));
        assert!(rejects(|c| c.run_prefix = Some("a/b".into())));
        assert!(rejects(|c| c.run_prefix = Some(String::new())));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = SimulationConfig {
            working_dir: PathBuf::from("/data/run"),
            ..Default::default()
        };
        assert_eq!(config.resolve(Path::new("dem.tif")), PathBuf::from("/data/run/dem.tif"));
        assert_eq!(config.resolve(Path::new("/abs/dem.tif")), PathBuf::from("/abs/dem.tif"));
    }
}
