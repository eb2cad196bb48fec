//! File layout of a run.
//!
//! Final rasters go to the working directory under fixed names. Per-iteration
//! transients go to the scratch directory as `<prefix>_<name>.tif` and are
//! overwritten every iteration.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{SimulationConfig, Thresholds};

/// Vulnerability severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Moderate, Severity::High];

    /// Short label used in file names
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "mod",
            Severity::High => "high",
        }
    }

    pub fn threshold(self, thresholds: &Thresholds) -> f64 {
        match self {
            Severity::Low => thresholds.low,
            Severity::Moderate => thresholds.moderate,
            Severity::High => thresholds.high,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
        })
    }
}

/// Rasters rewritten on every iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transient {
    RandomField,
    SmoothedField,
    ErrorModel,
    PerturbedDem,
    Slope,
    BreachedDem,
    Hand,
    StreamDistance,
    Overlay,
    Exceedance(Severity),
}

impl Transient {
    pub const ALL: [Transient; 12] = [
        Transient::RandomField,
        Transient::SmoothedField,
        Transient::ErrorModel,
        Transient::PerturbedDem,
        Transient::Slope,
        Transient::BreachedDem,
        Transient::Hand,
        Transient::StreamDistance,
        Transient::Overlay,
        Transient::Exceedance(Severity::Low),
        Transient::Exceedance(Severity::Moderate),
        Transient::Exceedance(Severity::High),
    ];

    fn stem(self) -> &'static str {
        match self {
            Transient::RandomField => "random_field",
            Transient::SmoothedField => "smoothed_field",
            Transient::ErrorModel => "error_model",
            Transient::PerturbedDem => "perturbed_dem",
            Transient::Slope => "slope",
            Transient::BreachedDem => "breached_dem",
            Transient::Hand => "hand",
            Transient::StreamDistance => "downslope_distance",
            Transient::Overlay => "overlay",
            Transient::Exceedance(Severity::Low) => "low_vuln_cells",
            Transient::Exceedance(Severity::Moderate) => "mod_vuln_cells",
            Transient::Exceedance(Severity::High) => "high_vuln_cells",
        }
    }
}

/// Resolved input, output and scratch paths of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub working_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub prefix: String,
    pub dem: PathBuf,
    pub land_use: PathBuf,
    pub river: PathBuf,
    pub dam_proximity: PathBuf,
}

impl RunPaths {
    pub fn new(config: &SimulationConfig) -> Self {
        let scratch_dir = match &config.scratch_dir {
            Some(dir) => config.resolve(dir),
            None => config.working_dir.clone(),
        };
        let prefix = config
            .run_prefix
            .clone()
            .unwrap_or_else(|| format!("mc{}", std::process::id()));

        Self {
            working_dir: config.working_dir.clone(),
            scratch_dir,
            prefix,
            dem: config.resolve(&config.inputs.dem),
            land_use: config.resolve(&config.inputs.land_use),
            river: config.resolve(&config.inputs.river),
            dam_proximity: config.resolve(&config.inputs.dam_proximity),
        }
    }

    /// Named static inputs, in the order they are checked
    pub fn inputs(&self) -> [(&'static str, &Path); 4] {
        [
            ("dem", self.dem.as_path()),
            ("land_use", self.land_use.as_path()),
            ("river", self.river.as_path()),
            ("dam_proximity", self.dam_proximity.as_path()),
        ]
    }

    pub fn transient(&self, transient: Transient) -> PathBuf {
        self.scratch_dir
            .join(format!("{}_{}.tif", self.prefix, transient.stem()))
    }

    /// Accumulated exceedance count for a severity level
    pub fn frequency(&self, severity: Severity) -> PathBuf {
        self.working_dir
            .join(format!("{}_vulnerability_freq.tif", severity.label()))
    }

    /// Frequency divided by the number of iterations
    pub fn uncertainty(&self, severity: Severity) -> PathBuf {
        self.working_dir
            .join(format!("{}_final_uncertainty.tif", severity.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            working_dir: PathBuf::from("/work"),
            run_prefix: Some("t1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_output_names() {
        let paths = RunPaths::new(&config());
        assert_eq!(
            paths.frequency(Severity::Low),
            PathBuf::from("/work/low_vulnerability_freq.tif")
        );
        assert_eq!(
            paths.frequency(Severity::Moderate),
            PathBuf::from("/work/mod_vulnerability_freq.tif")
        );
        assert_eq!(
            paths.uncertainty(Severity::High),
            PathBuf::from("/work/high_final_uncertainty.tif")
        );
    }

    #[test]
    fn test_transients_use_prefix_and_scratch() {
        let mut cfg = config();
        cfg.scratch_dir = Some(PathBuf::from("tmp"));
        let paths = RunPaths::new(&cfg);
        assert_eq!(paths.transient(Transient::Slope), PathBuf::from("/work/tmp/t1_slope.tif"));
        assert_eq!(
            paths.transient(Transient::Exceedance(Severity::Moderate)),
            PathBuf::from("/work/tmp/t1_mod_vuln_cells.tif")
        );
    }

    #[test]
    fn test_transient_names_unique() {
        let paths = RunPaths::new(&config());
        let mut names: Vec<PathBuf> = Transient::ALL.iter().map(|t| paths.transient(*t)).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Transient::ALL.len());
    }

    #[test]
    fn test_default_prefix_uses_pid() {
        let paths = RunPaths::new(&SimulationConfig::default());
        assert_eq!(paths.prefix, format!("mc{}", std::process::id()));
        assert_eq!(paths.scratch_dir, paths.working_dir);
    }

    #[test]
    fn test_inputs_resolved_against_working_dir() {
        let paths = RunPaths::new(&config());
        assert_eq!(paths.dem, PathBuf::from("/work/merseyMosaic.tif"));
    }
}
