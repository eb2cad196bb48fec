//! Weighted overlay for multi-criteria evaluation
//!
//! Each factor raster is stretched linearly from its own valid range
//! `[min, max]` onto `[0, scale_max]`. Factors flagged as costs are inverted
//! (`scale_max - stretched`) so that a higher score always means "more
//! vulnerable". Weights are normalized to sum to one and the overlay score is
//! the weighted sum of the stretched factors.

use ndarray::Array2;
use crate::maybe_rayon::*;
use stochvuln_core::raster::Raster;
use stochvuln_core::{Error, Result};

/// One input layer of the overlay
#[derive(Debug, Clone, Copy)]
pub struct OverlayFactor<'a> {
    pub raster: &'a Raster<f64>,
    /// Relative importance (>= 0); normalized against the other weights
    pub weight: f64,
    /// Whether high raw values are *less* vulnerable
    pub cost: bool,
}

/// Parameters for the weighted overlay
#[derive(Debug, Clone)]
pub struct WeightedOverlayParams {
    /// Upper end of the common suitability scale (default 1.0)
    pub scale_max: f64,
}

impl Default for WeightedOverlayParams {
    fn default() -> Self {
        Self { scale_max: 1.0 }
    }
}

/// Linear stretch of one factor onto `[0, scale_max]`
#[derive(Debug, Clone, Copy)]
struct Stretch {
    min: f64,
    range: f64,
    weight: f64,
    cost: bool,
}

impl Stretch {
    fn rescale(&self, v: f64, scale_max: f64) -> f64 {
        // A constant factor carries no contrast and maps to the bottom of the scale
        let s = if self.range > 0.0 {
            (v - self.min) / self.range * scale_max
        } else {
            0.0
        };
        if self.cost { scale_max - s } else { s }
    }
}

/// Combine factor rasters into a single weighted score.
///
/// All factors must share the same dimensions. Factors with zero weight are
/// ignored entirely (their nodata does not mask the output). A cell is
/// nodata when any contributing factor is nodata there.
///
/// # Errors
/// Empty factor list, negative or non-finite weights, all-zero weights,
/// `scale_max <= 0`, mismatched dimensions, or a contributing factor with
/// no valid cells.
pub fn weighted_overlay(
    factors: &[OverlayFactor<'_>],
    params: WeightedOverlayParams,
) -> Result<Raster<f64>> {
    let first = factors
        .first()
        .ok_or_else(|| Error::Algorithm("weighted overlay needs at least one factor".into()))?;

    if !(params.scale_max > 0.0) || !params.scale_max.is_finite() {
        return Err(Error::invalid_param("scale_max", params.scale_max, "must be finite and > 0"));
    }

    let mut weight_sum = 0.0;
    for f in factors {
        if !(f.weight >= 0.0) || !f.weight.is_finite() {
            return Err(Error::invalid_param("weight", f.weight, "must be finite and >= 0"));
        }
        first.raster.ensure_same_shape(f.raster)?;
        weight_sum += f.weight;
    }
    if weight_sum <= 0.0 {
        return Err(Error::invalid_param("weight", weight_sum, "weights must not all be zero"));
    }

    let mut active: Vec<(&Raster<f64>, Stretch)> = Vec::with_capacity(factors.len());
    for f in factors.iter().filter(|f| f.weight > 0.0) {
        let stats = f.raster.statistics();
        let (min, max) = match (stats.min, stats.max) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(Error::Algorithm(
                    "weighted overlay factor has no valid cells".into(),
                ))
            }
        };
        active.push((
            f.raster,
            Stretch {
                min,
                range: max - min,
                weight: f.weight / weight_sum,
                cost: f.cost,
            },
        ));
    }

    let (rows, cols) = first.raster.shape();
    let scale_max = params.scale_max;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            'cells: for col in 0..cols {
                let mut score = 0.0;
                for (raster, stretch) in &active {
                    let v = unsafe { raster.get_unchecked(row, col) };
                    if raster.is_nodata(v) {
                        continue 'cells;
                    }
                    score += stretch.weight * stretch.rescale(v, scale_max);
                }
                row_data[col] = score;
            }
            row_data
        })
        .collect();

    let mut output = first.raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 1x5 ramp: 0, 10, 20, 30, 40
    fn ramp() -> Raster<f64> {
        Raster::from_vec(vec![0.0, 10.0, 20.0, 30.0, 40.0], 1, 5).unwrap()
    }

    fn benefit(raster: &Raster<f64>, weight: f64) -> OverlayFactor<'_> {
        OverlayFactor {
            raster,
            weight,
            cost: false,
        }
    }

    fn percent() -> WeightedOverlayParams {
        WeightedOverlayParams { scale_max: 100.0 }
    }

    #[test]
    fn test_single_factor_is_rescaled() {
        let r = ramp();
        let out = weighted_overlay(&[benefit(&r, 1.0)], percent()).unwrap();

        let values: Vec<f64> = out.data().iter().copied().collect();
        assert_eq!(values, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_cost_factor_is_inverted() {
        let r = ramp();
        let factor = OverlayFactor {
            cost: true,
            ..benefit(&r, 1.0)
        };
        let out = weighted_overlay(&[factor], percent()).unwrap();

        assert_relative_eq!(out.get(0, 0).unwrap(), 100.0);
        assert_relative_eq!(out.get(0, 4).unwrap(), 0.0);
    }

    #[test]
    fn test_weights_are_normalized() {
        let a = ramp();
        let b = Raster::from_vec(vec![4.0, 3.0, 2.0, 1.0, 0.0], 1, 5).unwrap();

        // 3:1 is the same as 0.75:0.25
        let raw = weighted_overlay(&[benefit(&a, 3.0), benefit(&b, 1.0)], percent()).unwrap();
        let unit = weighted_overlay(&[benefit(&a, 0.75), benefit(&b, 0.25)], percent()).unwrap();

        assert_relative_eq!(raw.get(0, 0).unwrap(), 25.0, epsilon = 1e-12);
        assert_relative_eq!(raw.get(0, 2).unwrap(), 50.0, epsilon = 1e-12);
        assert_relative_eq!(raw.get(0, 4).unwrap(), 75.0, epsilon = 1e-12);
        for (x, y) in raw.data().iter().zip(unit.data().iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_factor_maps_to_zero() {
        let flat = Raster::filled(1, 5, 7.0);
        let out = weighted_overlay(&[benefit(&flat, 1.0)], percent()).unwrap();
        assert!(out.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_zero_weight_factor_does_not_mask() {
        let a = ramp();
        let mut b = ramp();
        b.set(0, 1, f64::NAN).unwrap();

        let out = weighted_overlay(&[benefit(&a, 1.0), benefit(&b, 0.0)], percent()).unwrap();
        assert_relative_eq!(out.get(0, 1).unwrap(), 25.0);

        let masked = weighted_overlay(&[benefit(&a, 1.0), benefit(&b, 0.5)], percent()).unwrap();
        assert!(masked.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_overlay_rejects_bad_input() {
        let a = ramp();
        let other = Raster::filled(2, 2, 1.0);

        assert!(weighted_overlay(&[], percent()).is_err());
        assert!(weighted_overlay(&[benefit(&a, 0.0)], percent()).is_err());
        assert!(weighted_overlay(&[benefit(&a, -1.0)], percent()).is_err());
        assert!(weighted_overlay(&[benefit(&a, 1.0), benefit(&other, 1.0)], percent()).is_err());

        let flat = WeightedOverlayParams { scale_max: 0.0 };
        assert!(weighted_overlay(&[benefit(&a, 1.0)], flat).is_err());
    }
}
