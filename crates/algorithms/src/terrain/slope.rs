//! Slope calculation from DEMs
//!
//! Rate of change of elevation using the Horn (1981) 3x3 finite differences.
//! Unlike a strict 3x3 operator this version fills missing neighbours
//! (outside the grid or nodata) with the centre elevation, so every valid
//! DEM cell, including the outer ring, receives a slope value.

use ndarray::Array2;
use crate::maybe_rayon::*;
use stochvuln_core::raster::Raster;
use stochvuln_core::{Error, Result};

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    /// Degrees (0-90)
    #[default]
    Degrees,
    /// Percent rise (0-infinity)
    Percent,
    /// Radians (0-π/2)
    Radians,
}

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    /// Output units
    pub units: SlopeUnits,
    /// Vertical exaggeration applied to elevation differences (default 1.0)
    pub z_factor: f64,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
        }
    }
}

/// Calculate slope from a DEM
///
/// Uses Horn's (1981) method with a 3x3 neighborhood:
/// ```text
/// a b c
/// d e f
/// g h i
/// ```
///
/// dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * cellsize)
/// dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * cellsize)
/// slope = atan(z_factor * sqrt(dz/dx² + dz/dy²))
///
/// Nodata DEM cells stay nodata (NaN) in the output.
pub fn slope(dem: &Raster<f64>, params: SlopeParams) -> Result<Raster<f64>> {
    if !(params.z_factor > 0.0) {
        return Err(Error::invalid_param("z_factor", params.z_factor, "must be > 0"));
    }

    let (rows, cols) = dem.shape();
    let eight_cell_size = 8.0 * dem.cell_size();
    let z_factor = params.z_factor;

    let value_or = |row: isize, col: isize, fallback: f64| -> f64 {
        if row < 0 || col < 0 || row >= rows as isize || col >= cols as isize {
            return fallback;
        }
        let v = unsafe { dem.get_unchecked(row as usize, col as usize) };
        if dem.is_nodata(v) { fallback } else { v }
    };

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for col in 0..cols {
                let e = unsafe { dem.get_unchecked(row, col) };
                if dem.is_nodata(e) {
                    continue;
                }

                let (r, c) = (row as isize, col as isize);
                let a = value_or(r - 1, c - 1, e);
                let b = value_or(r - 1, c, e);
                let cc = value_or(r - 1, c + 1, e);
                let d = value_or(r, c - 1, e);
                let f = value_or(r, c + 1, e);
                let g = value_or(r + 1, c - 1, e);
                let h = value_or(r + 1, c, e);
                let i = value_or(r + 1, c + 1, e);

                let dz_dx = ((cc + 2.0 * f + i) - (a + 2.0 * d + g)) / eight_cell_size;
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + cc)) / eight_cell_size;

                let slope_rad = (z_factor * (dz_dx * dz_dx + dz_dy * dz_dy).sqrt()).atan();

                row_data[col] = match params.units {
                    SlopeUnits::Degrees => slope_rad.to_degrees(),
                    SlopeUnits::Percent => slope_rad.tan() * 100.0,
                    SlopeUnits::Radians => slope_rad,
                };
            }

            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}
