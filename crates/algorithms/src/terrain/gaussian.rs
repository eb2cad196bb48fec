//! Gaussian filter
//!
//! Isotropic Gaussian low-pass filter with a precomputed, normalized kernel:
//! G(x,y) = exp(-(x²+y²)/(2σ²)). Sigma is given in cells and the kernel is
//! truncated at `ceil(3σ)` cells. Kernel weights are renormalized over the
//! valid neighbours of each cell, so grid edges and nodata gaps do not bias
//! the result toward zero.

use ndarray::Array2;
use crate::maybe_rayon::*;
use stochvuln_core::raster::Raster;
use stochvuln_core::{Error, Result};

/// Parameters for the Gaussian filter
#[derive(Debug, Clone)]
pub struct GaussianFilterParams {
    /// Standard deviation in cells (must be > 0)
    pub sigma: f64,
}

impl Default for GaussianFilterParams {
    fn default() -> Self {
        Self { sigma: 0.75 }
    }
}

/// Kernel half width for a given sigma
pub(crate) fn kernel_radius(sigma: f64) -> usize {
    ((3.0 * sigma).ceil() as usize).max(1)
}

/// Apply a Gaussian filter to a raster.
///
/// Nodata cells stay nodata and do not contribute to their neighbours.
pub fn gaussian_filter(raster: &Raster<f64>, params: GaussianFilterParams) -> Result<Raster<f64>> {
    if !(params.sigma > 0.0) || !params.sigma.is_finite() {
        return Err(Error::invalid_param("sigma", params.sigma, "must be finite and > 0"));
    }

    let (rows, cols) = raster.shape();
    let radius = kernel_radius(params.sigma);
    let r = radius as isize;
    let two_sigma_sq = 2.0 * params.sigma * params.sigma;

    let kernel_size = 2 * radius + 1;
    let mut kernel = vec![0.0_f64; kernel_size * kernel_size];
    for dr in -r..=r {
        for dc in -r..=r {
            let dist_sq = (dr * dr + dc * dc) as f64;
            let idx = ((dr + r) as usize) * kernel_size + (dc + r) as usize;
            kernel[idx] = (-dist_sq / two_sigma_sq).exp();
        }
    }

    let data = raster.data();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                if raster.is_nodata(data[(row, col)]) {
                    continue;
                }

                let mut sum = 0.0;
                let mut wsum = 0.0;

                for dr in -r..=r {
                    let nr = row as isize + dr;
                    if nr < 0 || (nr as usize) >= rows { continue; }

                    for dc in -r..=r {
                        let nc = col as isize + dc;
                        if nc < 0 || (nc as usize) >= cols { continue; }

                        let z = data[(nr as usize, nc as usize)];
                        if raster.is_nodata(z) { continue; }

                        let w = kernel[((dr + r) as usize) * kernel_size + (dc + r) as usize];
                        sum += z * w;
                        wsum += w;
                    }
                }

                if wsum > 0.0 {
                    row_data[col] = sum / wsum;
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}
