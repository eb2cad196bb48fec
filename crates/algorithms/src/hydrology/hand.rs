//! Elevation above stream (HAND, Height Above Nearest Drainage)
//!
//! For each cell, follows the D8 flow path downslope until the first stream
//! cell and reports the elevation difference between the two. Stream cells
//! are 0 and values grow away from the drainage network, which makes this a
//! common flood-exposure index.
//!
//! Reference:
//! Nobre, A.D. et al. (2011). HAND, a new terrain descriptor using
//! SRTM-DEM. *Mapping Ecology and Conservation*, 275–287.

use ndarray::Array2;
use stochvuln_core::raster::Raster;
use stochvuln_core::{Error, Result};

use super::stream_trace::trace_to_streams;

/// Compute elevation above the nearest downslope stream cell.
///
/// # Arguments
/// * `dem` - Hydrologically conditioned DEM
/// * `streams` - Stream raster on the same grid; cells with a valid value
///   greater than zero are streams
///
/// # Returns
/// Raster<f64> in DEM elevation units. Cells whose flow path ends in a pit,
/// at the grid edge or in nodata before meeting a stream are NaN.
pub fn elevation_above_stream(dem: &Raster<f64>, streams: &Raster<f64>) -> Result<Raster<f64>> {
    let trace = trace_to_streams(dem, streams)?;
    let (rows, cols) = dem.shape();

    let mut output_data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let value = trace
                .get(row, col)
                .map(|(sr, sc, _)| unsafe {
                    dem.get_unchecked(row, col) - dem.get_unchecked(sr, sc)
                })
                .unwrap_or(f64::NAN);
            output_data.push(value);
        }
    }

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}
