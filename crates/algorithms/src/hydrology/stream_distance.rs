//! Downslope distance to stream
//!
//! Length of the D8 flow path from each cell to the first stream cell it
//! drains into, in map units.

use ndarray::Array2;
use stochvuln_core::raster::Raster;
use stochvuln_core::{Error, Result};

use super::stream_trace::trace_to_streams;

/// Compute the downslope flow-path distance to the nearest stream.
///
/// Each D8 step counts one cell size (cardinal) or `sqrt(2)` cell sizes
/// (diagonal). Stream cells (valid and > 0 in `streams`) are 0; cells that
/// never reach a stream are NaN.
pub fn downslope_distance_to_stream(
    dem: &Raster<f64>,
    streams: &Raster<f64>,
) -> Result<Raster<f64>> {
    let trace = trace_to_streams(dem, streams)?;
    let (rows, cols) = dem.shape();

    let output_data: Vec<f64> = (0..rows * cols)
        .map(|i| trace.get(i / cols, i % cols).map_or(f64::NAN, |(_, _, d)| d))
        .collect();

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stochvuln_core::GeoTransform;

    fn nw_plane(cell: f64) -> (Raster<f64>, Raster<f64>) {
        let mut dem = Raster::new(4, 4);
        dem.set_transform(GeoTransform::new(0.0, 4.0 * cell, cell, -cell));
        for row in 0..4 {
            for col in 0..4 {
                dem.set(row, col, (row + col) as f64).unwrap();
            }
        }
        let mut streams = Raster::filled(4, 4, f64::NAN);
        streams.set(0, 0, 1.0).unwrap();
        (dem, streams)
    }

    #[test]
    fn test_cardinal_and_diagonal_steps() {
        let (dem, streams) = nw_plane(1.0);
        let result = downslope_distance_to_stream(&dem, &streams).unwrap();

        assert_eq!(result.get(0, 0).unwrap(), 0.0);
        assert_relative_eq!(result.get(0, 3).unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(
            result.get(2, 2).unwrap(),
            2.0 * std::f64::consts::SQRT_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_scaled_by_cell_size() {
        let (dem, streams) = nw_plane(30.0);
        let result = downslope_distance_to_stream(&dem, &streams).unwrap();
        assert_relative_eq!(result.get(3, 0).unwrap(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_valued_streams_ignored() {
        let (dem, _) = nw_plane(1.0);
        let streams = Raster::filled(4, 4, 0.0);
        let result = downslope_distance_to_stream(&dem, &streams).unwrap();
        assert!(result.data().iter().all(|v| v.is_nan()));
    }
}
