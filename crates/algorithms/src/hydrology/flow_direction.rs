//! D8 flow direction algorithm
//!
//! Calculates the direction of flow from each cell to its steepest
//! downslope neighbor using the D8 (deterministic eight-node) method.
//!
//! Flow direction encoding:
//! ```text
//!   4  3  2
//!   5  0  1
//!   6  7  8
//! ```
//! 0 = pit/flat (no outflow), 1-8 = direction to steepest neighbor

use ndarray::Array2;
use crate::maybe_rayon::*;
use stochvuln_core::raster::{d8, Raster};
use stochvuln_core::{Error, Result};

/// Calculate D8 flow direction from a DEM.
///
/// The input DEM should be hydrologically conditioned (see
/// [`breach_depressions`](super::breach_depressions)) so every cell has a
/// downslope path. Ties keep the first direction in code order.
///
/// # Direction Encoding
/// ```text
///   4  3  2
///   5  0  1
///   6  7  8
/// ```
/// - `0` = pit or flat (no downslope neighbor)
/// - `1`-`8` = direction to the steepest downslope neighbor
///
/// # Arguments
/// * `dem` - Input DEM (ideally breached or filled)
///
/// # Returns
/// Raster<u8> with flow direction codes
pub fn flow_direction(dem: &Raster<f64>) -> Result<Raster<u8>> {
    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();

    let output_data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];

            for col in 0..cols {
                let center = unsafe { dem.get_unchecked(row, col) };
                if dem.is_nodata(center) {
                    continue;
                }

                let mut max_drop = 0.0_f64;
                let mut best_dir: u8 = 0;

                for dir in 1..=8u8 {
                    let Some((nr, nc)) = d8::step(row, col, dir, rows, cols) else {
                        continue;
                    };
                    let neighbor = unsafe { dem.get_unchecked(nr, nc) };
                    if dem.is_nodata(neighbor) {
                        continue;
                    }

                    let drop = (center - neighbor) / (d8::DISTANCES[dir as usize] * cell_size);
                    if drop > max_drop {
                        max_drop = drop;
                        best_dir = dir;
                    }
                }

                row_data[col] = best_dir;
            }

            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(0));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stochvuln_core::GeoTransform;

    /// 5x5 plane `z = a*row + b*col`, returning the code at the centre
    fn centre_direction(a: f64, b: f64) -> u8 {
        let mut dem = Raster::new(5, 5);
        dem.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        for row in 0..5 {
            for col in 0..5 {
                dem.set(row, col, 50.0 + a * row as f64 + b * col as f64).unwrap();
            }
        }
        flow_direction(&dem).unwrap().get(2, 2).unwrap()
    }

    #[test]
    fn test_planes_drain_downhill() {
        // (row gradient, col gradient, expected code)
        let cases = [
            (0.0, -10.0, 1),  // falls east
            (10.0, 0.0, 3),   // falls north
            (0.0, 10.0, 5),   // falls west
            (-10.0, 0.0, 7),  // falls south
            (-10.0, -10.0, 8),
            (10.0, 10.0, 4),
        ];
        for (a, b, expected) in cases {
            assert_eq!(centre_direction(a, b), expected, "plane ({}, {})", a, b);
        }
    }

    #[test]
    fn test_pit_and_flat_have_no_direction() {
        let mut dem = Raster::filled(3, 3, 10.0);
        let flat = flow_direction(&dem).unwrap();
        assert!(flat.data().iter().all(|&d| d == 0));

        dem.set(1, 1, 1.0).unwrap();
        let pit = flow_direction(&dem).unwrap();
        assert_eq!(pit.get(1, 1).unwrap(), 0);
        // Every rim cell drains into the pit
        assert_eq!(pit.get(0, 0).unwrap(), 8);
        assert_eq!(pit.get(2, 1).unwrap(), 3);
    }

    #[test]
    fn test_flow_direction_skips_nodata_neighbour() {
        let mut dem = Raster::filled(3, 3, 10.0);
        dem.set(1, 2, f64::NAN).unwrap();
        dem.set(2, 1, 5.0).unwrap();

        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir.get(1, 1).unwrap(), 7);
        assert_eq!(fdir.get(1, 2).unwrap(), 0);
    }
}
