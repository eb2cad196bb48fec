//! Raster algebra
//!
//! Element-wise arithmetic between a raster and a scalar or between two
//! grid-aligned rasters, threshold tests, and in-place accumulation. Nodata
//! (NaN or the raster's declared nodata value) in any operand yields NaN.

use ndarray::{Array2, Zip};
use crate::maybe_rayon::*;
use stochvuln_core::raster::Raster;
use stochvuln_core::{Error, RasterElement, Result};

/// Arithmetic operator shared by scalar and binary raster math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Multiply,
    Divide,
}

impl MathOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MathOp::Add => a + b,
            MathOp::Multiply => a * b,
            MathOp::Divide => {
                if b == 0.0 {
                    f64::NAN
                } else {
                    a / b
                }
            }
        }
    }
}

/// Row-parallel map over valid cells; invalid cells become NaN
fn map_valid<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let val = unsafe { raster.get_unchecked(row, col) };
                if !raster.is_nodata(val) {
                    row_data[col] = f(val);
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

/// Apply `raster <op> scalar` to every valid cell.
///
/// Division by a zero scalar is rejected rather than producing a NaN grid.
pub fn scalar_op(raster: &Raster<f64>, scalar: f64, op: MathOp) -> Result<Raster<f64>> {
    if !scalar.is_finite() {
        return Err(Error::invalid_param("scalar", scalar, "must be finite"));
    }
    if op == MathOp::Divide && scalar == 0.0 {
        return Err(Error::invalid_param("scalar", scalar, "division by zero"));
    }
    map_valid(raster, |v| op.apply(v, scalar))
}

/// Apply `a <op> b` element-wise.
///
/// Both rasters must have the same dimensions. A zero divisor cell yields NaN.
pub fn binary_op(a: &Raster<f64>, b: &Raster<f64>, op: MathOp) -> Result<Raster<f64>> {
    a.ensure_same_shape(b)?;

    let (rows, cols) = a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };
                if a.is_nodata(va) || b.is_nodata(vb) {
                    continue;
                }
                row_data[col] = op.apply(va, vb);
            }
            row_data
        })
        .collect();

    let mut output = a.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

/// Boolean raster: 1 where the cell is strictly greater than `threshold`, else 0.
///
/// Nodata cells stay nodata.
pub fn greater_than(raster: &Raster<f64>, threshold: f64) -> Result<Raster<f64>> {
    if threshold.is_nan() {
        return Err(Error::invalid_param("threshold", threshold, "must not be NaN"));
    }
    map_valid(raster, |v| if v > threshold { 1.0 } else { 0.0 })
}

/// `accumulator += increment` where both cells are valid.
///
/// Cells where either side is nodata are left unchanged, so an accumulator
/// that starts fully valid never loses cells.
pub fn in_place_add(accumulator: &mut Raster<f64>, increment: &Raster<f64>) -> Result<()> {
    accumulator.ensure_same_shape(increment)?;

    let acc_nodata = accumulator.nodata();
    let inc_nodata = increment.nodata();

    Zip::from(accumulator.data_mut())
        .and(increment.data())
        .for_each(|acc, &inc| {
            if !acc.is_nodata(acc_nodata) && !inc.is_nodata(inc_nodata) {
                *acc += inc;
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stochvuln_core::GeoTransform;

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(5, 5, value);
        r.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_scalar_multiply_and_divide() {
        let input = make_band(0.5);

        let scaled = scalar_op(&input, 6.6, MathOp::Multiply).unwrap();
        assert_relative_eq!(scaled.get(2, 2).unwrap(), 3.3, epsilon = 1e-12);

        let divided = scalar_op(&make_band(7.0), 50.0, MathOp::Divide).unwrap();
        assert_relative_eq!(divided.get(0, 4).unwrap(), 0.14, epsilon = 1e-12);
    }

    #[test]
    fn test_scalar_divide_by_zero_rejected() {
        let input = make_band(1.0);
        assert!(scalar_op(&input, 0.0, MathOp::Divide).is_err());
    }

    #[test]
    fn test_scalar_preserves_nodata() {
        let mut input = make_band(100.0);
        input.set(2, 2, f64::NAN).unwrap();

        let result = scalar_op(&input, 2.0, MathOp::Multiply).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert_relative_eq!(result.get(1, 1).unwrap(), 200.0);
    }

    #[test]
    fn test_binary_add_keeps_metadata() {
        let a = make_band(3.0);
        let b = make_band(7.0);

        let result = binary_op(&a, &b, MathOp::Add).unwrap();
        assert_relative_eq!(result.get(2, 2).unwrap(), 10.0);
        assert_eq!(result.transform(), a.transform());
    }

    #[test]
    fn test_binary_nodata_in_either_input() {
        let mut a = make_band(3.0);
        let mut b = make_band(7.0);
        a.set(0, 0, f64::NAN).unwrap();
        b.set(4, 4, -1.0).unwrap();
        b.set_nodata(Some(-1.0));

        let result = binary_op(&a, &b, MathOp::Add).unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
        assert!(result.get(4, 4).unwrap().is_nan());
    }

    #[test]
    fn test_binary_size_mismatch() {
        let a = make_band(1.0);
        let b = Raster::filled(4, 5, 1.0);
        assert!(binary_op(&a, &b, MathOp::Add).is_err());
    }

    #[test]
    fn test_greater_than_is_strict() {
        let mut input = make_band(25.0);
        input.set(0, 0, 25.0001).unwrap();
        input.set(0, 1, f64::NAN).unwrap();

        let result = greater_than(&input, 25.0).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
        assert_eq!(result.get(2, 2).unwrap(), 0.0);
        assert!(result.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_in_place_add_skips_nodata_increment() {
        let mut acc = make_band(2.0);
        let mut inc = make_band(1.0);
        inc.set(3, 3, f64::NAN).unwrap();

        in_place_add(&mut acc, &inc).unwrap();
        assert_eq!(acc.get(0, 0).unwrap(), 3.0);
        assert_eq!(acc.get(3, 3).unwrap(), 2.0);
    }

    #[test]
    fn test_in_place_add_size_mismatch() {
        let mut acc = make_band(0.0);
        let inc = Raster::filled(3, 3, 1.0);
        assert!(in_place_add(&mut acc, &inc).is_err());
    }
}
