//! Georeferenced grid type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D grid of cells.
///
/// Cells are indexed `(row, col)` from the top-left corner. Besides the
/// values, a raster carries its affine transform, an optional CRS and an
/// optional nodata value; for float rasters NaN is always nodata.
///
/// # Example
///
/// ```ignore
/// use stochvuln_core::Raster;
///
/// let mut dem: Raster<f64> = Raster::new(3, 3);
/// dem.set(1, 1, 120.5)?;
/// assert_eq!(dem.get(1, 1)?, 120.5);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-valued raster with a unit transform
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Build from row-major values; `data.len()` must equal `rows * cols`
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        let array = Array2::from_shape_vec((rows, cols), data).map_err(|_| {
            Error::InvalidDimensions {
                width: cols,
                height: rows,
            }
        })?;
        Ok(Self::from_array(array))
    }

    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Zeroed raster of another cell type on the same georeferencing.
    /// The nodata value is not carried over.
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Raster on this grid with every valid cell set to `value`.
    ///
    /// Nodata cells stay nodata. They are marked with the type default (NaN
    /// for floats) unless `value` itself would read as that marker, in which
    /// case the base raster's own nodata value is tried. Fails when `value`
    /// collides with every candidate marker.
    pub fn filled_like(&self, value: T) -> Result<Self> {
        let nodata = [Some(T::default_nodata()), self.nodata]
            .into_iter()
            .flatten()
            .find(|nd| !value.is_nodata(Some(*nd)))
            .ok_or_else(|| {
                Error::invalid_param("value", format!("{:?}", value), "collides with nodata")
            })?;
        Ok(Self {
            data: self
                .data
                .mapv(|v| if self.is_nodata(v) { nodata } else { value }),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: Some(nodata),
        })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with [`Error::SizeMismatch`] unless `other` has the same shape
    pub fn ensure_same_shape<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: other.rows(),
                ac: other.cols(),
            });
        }
        Ok(())
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    /// # Safety
    /// `row < self.rows()` and `col < self.cols()`
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let err = self.out_of_bounds(row, col);
        let cell = self.data.get_mut((row, col)).ok_or(err)?;
        *cell = value;
        Ok(())
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size in map units (square cells assumed)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// `true` for every cell holding a valid value
    pub fn valid_mask(&self) -> Array2<bool> {
        self.data.mapv(|v| !self.is_nodata(v))
    }

    /// Min, max and mean over valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut stats = RasterStatistics {
            min: None,
            max: None,
            mean: None,
            valid_count: 0,
            nodata_count: 0,
        };
        let mut sum = 0.0;

        for &value in self.data.iter().filter(|v| !self.is_nodata(**v)) {
            if stats.min.map_or(true, |m| value < m) {
                stats.min = Some(value);
            }
            if stats.max.map_or(true, |m| value > m) {
                stats.max = Some(value);
            }
            sum += value.to_f64().unwrap_or(0.0);
            stats.valid_count += 1;
        }

        if stats.valid_count > 0 {
            stats.mean = Some(sum / stats.valid_count as f64);
        }
        stats.nodata_count = self.len() - stats.valid_count;
        stats
    }
}

/// Summary of the valid cells of a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_bounds() {
        let mut raster: Raster<f64> = Raster::new(10, 12);
        assert_eq!(raster.shape(), (10, 12));
        raster.set(5, 7, 42.0).unwrap();
        assert_eq!(raster.get(5, 7).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
        assert!(matches!(raster.set(0, 12, 1.0), Err(Error::IndexOutOfBounds { .. })));
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Raster::from_vec(vec![1.0_f64; 6], 2, 3).is_ok());
        assert!(matches!(
            Raster::from_vec(vec![1.0_f64; 5], 2, 3),
            Err(Error::InvalidDimensions { width: 3, height: 2 })
        ));
    }

    #[test]
    fn test_filled_like_keeps_grid_and_mask() {
        let mut base: Raster<f64> = Raster::filled(4, 6, 120.0);
        base.set_transform(GeoTransform::new(500.0, 900.0, 30.0, -30.0));
        base.set_crs(Some(CRS::from_epsg(32630)));
        base.set(1, 2, f64::NAN).unwrap();

        let zeros = base.filled_like(0.0).unwrap();
        assert_eq!(zeros.shape(), (4, 6));
        assert_eq!(zeros.transform(), base.transform());
        assert_eq!(zeros.crs(), base.crs());
        assert!(zeros.get(1, 2).unwrap().is_nan());
        assert_eq!(zeros.valid_mask().iter().filter(|v| **v).count(), 23);
        assert_eq!(zeros.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_filled_like_fill_equal_to_base_nodata() {
        // DEMs often declare 0 as nodata; a zero accumulator must stay valid
        let mut base: Raster<f64> = Raster::filled(4, 4, 100.0);
        base.set(0, 0, 0.0).unwrap();
        base.set_nodata(Some(0.0));

        let zeros = base.filled_like(0.0).unwrap();
        assert!(zeros.nodata().unwrap().is_nan());
        assert!(zeros.get(0, 0).unwrap().is_nan());
        assert_eq!(zeros.valid_mask().iter().filter(|v| **v).count(), 15);
        assert_eq!(zeros.get(3, 3).unwrap(), 0.0);
        assert!(!zeros.is_nodata(zeros.get(3, 3).unwrap()));
    }

    #[test]
    fn test_filled_like_integer_marker_fallback() {
        let mut base: Raster<u8> = Raster::filled(2, 2, 5);
        base.set(0, 0, 255).unwrap();
        base.set_nodata(Some(255));

        // 0 is the u8 default marker, so the base's 255 is used instead
        let zeros = base.filled_like(0).unwrap();
        assert_eq!(zeros.nodata(), Some(255));
        assert_eq!(zeros.get(0, 0).unwrap(), 255);
        assert_eq!(zeros.get(1, 1).unwrap(), 0);

        let no_marker: Raster<u8> = Raster::filled(2, 2, 5);
        assert!(no_marker.filled_like(0).is_err());
    }

    #[test]
    fn test_ensure_same_shape() {
        let a: Raster<f64> = Raster::new(4, 4);
        let b: Raster<u8> = Raster::new(4, 4);
        let c: Raster<f64> = Raster::new(4, 5);
        assert!(a.ensure_same_shape(&b).is_ok());
        assert!(matches!(a.ensure_same_shape(&c), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let mut raster = Raster::from_vec(values, 10, 10).unwrap();
        raster.set(0, 0, f64::NAN).unwrap();
        raster.set(9, 9, -9999.0).unwrap();
        raster.set_nodata(Some(-9999.0));

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(98.0));
        assert_eq!(stats.valid_count, 98);
        assert_eq!(stats.nodata_count, 2);
        assert!((stats.mean.unwrap() - 49.5).abs() < 1e-12);
    }
}
