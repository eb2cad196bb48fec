//! # stochvuln core
//!
//! Raster types and I/O shared by the stochvuln workspace.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid with nodata handling
//! - `GeoTransform`: affine pixel/map transform
//! - `CRS`: coordinate reference system metadata
//! - D8 neighbour tables used by the hydrology algorithms
//! - Single-band GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}
