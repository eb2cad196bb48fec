//! Errors raised by raster construction, I/O and algorithms

use thiserror::Error;

/// Error type shared by the core and algorithm crates
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data does not fit a {width}x{height} grid")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Cell ({row}, {col}) outside a {rows}x{cols} raster")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Rasters not aligned: {er}x{ec} vs {ar}x{ac}")]
    SizeMismatch {
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    #[error("Unsupported sample format: {0}")]
    UnsupportedDataType(String),

    #[error("GeoTIFF codec: {0}")]
    Tiff(String),

    #[error("Invalid `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`]
    pub fn invalid_param(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
