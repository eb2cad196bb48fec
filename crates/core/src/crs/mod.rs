//! Coordinate reference system tag carried by rasters

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG identification of a raster's coordinate reference system.
///
/// Rasters are never reprojected; the tag read from the base DEM's GeoKey
/// directory is copied onto every derived raster and written back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Geographic (lat/lon) systems in the EPSG 4000 block
    pub fn is_geographic(&self) -> bool {
        (4000..5000).contains(&self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_kind() {
        let bng = CRS::from_epsg(27700);
        assert_eq!(bng.to_string(), "EPSG:27700");
        assert!(!bng.is_geographic());
        assert!(CRS::from_epsg(4326).is_geographic());
        assert_eq!(bng, CRS::from_epsg(27700));
    }
}
