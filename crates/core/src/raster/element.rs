//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// A type that can be stored in a [`Raster`](super::Raster) cell.
///
/// Floats treat NaN as nodata in addition to any declared nodata value;
/// integers only match the declared value.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Nodata marker used when a raster declares none
    fn default_nodata() -> Self;

    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

impl RasterElement for u8 {
    /// Flow direction rasters use 0 (no outflow) as nodata
    fn default_nodata() -> Self {
        0
    }

    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        nodata == Some(*self)
    }
}

impl RasterElement for i32 {
    fn default_nodata() -> Self {
        i32::MIN
    }

    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        nodata == Some(*self)
    }
}

macro_rules! float_element {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                // Declared values such as -9999 may lose precision in f32 files
                self.is_nan()
                    || nodata.is_some_and(|nd| (self - nd).abs() <= nd.abs().max(1.0) * 1e-6)
            }
        }
    };
}

float_element!(f32);
float_element!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(((-9999.0_f32) as f64).is_nodata(Some(-9999.0)));
        assert!(!1.0_f64.is_nodata(Some(-9999.0)));
        assert!(!0.0_f64.is_nodata(None));
    }

    #[test]
    fn test_integer_nodata() {
        assert!(0u8.is_nodata(Some(0)));
        assert!(!3u8.is_nodata(Some(0)));
        assert!(!0u8.is_nodata(None));
        assert!(i32::MIN.is_nodata(Some(i32::default_nodata())));
    }
}
