//! Random fields for Monte Carlo error simulation
//!
//! A random field holds one independent draw from the standard normal
//! distribution N(0, 1) per valid cell of a template raster. Smoothing the
//! field (see [`crate::terrain::gaussian_filter`]) adds the spatial
//! autocorrelation that real DEM error exhibits.

use rand::Rng;
use stochvuln_core::raster::Raster;
use stochvuln_core::Result;

/// Draw one standard normal variate (Box-Muller transform)
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen::<f64>() is in [0, 1); 1 - u is in (0, 1] so ln() stays finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Generate a standard normal random field on the grid of `base`.
///
/// Cells that are nodata in `base` are nodata (NaN) in the output. The
/// field is filled sequentially in row-major order, so a seeded `rng`
/// produces the same field every time.
pub fn random_field<R: Rng + ?Sized>(base: &Raster<f64>, rng: &mut R) -> Result<Raster<f64>> {
    let (rows, cols) = base.shape();

    let mut output = base.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));

    for (dst, &src) in output.data_mut().iter_mut().zip(base.data().iter()) {
        *dst = if base.is_nodata(src) {
            f64::NAN
        } else {
            standard_normal(rng)
        };
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_field_moments() {
        let base = Raster::filled(100, 100, 250.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let field = random_field(&base, &mut rng).unwrap();

        let n = field.len() as f64;
        let mean = field.data().iter().sum::<f64>() / n;
        let var = field.data().iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        assert!(mean.abs() < 0.05, "mean should be ~0, got {}", mean);
        assert!((var - 1.0).abs() < 0.1, "variance should be ~1, got {}", var);
    }

    #[test]
    fn test_field_is_reproducible_with_seed() {
        let base = Raster::filled(8, 8, 1.0);
        let a = random_field(&base, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = random_field(&base, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let c = random_field(&base, &mut ChaCha8Rng::seed_from_u64(43)).unwrap();

        assert_eq!(a.data(), b.data());
        assert_ne!(a.data(), c.data());
    }

    #[test]
    fn test_field_respects_base_nodata() {
        let mut base = Raster::filled(4, 4, 10.0);
        base.set(0, 0, -9999.0).unwrap();
        base.set_nodata(Some(-9999.0));

        let field = random_field(&base, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert!(field.get(0, 0).unwrap().is_nan());
        assert!(field.get(3, 3).unwrap().is_finite());
    }
}
