//! Gaussian Smoother Module
//! Isotropic Gaussian blur of a (lat, lon) field before peak detection.
//!
//! Follows the scipy `gaussian_filter` conventions: kernel radius
//! `round(truncate * sigma)`, weights normalised to one, and *reflect*
//! boundaries (`d c b a | a b c d | d c b a`). Missing cells are handled by
//! normalised convolution, so with a complete field the result is identical
//! to a plain convolution.

use ndarray::{Array2, Axis};
use statrs::distribution::{Continuous, Normal};
use thiserror::Error;

pub const DEFAULT_SIGMA: f64 = 1.5;
pub const DEFAULT_TRUNCATE: f64 = 4.0;

#[derive(Error, Debug)]
pub enum SmoothError {
    #[error("Smoothing sigma must be finite and non-negative, got {0}")]
    InvalidSigma(f64),
    #[error("Kernel truncation must be finite and positive, got {0}")]
    InvalidTruncate(f64),
    #[error("Failed to build Gaussian kernel: {0}")]
    Kernel(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSmoother {
    pub sigma: f64,
    pub truncate: f64,
}

impl Default for GaussianSmoother {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            truncate: DEFAULT_TRUNCATE,
        }
    }
}

impl GaussianSmoother {
    pub fn new(sigma: f64, truncate: f64) -> Result<Self, SmoothError> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(SmoothError::InvalidSigma(sigma));
        }
        if !truncate.is_finite() || truncate <= 0.0 {
            return Err(SmoothError::InvalidTruncate(truncate));
        }
        Ok(Self { sigma, truncate })
    }

    pub fn radius(&self) -> usize {
        (self.truncate * self.sigma + 0.5) as usize
    }

    /// Normalised 1-D kernel of length `2 * radius + 1`.
    pub fn kernel(&self) -> Result<Vec<f64>, SmoothError> {
        if self.sigma == 0.0 {
            return Ok(vec![1.0]);
        }
        let normal =
            Normal::new(0.0, self.sigma).map_err(|e| SmoothError::Kernel(e.to_string()))?;
        let r = self.radius() as i64;
        let weights: Vec<f64> = (-r..=r).map(|x| normal.pdf(x as f64)).collect();
        let total: f64 = weights.iter().sum();
        Ok(weights.into_iter().map(|w| w / total).collect())
    }

    /// Smooth `field`; missing (NaN) cells stay missing and are ignored by
    /// their neighbours.
    pub fn smooth(&self, field: &Array2<f64>) -> Result<Array2<f64>, SmoothError> {
        let kernel = self.kernel()?;
        if kernel.len() == 1 {
            return Ok(field.clone());
        }

        let mask = field.mapv(|v| if v.is_nan() { 0.0 } else { 1.0 });
        let filled = field.mapv(|v| if v.is_nan() { 0.0 } else { v });

        let num = convolve_axis(&convolve_axis(&filled, &kernel, Axis(0)), &kernel, Axis(1));
        let den = convolve_axis(&convolve_axis(&mask, &kernel, Axis(0)), &kernel, Axis(1));

        let mut out = num;
        ndarray::Zip::from(&mut out)
            .and(&den)
            .and(field)
            .for_each(|o, &d, &orig| {
                *o = if orig.is_nan() || d <= 0.0 {
                    f64::NAN
                } else {
                    *o / d
                };
            });
        Ok(out)
    }
}

/// Mirror an out-of-range index back into `0..n` (half-sample symmetric).
fn reflect_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut k = i.rem_euclid(period);
    if k >= n {
        k = period - 1 - k;
    }
    k as usize
}

fn convolve_axis(field: &Array2<f64>, kernel: &[f64], axis: Axis) -> Array2<f64> {
    let r = (kernel.len() / 2) as i64;
    let mut out = Array2::<f64>::zeros(field.raw_dim());
    for (src, mut dst) in field.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        let n = src.len();
        for i in 0..n {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let j = reflect_index(i as i64 + k as i64 - r, n);
                acc += w * src[j];
            }
            dst[i] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn kernel_matches_scipy_radius_and_sums_to_one() {
        let s = GaussianSmoother::default();
        let k = s.kernel().unwrap();
        assert_eq!(s.radius(), 6);
        assert_eq!(k.len(), 13);
        assert_relative_eq!(k.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(k[0], k[12]);
        assert!(k[6] > k[5]);
    }

    #[test]
    fn reflect_mode_indices() {
        // d c b a | a b c d | d c b a
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(-9, 4), 0);
        assert_eq!(reflect_index(3, 1), 0);
    }

    #[test]
    fn constant_field_is_unchanged() {
        let field = Array2::from_elem((5, 7), 3.5);
        let out = GaussianSmoother::default().smooth(&field).unwrap();
        for &v in out.iter() {
            assert_relative_eq!(v, 3.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_sigma_is_identity() {
        let field = array![[1.0, 2.0], [3.0, 4.0]];
        let s = GaussianSmoother::new(0.0, 4.0).unwrap();
        assert_eq!(s.smooth(&field).unwrap(), field);
    }

    #[test]
    fn smoothing_preserves_mass_and_spreads_peak() {
        let mut field = Array2::<f64>::zeros((21, 21));
        field[[10, 10]] = 100.0;
        let out = GaussianSmoother::default().smooth(&field).unwrap();
        assert_relative_eq!(out.sum(), 100.0, epsilon = 1e-9);
        assert!(out[[10, 10]] < 100.0);
        assert!(out[[10, 11]] > 0.0);
        assert!(out[[10, 10]] > out[[10, 11]]);
    }

    #[test]
    fn missing_cells_stay_missing_and_do_not_leak() {
        let mut field = Array2::from_elem((4, 4), 2.0);
        field[[1, 1]] = f64::NAN;
        let out = GaussianSmoother::new(1.0, 4.0).unwrap().smooth(&field).unwrap();
        assert!(out[[1, 1]].is_nan());
        assert_relative_eq!(out[[1, 2]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(out[[3, 3]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_negative_sigma() {
        assert!(matches!(
            GaussianSmoother::new(-1.0, 4.0),
            Err(SmoothError::InvalidSigma(_))
        ));
    }
}
