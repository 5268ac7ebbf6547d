//! Special functions used by the Gamma densities.
//!
//! ```text
//! ln p(x | a, b) = a * ln(b) - lgamma(a) + (a - 1) * ln(x) - b * x
//! ```
//!
//! Every argument that could reach `lgamma` or `ln` at zero is raised
//! to [`MIN_POSITIVE`] first.

use ndarray::prelude::*;
use special::Gamma as SpecialGamma;

/// The smallest positive normal `f64`; the single floor used for
/// document features, sampled rates and `lgamma` arguments.
pub const MIN_POSITIVE: f64 = f64::MIN_POSITIVE;

/// `lgamma(max(x, MIN_POSITIVE))`
#[inline]
pub fn ln_gamma_floored(x: f64) -> f64 {
    SpecialGamma::ln_gamma(x.max(MIN_POSITIVE)).0
}

/// Elementwise [`ln_gamma_floored`]
pub fn ln_gamma_floored_array<D: Dimension>(x: &Array<f64, D>) -> Array<f64, D> {
    x.mapv(ln_gamma_floored)
}

/// No floor: callers only pass clipped shape parameters
#[inline]
pub fn digamma(x: f64) -> f64 {
    SpecialGamma::digamma(x)
}

/// Log-density of `Gamma(shape = a, rate = b)` at `x`
///
/// * `x` - observed value (> 0)
/// * `a` - shape
/// * `b` - rate
#[inline]
pub fn gamma_log_pdf(x: f64, a: f64, b: f64) -> f64 {
    a * b.ln() - ln_gamma_floored(a) + (a - 1.0) * x.ln() - b * x
}

/// Replace any exact zero with [`MIN_POSITIVE`]
pub fn floor_zeros_inplace<D: Dimension>(x: &mut Array<f64, D>) {
    x.mapv_inplace(|v| if v == 0.0 { MIN_POSITIVE } else { v });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ln_gamma_known_values() {
        assert_abs_diff_eq!(ln_gamma_floored(1.0), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ln_gamma_floored(2.0), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ln_gamma_floored(5.0), 24.0_f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_ln_gamma_floor_scalar_and_array_agree() {
        let at_floor = ln_gamma_floored(MIN_POSITIVE);
        assert!(at_floor.is_finite());
        assert_eq!(ln_gamma_floored(0.0), at_floor);
        assert_eq!(ln_gamma_floored(-3.5), at_floor);

        let xx = array![[0.0, -1.0, 1.0]];
        let yy = ln_gamma_floored_array(&xx);
        assert_eq!(yy[[0, 0]], at_floor);
        assert_eq!(yy[[0, 1]], at_floor);
        assert_abs_diff_eq!(yy[[0, 2]], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gamma_log_pdf_exponential() {
        // Gamma(1, b) is Exponential(b): ln b - b x
        let b = 0.3;
        let x = 2.5;
        assert_abs_diff_eq!(gamma_log_pdf(x, 1.0, b), b.ln() - b * x, epsilon = 1e-9);
    }

    #[test]
    fn test_digamma_one() {
        // digamma(1) = -Euler-Mascheroni
        assert_abs_diff_eq!(digamma(1.0), -0.577_215_664_901_532_9, epsilon = 1e-6);
    }

    #[test]
    fn test_floor_zeros() {
        let mut xx = array![0.0, 0.5, 0.0];
        floor_zeros_inplace(&mut xx);
        assert!(xx.iter().all(|&x| x > 0.0 && x.ln().is_finite()));
        assert_eq!(xx[1], 0.5);
    }
}
