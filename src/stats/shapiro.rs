//! Shapiro-Wilk normality test
//!
//! Royston (1995), Algorithm AS R94: "A remark on Algorithm AS 181: The
//! W-test for normality". Same coefficient approximation and p-value
//! transformation as R's `shapiro.test` and `SciPy`'s `stats.shapiro`.
//!
//! ```rust
//! use companion_core::stats::{NormalityTester, NumericSample};
//!
//! let sample = NumericSample::new(vec![0.1, 0.2, 0.3, 1.0, 2.0, 3.0, 10.0, 5.0])?;
//! let result = NormalityTester::new().evaluate(&sample)?;
//! assert!(!result.is_normal());
//! # Ok::<(), companion_core::Error>(())
//! ```

use super::normal;
use super::sample::{NormalityResult, NumericSample, MIN_SAMPLE_SIZE};
use crate::{Error, Result};

/// Largest sample for which Royston's p-value approximation was validated
pub const MAX_VALIDATED_SAMPLE_SIZE: usize = 5000;

/// Range below which the sample is treated as constant
const SMALL: f64 = 1e-19;

/// p-value reported when ln(1 - W) lies beyond the small-sample bound
const TINY_P_VALUE: f64 = 1e-99;

// Polynomial coefficients (Royston 1995, Table 1)
const G: [f64; 2] = [-2.273, 0.459];
const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];

/// 6 / pi
const SIX_OVER_PI: f64 = 1.909_859_317_102_744;
/// asin(sqrt(3/4)) = pi / 3
const ASIN_SQRT_THREE_QUARTERS: f64 = 1.047_197_551_196_598;

/// Stateless Shapiro-Wilk tester.
///
/// Holds no configuration: the significance level is a fixed constant
/// ([`super::SIGNIFICANCE_LEVEL`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalityTester {
    _private: (),
}

impl NormalityTester {
    /// Create a tester
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Compute the Shapiro-Wilk W statistic and its p-value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Computation`] if the sample range is below 1e-19
    /// (constant or near-constant data), for which W is undefined, or if the
    /// statistic does not come out finite.
    pub fn evaluate(&self, sample: &NumericSample) -> Result<NormalityResult> {
        let n = sample.len();
        if n < MIN_SAMPLE_SIZE {
            // NumericSample already enforces this; keep the test total
            return Err(Error::Computation(format!(
                "Shapiro-Wilk requires at least {MIN_SAMPLE_SIZE} values, got {n}"
            )));
        }
        if n > MAX_VALIDATED_SAMPLE_SIZE {
            tracing::warn!(
                n,
                "p-value may be inaccurate for samples above {MAX_VALIDATED_SAMPLE_SIZE} values"
            );
        }

        let mut x = sample.sorted();
        // Spans near f64::MAX overflow; W is scale-invariant, so bring them to [-1, 1]
        if !(x[n - 1] - x[0]).is_finite() {
            let scale = x[0].abs().max(x[n - 1].abs());
            for v in &mut x {
                *v /= scale;
            }
        }
        let shift = x[n / 2];
        for v in &mut x {
            *v -= shift;
        }

        let range = x[n - 1] - x[0];
        if range < SMALL {
            return Err(Error::Computation(format!(
                "Input data has range below {SMALL:e}; Shapiro-Wilk is undefined for a \
                 (near-)constant sample"
            )));
        }

        let a = coefficients(n);
        let c = antisymmetric_weights(&a, n);

        #[allow(clippy::cast_precision_loss)]
        let an = n as f64;
        let sa = c.iter().sum::<f64>() / an;
        let sx = x.iter().map(|v| v / range).sum::<f64>() / an;

        let (mut ssa, mut ssx, mut sax) = (0.0, 0.0, 0.0);
        for (ci, xi) in c.iter().zip(&x) {
            let asa = ci - sa;
            let xsx = xi / range - sx;
            ssa += asa * asa;
            ssx += xsx * xsx;
            sax += asa * xsx;
        }

        // w1 = 1 - W, formed directly to avoid cancellation when W is near 1
        let ssassx = (ssa * ssx).sqrt();
        let w1 = (ssassx - sax) * (ssassx + sax) / (ssa * ssx);
        if !w1.is_finite() {
            return Err(Error::Computation(format!(
                "W statistic is not finite for this sample (n = {n})"
            )));
        }
        // Rounding can push w1 a hair below zero when W is 1
        let w1 = w1.max(0.0);
        let w = 1.0 - w1;

        let p_value = p_value(w, w1, n);
        tracing::debug!(n, statistic = w, p_value, "shapiro-wilk evaluated");
        Ok(NormalityResult::new(w, p_value))
    }
}

/// Upper-half Shapiro-Wilk coefficients `a_1 .. a_{n/2}` (all positive).
///
/// Returns an empty vector for `n < 3`.
#[must_use]
pub fn coefficients(n: usize) -> Vec<f64> {
    let half = n / 2;
    if n < MIN_SAMPLE_SIZE {
        return Vec::new();
    }
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    #[allow(clippy::cast_precision_loss)]
    let an = n as f64;
    let an25 = an + 0.25;
    #[allow(clippy::cast_precision_loss)]
    let m: Vec<f64> = (1..=half)
        .map(|i| normal::quantile((i as f64 - 0.375) / an25))
        .collect();

    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = vec![0.0; half];
    a[0] = a1;
    let first_scaled = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };

    let (start, fac) = first_scaled;
    for i in start..half {
        a[i] = -m[i] / fac;
    }
    a
}

/// Expand half coefficients into the full weight vector for sorted data:
/// `-a_1 .. -a_k, [0], a_k .. a_1`.
fn antisymmetric_weights(a: &[f64], n: usize) -> Vec<f64> {
    let half = n / 2;
    (0..n)
        .map(|i| {
            if i < half {
                -a[i]
            } else if n % 2 == 1 && i == half {
                0.0
            } else {
                a[n - 1 - i]
            }
        })
        .collect()
}

fn p_value(w: f64, w1: f64, n: usize) -> f64 {
    if n == 3 {
        let p = SIX_OVER_PI * (w.sqrt().min(1.0).asin() - ASIN_SQRT_THREE_QUARTERS);
        return p.clamp(0.0, 1.0);
    }

    #[allow(clippy::cast_precision_loss)]
    let an = n as f64;
    let mut y = w1.ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return TINY_P_VALUE;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    normal::upper_tail((y - m) / s).clamp(0.0, 1.0)
}

/// Evaluate `cc[0] + cc[1] x + ... + cc[k] x^k` (Horner).
fn poly(cc: &[f64], x: f64) -> f64 {
    let (first, rest) = match cc.split_first() {
        Some(split) => split,
        None => return 0.0,
    };
    let tail = rest.iter().rev().fold(0.0, |acc, &c| acc * x + c) * x;
    first + tail
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(values: &[f64]) -> Result<NormalityResult> {
        NormalityTester::new().evaluate(&NumericSample::new(values.to_vec())?)
    }

    #[test]
    fn test_poly() {
        assert_eq!(poly(&[], 2.0), 0.0);
        assert_eq!(poly(&[3.0], 2.0), 3.0);
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 1.0 + 4.0 + 12.0);
        assert!((poly(&G, 10.0) - 2.317).abs() < 1e-12);
    }

    #[test]
    fn test_coefficients_n3() {
        let a = coefficients(3);
        assert_eq!(a, vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    #[test]
    fn test_coefficients_normalized() {
        // sum of squares of the full antisymmetric vector is 1
        for n in [4, 5, 6, 11, 12, 50, 333] {
            let a = coefficients(n);
            assert_eq!(a.len(), n / 2);
            let total = 2.0 * a.iter().map(|v| v * v).sum::<f64>();
            assert!((total - 1.0).abs() < 1e-10, "n = {n}: {total}");
        }
    }

    #[test]
    fn test_coefficients_decreasing() {
        let a = coefficients(20);
        assert!(a.iter().all(|&v| v > 0.0));
        assert!(a.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_coefficients_below_minimum() {
        assert!(coefficients(2).is_empty());
    }

    #[test]
    fn test_antisymmetric_weights() {
        let a = [0.6, 0.2];
        assert_eq!(antisymmetric_weights(&a, 4), vec![-0.6, -0.2, 0.2, 0.6]);
        assert_eq!(antisymmetric_weights(&a, 5), vec![-0.6, -0.2, 0.0, 0.2, 0.6]);
    }

    #[test]
    fn test_n3_exact() {
        let result = evaluate(&[1.0, 2.0, 4.0]).unwrap();
        assert!((result.statistic() - 0.964_285_714_285_714_2).abs() < 1e-12);
        assert!((result.p_value() - 0.636_886_845_028_963_2).abs() < 1e-9);
    }

    #[test]
    fn test_n3_equally_spaced_is_perfect() {
        let result = evaluate(&[1.0, 2.0, 3.0]).unwrap();
        assert!((result.statistic() - 1.0).abs() < 1e-12);
        assert!((result.p_value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_skewed_sample_rejected() {
        let result = evaluate(&[0.1, 0.2, 0.3, 1.0, 2.0, 3.0, 10.0, 5.0]).unwrap();
        assert!((result.statistic() - 0.799_351_663_480_528).abs() < 1e-7);
        assert!((result.p_value() - 0.028_171_644_254_207).abs() < 1e-6);
        assert!(!result.is_normal());
    }

    #[test]
    fn test_constant_sample_is_computation_error() {
        let err = evaluate(&[2.0, 2.0, 2.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
        assert!(err.to_string().contains("range below 1e-19"));
    }

    #[test]
    fn test_order_independent() {
        let a = evaluate(&[5.0, 1.0, 4.0, 2.0, 3.0, 9.0]).unwrap();
        let b = evaluate(&[9.0, 3.0, 2.0, 4.0, 1.0, 5.0]).unwrap();
        assert_eq!(a.statistic().to_bits(), b.statistic().to_bits());
        assert_eq!(a.p_value().to_bits(), b.p_value().to_bits());
    }

    #[test]
    fn test_statistic_in_unit_interval() {
        let result = evaluate(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0]).unwrap();
        assert!(result.statistic() > 0.0 && result.statistic() <= 1.0);
        assert!((0.0..=1.0).contains(&result.p_value()));
        assert!(!result.is_normal());
    }
}
