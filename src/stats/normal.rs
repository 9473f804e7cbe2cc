//! Standard normal distribution kernels
//!
//! - Quantile: Wichura (1988), AS241 `PPND16`, ~1e-16 relative accuracy
//! - Upper tail: Cody (1969) rational Chebyshev approximation
//!
//! Both match the kernels behind R's `qnorm`/`pnorm` closely enough that the
//! Shapiro-Wilk coefficients agree with the reference implementations.

/// 1 / sqrt(2 pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_677_939_946_059_934;

/// sqrt(32), boundary between Cody's middle and tail approximations
const SQRT_32: f64 = 5.656_854_249_492_380_195_206_754_896_838;

/// Quantile function of the standard normal distribution.
///
/// Returns `-inf`/`+inf` at 0/1 and NaN outside [0, 1].
#[must_use]
#[allow(clippy::excessive_precision, clippy::unreadable_literal)]
pub fn quantile(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let q = p - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180625 - q * q;
        return q
            * (((((((r * 2509.0809287301226727 + 33430.575583588128105) * r
                + 67265.770927008700853)
                * r
                + 45921.953931549871457)
                * r
                + 13731.693765509461125)
                * r
                + 1971.5909503065514427)
                * r
                + 133.14166789178437745)
                * r
                + 3.387132872796366608)
            / (((((((r * 5226.495278852545925 + 28729.085735721942674) * r
                + 39307.89580009271061)
                * r
                + 21213.794301586595867)
                * r
                + 5394.1960214247511077)
                * r
                + 687.1870074920579083)
                * r
                + 42.313330701600911252)
                * r
                + 1.0);
    }

    let tail = if q < 0.0 { p } else { 1.0 - p };
    let mut r = (-tail.ln()).sqrt();
    let value = if r <= 5.0 {
        r -= 1.6;
        (((((((r * 7.7454501427834140764e-4 + 0.0227238449892691845833) * r
            + 0.24178072517745061177)
            * r
            + 1.27045825245236838258)
            * r
            + 3.64784832476320460504)
            * r
            + 5.7694972214606914055)
            * r
            + 4.6303378461565452959)
            * r
            + 1.42343711074968357734)
            / (((((((r * 1.05075007164441684324e-9 + 5.475938084995344946e-4) * r
                + 0.0151986665636164571966)
                * r
                + 0.14810397642748007459)
                * r
                + 0.68976733498510000455)
                * r
                + 1.6763848301838038494)
                * r
                + 2.05319162663775882187)
                * r
                + 1.0)
    } else {
        r -= 5.0;
        (((((((r * 2.01033439929228813265e-7 + 2.71155556874348757815e-5) * r
            + 0.0012426609473880784386)
            * r
            + 0.026532189526576123093)
            * r
            + 0.29656057182850489123)
            * r
            + 1.7848265399172913358)
            * r
            + 5.4637849111641143699)
            * r
            + 6.6579046435011037772)
            / (((((((r * 2.04426310338993978564e-15 + 1.4215117583164458887e-7) * r
                + 1.8463183175100546818e-5)
                * r
                + 7.868691311456132591e-4)
                * r
                + 0.0148753612908506148525)
                * r
                + 0.13692988092273580531)
                * r
                + 0.59983220655588793769)
                * r
                + 1.0)
    };

    if q < 0.0 {
        -value
    } else {
        value
    }
}

/// Upper tail probability `P(Z > x)` of the standard normal distribution.
#[must_use]
#[allow(clippy::excessive_precision, clippy::unreadable_literal)]
pub fn upper_tail(x: f64) -> f64 {
    const A: [f64; 5] = [
        2.2352520354606839287,
        161.02823106855587881,
        1067.6894854603709582,
        18154.981253343561249,
        0.065682337918207449113,
    ];
    const B: [f64; 4] = [
        47.20258190468824187,
        976.09855173777669322,
        10260.932208618978205,
        45507.789335026729956,
    ];
    const C: [f64; 9] = [
        0.39894151208813466764,
        8.8831497943883759412,
        93.506656132177855979,
        597.27027639480026226,
        2494.5375852903726711,
        6848.1904505362823326,
        11602.651437647350124,
        9842.7148383839780218,
        1.0765576773720192317e-8,
    ];
    const D: [f64; 8] = [
        22.266688044328115691,
        235.38790178262499861,
        1519.377599407554805,
        6485.558298266760755,
        18615.571640885098091,
        34900.952721145977266,
        38912.003286093271411,
        19685.429676859990727,
    ];
    const P: [f64; 6] = [
        0.21589853405795699,
        0.1274011611602473639,
        0.022235277870649807,
        0.001421619193227893466,
        2.9112874951168792e-5,
        0.02307344176494017303,
    ];
    const Q: [f64; 5] = [
        1.28426009614491121,
        0.468238212480865118,
        0.0659881378689285515,
        0.00378239633202758244,
        7.29751555083966205e-5,
    ];

    if x.is_nan() {
        return f64::NAN;
    }

    let y = x.abs();
    if y <= 0.674_489_75 {
        let (mut xnum, mut xden) = (0.0, 0.0);
        if y > f64::EPSILON * 0.5 {
            let xsq = x * x;
            xnum = A[4] * xsq;
            xden = xsq;
            for i in 0..3 {
                xnum = (xnum + A[i]) * xsq;
                xden = (xden + B[i]) * xsq;
            }
        }
        let temp = x * (xnum + A[3]) / (xden + B[3]);
        return 0.5 - temp;
    }

    let temp = if y <= SQRT_32 {
        let mut xnum = C[8] * y;
        let mut xden = y;
        for i in 0..7 {
            xnum = (xnum + C[i]) * y;
            xden = (xden + D[i]) * y;
        }
        (xnum + C[7]) / (xden + D[7])
    } else if y < 50.0 {
        let xsq = 1.0 / (x * x);
        let mut xnum = P[5] * xsq;
        let mut xden = xsq;
        for i in 0..4 {
            xnum = (xnum + P[i]) * xsq;
            xden = (xden + Q[i]) * xsq;
        }
        let temp = xsq * (xnum + P[4]) / (xden + Q[4]);
        (FRAC_1_SQRT_2PI - temp) / y
    } else {
        return if x > 0.0 { 0.0 } else { 1.0 };
    };

    // Split exp(-y^2/2) to keep precision in the far tail
    let xsq = (y * 16.0).trunc() / 16.0;
    let del = (y - xsq) * (y + xsq);
    let tail = (-xsq * xsq * 0.5).exp() * (-del * 0.5).exp() * temp;

    if x > 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, rel: f64) {
        let scale = expected.abs().max(f64::MIN_POSITIVE);
        assert!(
            ((actual - expected) / scale).abs() < rel,
            "actual {actual} expected {expected}"
        );
    }

    #[test]
    fn test_quantile_center() {
        assert_eq!(quantile(0.5), 0.0);
        assert_close(quantile(0.975), 1.959_963_984_540_054, 1e-14);
        assert_close(quantile(0.025), -1.959_963_984_540_054, 1e-14);
        assert_close(quantile(0.841_344_746_068_542_9), 1.0, 1e-12);
    }

    #[test]
    fn test_quantile_tails() {
        assert_close(quantile(1e-10), -6.361_340_902_404_056, 1e-12);
        assert_close(quantile(1e-300), -37.047_096, 1e-6);
    }

    #[test]
    fn test_quantile_bounds() {
        assert_eq!(quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile(1.0), f64::INFINITY);
        assert!(quantile(-0.1).is_nan());
        assert!(quantile(1.1).is_nan());
        assert!(quantile(f64::NAN).is_nan());
    }

    #[test]
    fn test_upper_tail_known_values() {
        assert_eq!(upper_tail(0.0), 0.5);
        assert_close(upper_tail(1.0), 0.158_655_253_931_457_05, 1e-14);
        assert_close(upper_tail(-1.0), 0.841_344_746_068_542_9, 1e-14);
        assert_close(upper_tail(2.5), 0.006_209_665_325_776_139, 1e-13);
        assert_close(upper_tail(6.0), 9.865_876_450_377_012e-10, 1e-13);
        assert_close(upper_tail(10.0), 7.619_853_024_160_593e-24, 1e-13);
    }

    #[test]
    fn test_upper_tail_extremes() {
        assert_eq!(upper_tail(60.0), 0.0);
        assert_eq!(upper_tail(-60.0), 1.0);
        assert!(upper_tail(f64::NAN).is_nan());
    }

    #[test]
    fn test_quantile_inverts_upper_tail() {
        for x in [-4.0, -2.2, -0.3, 0.1, 0.9, 1.7, 3.3] {
            let p = 1.0 - upper_tail(x);
            assert!((quantile(p) - x).abs() < 1e-9, "x = {x}");
        }
    }
}
