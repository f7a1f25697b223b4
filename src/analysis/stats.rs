//! Summary statistics for per-cycle sample buckets.
//!
//! Mean, sample standard deviation, standard error, and the two-sided
//! Student-t confidence interval. The t quantile is computed locally via
//! the regularized incomplete beta function; confidence levels are
//! arbitrary, not limited to a fixed table.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). Zero for n < 2.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}

/// Standard error of the mean. Zero for n < 2.
pub fn standard_error(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    sample_std_dev(values) / (n as f64).sqrt()
}

/// Reduce a sample bucket to `(mean, ci)` at the given confidence level.
///
/// The confidence interval is the half-width `t * SE` with the Student-t
/// critical value for `n-1` degrees of freedom. With a single sample the
/// t statistic is undefined (zero degrees of freedom), so the interval is
/// defined as exactly 0.0; the same holds for an empty bucket.
pub fn summarize(values: &[f64], confidence: f64) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (mean(values), 0.0);
    }
    let se = standard_error(values);
    let ci = se * t_critical(confidence, n - 1);
    (mean(values), ci)
}

/// Two-sided Student-t critical value for the given confidence level and
/// degrees of freedom.
///
/// Solves `P(|T| <= t) = confidence` by bisection on the t survival
/// function. `confidence` must lie in (0, 1) and `df >= 1`.
pub fn t_critical(confidence: f64, df: usize) -> f64 {
    debug_assert!(confidence > 0.0 && confidence < 1.0);
    debug_assert!(df >= 1);

    let tail = (1.0 - confidence) / 2.0;

    // Bracket the root, then bisect. The survival function is strictly
    // decreasing in t, so this converges unconditionally.
    let mut hi = 1.0;
    while t_survival(hi, df) > tail {
        hi *= 2.0;
        if hi > 1e12 {
            break;
        }
    }
    let mut lo = 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if t_survival(mid, df) > tail {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Upper-tail probability `P(T > t)` of the Student-t distribution, t >= 0.
fn t_survival(t: f64, df: usize) -> f64 {
    let df = df as f64;
    let x = df / (df + t * t);
    0.5 * reg_inc_beta(df / 2.0, 0.5, x)
}

/// Regularized incomplete beta function `I_x(a, b)`.
fn reg_inc_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_cont_frac(a, b, x) / a
    } else {
        1.0 - front * beta_cont_frac(b, a, 1.0 - x) / b
    }
}

/// Continued-fraction expansion of the incomplete beta function
/// (modified Lentz's method).
fn beta_cont_frac(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 3e-14;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula.
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = 0.99999999999980993;
    for (i, &coeff) in COEFFS.iter().enumerate() {
        acc += coeff / (x + i as f64 + 1.0);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}
