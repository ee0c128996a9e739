//! Statistical kernel: special functions, distribution tails, rank
//! correlation and two-sample tests.
//!
//! Undefined results (too few observations, constant input) are `None`,
//! never a panic. Plain descriptive helpers return NaN instead so they can
//! flow into tables and be rendered as "N/A".

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const EPS: f64 = 1e-15;
const TINY: f64 = 1e-300;
const MAX_ITER: usize = 500;

/// Correlation coefficient with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
}

/// Test statistic with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// Least-squares line through (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

// ── Descriptive ──────────────────────────────────────────────────────────────

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (n - 1 denominator); NaN below two points.
pub fn sample_std(xs: &[f64]) -> f64 {
    sample_variance(xs).sqrt()
}

fn sample_variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64
}

/// Percentage of `diff` relative to `base`; 0 when `base` is 0 or NaN.
pub fn safe_pct(diff: f64, base: f64) -> f64 {
    if base == 0.0 || base.is_nan() {
        return 0.0;
    }
    (diff / base) * 100.0
}

/// Average ranks (1-based), ties share the mean of their positions.
pub fn rank_average(xs: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && xs[order[j]] == xs[order[i]] {
            j += 1;
        }
        let avg = (i + j - 1) as f64 / 2.0 + 1.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}

/// Sizes of each group of tied values.
fn tie_groups(xs: &[f64]) -> Vec<usize> {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut groups = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        groups.push(j - i);
        i = j;
    }
    groups
}

// ── Special functions ────────────────────────────────────────────────────────

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of |Γ(x)| (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula.
        return (PI / (PI * x).sin().abs()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let a = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as f64));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized incomplete beta I_x(a, b).
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn clamp_tiny(v: f64) -> f64 {
    if v.abs() < TINY {
        TINY
    } else {
        v
    }
}

// Modified Lentz evaluation.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / clamp_tiny(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / clamp_tiny(1.0 + aa * d);
        c = clamp_tiny(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / clamp_tiny(1.0 + aa * d);
        c = clamp_tiny(1.0 + aa / c);
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized upper incomplete gamma Q(a, x).
pub fn incomplete_gamma_upper(a: f64, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    let ln_front = -x + a * x.ln() - ln_gamma(a);
    if x < a + 1.0 {
        // Series for P(a, x).
        let mut ap = a;
        let mut delta = 1.0 / a;
        let mut sum = delta;
        for _ in 0..MAX_ITER {
            ap += 1.0;
            delta *= x / ap;
            sum += delta;
            if delta.abs() < sum.abs() * EPS {
                break;
            }
        }
        1.0 - sum * ln_front.exp()
    } else {
        // Continued fraction for Q(a, x).
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / TINY;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=MAX_ITER {
            let i = i as f64;
            let an = -i * (i - a);
            b += 2.0;
            d = 1.0 / clamp_tiny(an * d + b);
            c = clamp_tiny(b + an / c);
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < EPS {
                break;
            }
        }
        ln_front.exp() * h
    }
}

// ── Distribution tails ───────────────────────────────────────────────────────

/// P(Z > z) for a standard normal Z.
pub fn normal_sf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    // erfc(z / sqrt 2) == Q(1/2, z^2 / 2)
    let half_erfc = 0.5 * incomplete_gamma_upper(0.5, z * z / 2.0);
    if z >= 0.0 {
        half_erfc
    } else {
        1.0 - half_erfc
    }
}

/// Two-sided p-value of Student's t with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

// ── Correlation ──────────────────────────────────────────────────────────────

/// Pearson correlation with a t-based two-sided p-value.
/// Undefined below three pairs or when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
        sxy += (a - mx) * (b - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let one_minus_r2 = 1.0 - r * r;
    let p_value = if one_minus_r2 <= 0.0 {
        0.0
    } else {
        student_t_two_sided(r * (df / one_minus_r2).sqrt(), df)
    };
    Some(Correlation {
        coefficient: r,
        p_value,
    })
}

/// Point-biserial correlation: Pearson with one dichotomous (or count) side.
pub fn point_biserial(indicator: &[f64], values: &[f64]) -> Option<Correlation> {
    pearson(indicator, values)
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<Correlation> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&rank_average(x), &rank_average(y))
}

/// Ordinary least squares of y on x.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<Regression> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
        sxy += (a - mx) * (b - my);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let r = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    Some(Regression {
        slope,
        intercept: my - slope * mx,
        r,
    })
}

// ── Two-sample tests ─────────────────────────────────────────────────────────

/// Student's two-sample t-test with pooled (equal) variances, two-sided.
pub fn t_test_pooled(a: &[f64], b: &[f64]) -> Option<TestOutcome> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return None;
    }
    let df = (n1 + n2 - 2) as f64;
    let pooled =
        ((n1 - 1) as f64 * sample_variance(a) + (n2 - 1) as f64 * sample_variance(b)) / df;
    let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    if se == 0.0 || !se.is_finite() {
        return None;
    }
    let t = (mean(a) - mean(b)) / se;
    Some(TestOutcome {
        statistic: t,
        p_value: student_t_two_sided(t, df),
    })
}

/// Mann-Whitney U test, two-sided. The statistic is U of `a`.
///
/// Exact null distribution when either sample has at most 8 values and
/// there are no ties; otherwise the normal approximation with tie and
/// continuity corrections.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<TestOutcome> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return None;
    }
    let combined: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = rank_average(&combined);
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u = u1.max(u2);

    let ties = tie_groups(&combined);
    let has_ties = ties.iter().any(|&t| t > 1);

    let p_value = if (n1 <= 8 || n2 <= 8) && !has_ties {
        2.0 * exact_u_upper_tail(n1, n2, u)
    } else {
        let n = (n1 + n2) as f64;
        let tie_term: f64 = ties.iter().map(|&t| (t * t * t - t) as f64).sum();
        let variance = (n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
        if variance <= 0.0 {
            return None;
        }
        let z = (u - (n1 * n2) as f64 / 2.0 - 0.5) / variance.sqrt();
        2.0 * normal_sf(z)
    };

    Some(TestOutcome {
        statistic: u1,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// P(U >= u) under the null, by counting rank-sum subsets.
fn exact_u_upper_tail(n1: usize, n2: usize, u: f64) -> f64 {
    // U's null distribution is symmetric in the two sample sizes.
    let k = n1.min(n2);
    let n = n1 + n2;
    let max_sum: usize = (n - k..n).sum();

    // ways[j][s]: subsets of size j with 0-based position sum s.
    let mut ways = vec![vec![0.0f64; max_sum + 1]; k + 1];
    ways[0][0] = 1.0;
    for pos in 0..n {
        for j in (1..=k.min(pos + 1)).rev() {
            for s in (pos..=max_sum).rev() {
                let prev = ways[j - 1][s - pos];
                ways[j][s] += prev;
            }
        }
    }

    let offset = k * k.saturating_sub(1) / 2;
    let total: f64 = ways[k].iter().sum();
    let tail: f64 = ways[k]
        .iter()
        .enumerate()
        .filter(|(s, _)| *s >= offset && (*s - offset) as f64 >= u - 1e-9)
        .map(|(_, w)| w)
        .sum();
    tail / total
}
