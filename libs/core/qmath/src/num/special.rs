use crate::combinatorics::factorial;

// Bernoulli numbers B_2, B_4, ..., B_16.
const BERNOULLI_EVEN: [f64; 8] = [
    1.0 / 6.0,
    -1.0 / 30.0,
    1.0 / 42.0,
    -1.0 / 30.0,
    5.0 / 66.0,
    -691.0 / 2730.0,
    7.0 / 6.0,
    -3617.0 / 510.0,
];

// arguments are shifted up to this threshold before the asymptotic series is used
const ASYMPTOTIC_THRESHOLD: f64 = 20.0;

// -----------------------------------------------------------------------------
// digamma
// polygamma
// -----------------------------------------------------------------------------
/// Digamma function `ψ(x) = Γ'(x) / Γ(x)`.
///
/// Uses the recurrence `ψ(x) = ψ(x + 1) - 1/x` to move the argument into the
/// range of the asymptotic expansion.
/// Poles (non-positive integers) give non-finite values.
pub fn digamma(x: f64) -> f64 {
    if x.is_nan() || (x <= 0.0 && x == x.floor()) {
        return f64::NAN;
    }
    let mut x = x;
    let mut acc = 0.0;
    while x < ASYMPTOTIC_THRESHOLD {
        acc -= 1.0 / x;
        x += 1.0;
    }
    let inv2 = 1.0 / (x * x);
    let mut pow = inv2;
    let mut series = 0.0;
    for (j, b) in BERNOULLI_EVEN.iter().enumerate() {
        let two_j = 2.0 * (j + 1) as f64;
        series += b / two_j * pow;
        pow *= inv2;
    }
    acc + x.ln() - 0.5 / x - series
}

/// Polygamma function `ψ⁽ᵏ⁾(x)`, the `k`-th derivative of [digamma].
///
/// For `k >= 1`, `ψ⁽ᵏ⁾(x) = (-1)^(k+1) k! ζ(k+1, x)` and the Hurwitz zeta function
/// is evaluated by shifting the argument and applying the Euler-Maclaurin tail.
pub fn polygamma(k: usize, x: f64) -> f64 {
    if k == 0 {
        return digamma(x);
    }
    if x.is_nan() || (x <= 0.0 && x == x.floor()) {
        return f64::NAN;
    }
    let s = (k + 1) as f64;
    let mut x = x;
    let mut zeta = 0.0;
    while x < ASYMPTOTIC_THRESHOLD {
        zeta += x.powi(-(k as i32 + 1));
        x += 1.0;
    }

    // ζ(s, x) ~ x^(1-s)/(s-1) + x^(-s)/2 + Σ B_2j/(2j)! s(s+1)...(s+2j-2) x^(-s-2j+1)
    zeta += x.powf(1.0 - s) / (s - 1.0) + 0.5 * x.powf(-s);
    let inv2 = 1.0 / (x * x);
    let mut rising = s; // s(s+1)...(s+2j-2)
    let mut pow = x.powf(-s - 1.0);
    let mut fact = 2.0; // (2j)!
    for (j, b) in BERNOULLI_EVEN.iter().enumerate() {
        zeta += b / fact * rising * pow;
        let two_j = 2.0 * (j + 1) as f64;
        rising *= (s + two_j - 1.0) * (s + two_j);
        pow *= inv2;
        fact *= (two_j + 1.0) * (two_j + 2.0);
    }

    let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
    sign * factorial(k) as f64 * zeta
}
