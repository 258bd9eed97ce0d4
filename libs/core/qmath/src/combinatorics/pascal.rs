// -----------------------------------------------------------------------------
// next_pascal
// -----------------------------------------------------------------------------
/// Pascal-like row transform `P(t) -> P'(t) (1 ± t^2)` on polynomial coefficients.
///
/// `prev[i]` is the coefficient of `t^i`. The returned row is one longer than `prev`
/// and its `j`-th entry is `(j + 1) prev[j + 1] ± (j - 1) prev[j - 1]`.
///
/// Starting from `[0, 1]` (the polynomial `t`), the `n`-th iterate with `plus = true`
/// gives the polynomial `P_n` such that `tan⁽ⁿ⁾(x) = P_n(tan x)`;
/// with `plus = false` it gives the same for `tanh`.
///
/// Coefficients are kept in `f64`: they leave the `i64` range from `n = 20` on.
pub fn next_pascal(prev: &[f64], plus: bool) -> Vec<f64> {
    let sign = if plus { 1.0 } else { -1.0 };
    let at = |i: usize| prev.get(i).copied().unwrap_or(0.0);
    (0..=prev.len())
        .map(|j| {
            let up = (j + 1) as f64 * at(j + 1);
            let down = if j >= 1 {
                (j - 1) as f64 * at(j - 1)
            } else {
                0.0
            };
            up + sign * down
        })
        .collect()
}
