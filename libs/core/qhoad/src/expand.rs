use std::collections::BTreeMap;

use qmath::combinatorics::{
    bounded_weak_compositions, factorial, integer_partitions_with_parts, multinomial_coefficient,
};

use crate::{diffop::Monomial, op::BinaryOp};

// -----------------------------------------------------------------------------
// expand_univariate
// -----------------------------------------------------------------------------
/// Faà di Bruno expansion of a power of the differential of `f = g(x)`.
///
/// With `ders[j - 1] = g⁽ʲ⁾(x)`, `d(f) = Σ_j g⁽ʲ⁾(x)/j! d(x)^j` and this returns the
/// coefficients `(n, w)` of `d(x)^n` in `d(f)^power` for `power <= n <= max_order`.
/// Each coefficient is a sum over the partitions of `n` into `power` addends
/// `n = Σ j m_j`, weighted by `power! / ∏ m_j!`.
/// `power = 0` gives the identity with weight one.
pub(crate) fn expand_univariate(ders: &[f64], power: usize, max_order: usize) -> Vec<(usize, f64)> {
    if power == 0 {
        return vec![(0, 1.0)];
    }
    let coefs: Vec<_> = ders
        .iter()
        .enumerate()
        .map(|(j, d)| d / factorial(j + 1) as f64)
        .collect();
    (power..=max_order)
        .filter_map(|n| {
            let w: f64 = integer_partitions_with_parts(n, power)
                .iter()
                .map(|ms| {
                    ms.iter()
                        .zip(&coefs)
                        .filter(|(m, _)| **m > 0)
                        .fold(multinomial_coefficient(ms) as f64, |acc, (m, c)| {
                            acc * c.powi(*m as i32)
                        })
                })
                .sum();
            (w != 0.0).then_some((n, w))
        })
        .collect()
}

// -----------------------------------------------------------------------------
// expand_multinomial
// -----------------------------------------------------------------------------
/// Multinomial expansion of `(Σ_i w_i M_i)^power` truncated to total order `max_order`.
///
/// Monomials appearing several times are merged, the result is sorted by monomial.
pub(crate) fn expand_multinomial(
    terms: &[(Monomial, f64)],
    power: usize,
    max_order: usize,
) -> Vec<(Monomial, f64)> {
    let costs: Vec<_> = terms.iter().map(|(m, _)| m.total_order()).collect();
    let mut acc = BTreeMap::<Monomial, f64>::new();
    for ms in bounded_weak_compositions(power, &costs, max_order) {
        let mut mono = Monomial::default();
        let mut w = multinomial_coefficient(&ms) as f64;
        for (m, (t, tw)) in ms.iter().zip(terms).filter(|(m, _)| **m > 0) {
            mono = mono.mul(&t.pow(*m));
            w *= tw.powi(*m as i32);
        }
        *acc.entry(mono).or_default() += w;
    }
    acc.into_iter().filter(|(_, w)| *w != 0.0).collect()
}

// -----------------------------------------------------------------------------
// binary_terms
// -----------------------------------------------------------------------------
/// Taylor terms of `d(op(lhs, rhs))` as monomials on the operand keys.
pub(crate) fn binary_terms(
    op: BinaryOp,
    (lhs, x): (usize, f64),
    (rhs, y): (usize, f64),
    max_order: usize,
) -> Vec<(Monomial, f64)> {
    op.taylor_terms(x, y, max_order)
        .into_iter()
        .map(|(a, b, w)| (Monomial::from_factors([(lhs, a), (rhs, b)]), w))
        .collect()
}
