// -----------------------------------------------------------------------------
// factorial
// -----------------------------------------------------------------------------
/// `n!`.
///
/// `20!` is the largest factorial representable in `u64`.
#[inline]
pub fn factorial(n: usize) -> u64 {
    debug_assert!(n <= 20, "{n}! overflows u64");
    (1..=n as u64).product()
}

// -----------------------------------------------------------------------------
// binomial_coefficient
// pascal_row
// -----------------------------------------------------------------------------
/// Number of ways to choose `k` elements out of `n`.
///
/// Returns zero when `k > n`.
/// Uses the multiplicative formula, where every intermediate value is itself
/// a binomial coefficient and the division is exact.
pub fn binomial_coefficient(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut res = 1u64;
    for i in 0..k {
        res = res * (n - i) as u64 / (i + 1) as u64;
    }
    res
}

/// The `n`-th row of Pascal's triangle, `[C(n, 0), ..., C(n, n)]`.
pub fn pascal_row(n: usize) -> Vec<u64> {
    let mut row = Vec::with_capacity(n + 1);
    row.push(1u64);
    for _ in 0..n {
        let mut next = Vec::with_capacity(row.len() + 1);
        next.push(1);
        next.extend(row.windows(2).map(|w| w[0] + w[1]));
        next.push(1);
        row = next;
    }
    row
}
