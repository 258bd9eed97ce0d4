use super::binomial_coefficient;

// -----------------------------------------------------------------------------
// multinomial_coefficient
// -----------------------------------------------------------------------------
/// `(k_1 + ... + k_m)! / (k_1! ... k_m!)`.
///
/// Computed as a product of binomial coefficients so that intermediate values
/// stay as small as the result.
pub fn multinomial_coefficient(ks: &[usize]) -> u64 {
    let mut total = 0;
    let mut res = 1u64;
    for &k in ks {
        total += k;
        res *= binomial_coefficient(total, k);
    }
    res
}

// -----------------------------------------------------------------------------
// weak_compositions
// bounded_weak_compositions
// -----------------------------------------------------------------------------
/// All ordered ways to write `total` as a sum of `parts` non-negative integers.
///
/// Compositions are listed in reverse lexicographic order,
/// i.e. `[total, 0, ..., 0]` comes first.
pub fn weak_compositions(total: usize, parts: usize) -> Vec<Vec<usize>> {
    bounded_weak_compositions(total, &vec![0; parts], 0)
}

/// Weak compositions `m` of `total` into `costs.len()` parts such that
/// `Σ m_i costs_i <= budget`, in the order of [weak_compositions].
///
/// Branches exceeding the budget are cut during the enumeration, so the cost
/// is driven by the number of admissible compositions.
pub fn bounded_weak_compositions(total: usize, costs: &[usize], budget: usize) -> Vec<Vec<usize>> {
    fn _fill(
        rest: usize,
        slot: usize,
        spent: usize,
        ctx: (&[usize], &[usize], usize),
        cur: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        let (costs, cheapest, budget) = ctx;
        if slot + 1 == cur.len() {
            if spent + rest * costs[slot] <= budget {
                cur[slot] = rest;
                out.push(cur.clone());
            }
            return;
        }
        for k in (0..=rest).rev() {
            let spent = spent + k * costs[slot];
            // the remaining units cost at least the cheapest of the following slots
            if spent + (rest - k) * cheapest[slot + 1] > budget {
                continue;
            }
            cur[slot] = k;
            _fill(rest - k, slot + 1, spent, ctx, cur, out);
        }
    }

    if costs.is_empty() {
        return if total == 0 {
            vec![Vec::new()]
        } else {
            Vec::new()
        };
    }
    // cheapest[i] = min(costs[i..])
    let mut cheapest = costs.to_vec();
    for i in (0..cheapest.len() - 1).rev() {
        cheapest[i] = cheapest[i].min(cheapest[i + 1]);
    }
    let mut out = Vec::new();
    _fill(
        total,
        0,
        0,
        (costs, &cheapest, budget),
        &mut vec![0; costs.len()],
        &mut out,
    );
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::combinatorics::factorial;

    #[rstest]
    #[case(&[], 1)]
    #[case(&[3], 1)]
    #[case(&[1, 1], 2)]
    #[case(&[2, 1, 1], 12)]
    #[case(&[0, 2, 0, 3], 10)]
    fn test_multinomial(#[case] ks: &[usize], #[case] expected: u64) {
        assert_eq!(multinomial_coefficient(ks), expected);
    }

    #[test]
    fn test_multinomial_matches_factorials() {
        let ks = [3, 2, 4, 1];
        let denom: u64 = ks.iter().map(|k| factorial(*k)).product();
        assert_eq!(multinomial_coefficient(&ks), factorial(10) / denom);
    }

    #[test]
    fn test_weak_compositions() {
        let comps = weak_compositions(2, 2);
        assert_eq!(comps, vec![vec![2, 0], vec![1, 1], vec![0, 2]]);

        assert_eq!(weak_compositions(0, 0), vec![Vec::<usize>::new()]);
        assert!(weak_compositions(1, 0).is_empty());
        assert_eq!(weak_compositions(0, 3), vec![vec![0, 0, 0]]);
    }

    #[rstest]
    #[case(3, 3)]
    #[case(4, 2)]
    #[case(5, 4)]
    fn test_weak_compositions_count(#[case] total: usize, #[case] parts: usize) {
        let comps = weak_compositions(total, parts);
        assert_eq!(
            comps.len() as u64,
            binomial_coefficient(total + parts - 1, parts - 1)
        );
        assert!(comps.iter().all(|c| c.iter().sum::<usize>() == total));
    }

    #[test]
    fn test_bounded_weak_compositions() {
        let comps = bounded_weak_compositions(2, &[1, 2, 1], 3);

        // [0, 2, 0] costs 4
        assert_eq!(
            comps,
            vec![
                vec![2, 0, 0],
                vec![1, 1, 0],
                vec![1, 0, 1],
                vec![0, 1, 1],
                vec![0, 0, 2],
            ]
        );
    }

    #[rstest]
    #[case(3, &[1, 2, 3, 1], 5)]
    #[case(4, &[2, 1, 2, 1, 3, 1], 7)]
    #[case(2, &[0, 5], 4)]
    fn test_bounded_matches_filtered(
        #[case] total: usize,
        #[case] costs: &[usize],
        #[case] budget: usize,
    ) {
        let cost = |c: &Vec<usize>| c.iter().zip(costs).map(|(m, w)| m * w).sum::<usize>();
        let expected: Vec<_> = weak_compositions(total, costs.len())
            .into_iter()
            .filter(|c| cost(c) <= budget)
            .collect();

        assert_eq!(bounded_weak_compositions(total, costs, budget), expected);
    }
}
