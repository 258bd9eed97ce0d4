// -----------------------------------------------------------------------------
// partition_function
// -----------------------------------------------------------------------------
/// Number of ways to write `n` as a sum of positive integers, `p(n)`.
///
/// Built from the recurrence on partitions with addends at most `k`,
/// `P(n, k) = P(n, k - 1) + P(n - k, k)` with `P(0, k) = 1` and `P(n, 0) = 0` for `n > 0`.
/// By convention `p(0) = 1`.
pub fn partition_function(n: usize) -> u64 {
    // table[m] holds P(m, k) for the current k
    let mut table = vec![0u64; n + 1];
    table[0] = 1;
    for k in 1..=n {
        for m in k..=n {
            table[m] += table[m - k];
        }
    }
    table[n]
}

// -----------------------------------------------------------------------------
// integer_partitions
// integer_partitions_with_parts
// -----------------------------------------------------------------------------
/// All partitions of `n` in multiplicity form.
///
/// Each partition is a vector `m` of length `n` where `m[j - 1]` is the number of
/// addends equal to `j`, so that `Σ j m[j - 1] = n`.
/// Partitions are listed starting from `[n]` and ending with `[1, ..., 1]`.
pub fn integer_partitions(n: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    _enumerate(n, n, None, &mut vec![0; n], &mut out);
    out
}

/// Partitions of `n` with exactly `k` addends, in the form of [integer_partitions].
///
/// These index the terms of the partial Bell polynomial `B_{n,k}`.
pub fn integer_partitions_with_parts(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k <= n && (k != 0 || n == 0) {
        _enumerate(n, n, Some(k), &mut vec![0; n], &mut out);
    }
    out
}

fn _enumerate(
    rest: usize,
    max_part: usize,
    parts: Option<usize>,
    mult: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if rest == 0 {
        if parts.map_or(true, |p| p == 0) {
            out.push(mult.clone());
        }
        return;
    }
    if parts == Some(0) {
        return;
    }
    for part in (1..=max_part.min(rest)).rev() {
        if let Some(p) = parts {
            // the remaining p - 1 addends are at least 1 and at most `part`
            if rest - part < p - 1 || rest - part > (p - 1) * part {
                continue;
            }
        }
        mult[part - 1] += 1;
        _enumerate(rest - part, part, parts.map(|p| p - 1), mult, out);
        mult[part - 1] -= 1;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(5, 7)]
    #[case(10, 42)]
    #[case(20, 627)]
    fn test_partition_function(#[case] n: usize, #[case] expected: u64) {
        assert_eq!(partition_function(n), expected);
    }

    #[test]
    fn test_enumeration_matches_count() {
        for n in 0..15 {
            let parts = integer_partitions(n);
            assert_eq!(parts.len() as u64, partition_function(n));
            for m in &parts {
                let total: usize = m.iter().enumerate().map(|(j, c)| (j + 1) * c).sum();
                assert_eq!(total, n);
            }
        }
    }

    #[test]
    fn test_partitions_of_four() {
        let parts = integer_partitions(4);
        assert_eq!(
            parts,
            vec![
                vec![0, 0, 0, 1], // 4
                vec![1, 0, 1, 0], // 3 + 1
                vec![0, 2, 0, 0], // 2 + 2
                vec![2, 1, 0, 0], // 2 + 1 + 1
                vec![4, 0, 0, 0], // 1 + 1 + 1 + 1
            ]
        );
    }

    #[rstest]
    #[case(4, 2, 2)]
    #[case(6, 3, 3)]
    #[case(7, 1, 1)]
    #[case(7, 7, 1)]
    #[case(3, 4, 0)]
    #[case(0, 0, 1)]
    #[case(3, 0, 0)]
    fn test_partitions_with_parts(#[case] n: usize, #[case] k: usize, #[case] count: usize) {
        let parts = integer_partitions_with_parts(n, k);
        assert_eq!(parts.len(), count);
        assert!(parts.iter().all(|m| m.iter().sum::<usize>() == k));
    }

    #[test]
    fn test_partitions_with_parts_cover_all() {
        for n in 1..12 {
            let by_parts: usize = (1..=n)
                .map(|k| integer_partitions_with_parts(n, k).len())
                .sum();
            assert_eq!(by_parts as u64, partition_function(n));
        }
    }
}
