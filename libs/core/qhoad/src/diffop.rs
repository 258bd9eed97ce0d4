use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
};

use itertools::Itertools;
use qmath::combinatorics::factorial;

use crate::{CalcTree, Error, Expr, Graph};

// -----------------------------------------------------------------------------
// Monomial
// -----------------------------------------------------------------------------
/// Product `∏ d(n)^k` of powers of first order differentials.
///
/// Factors are `(key, power)` pairs sorted by key with positive powers,
/// so the representation is canonical. Keys are node ids or positions in a
/// [CalcTree] depending on the context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct Monomial(Vec<(usize, usize)>);

/// Factors are compared from the largest key downwards.
impl Ord for Monomial {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Monomial {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Monomial {
    #[inline]
    pub(crate) fn single(key: usize, power: usize) -> Self {
        if power == 0 {
            Self::default()
        } else {
            Self(vec![(key, power)])
        }
    }

    /// Build from arbitrary factors, merging repeated keys.
    pub(crate) fn from_factors(factors: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut res = Self::default();
        for (key, power) in factors {
            res = res.mul(&Self::single(key, power));
        }
        res
    }

    #[inline]
    pub(crate) fn factors(&self) -> &[(usize, usize)] {
        &self.0
    }

    #[inline]
    pub(crate) fn is_identity(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub(crate) fn total_order(&self) -> usize {
        self.0.iter().map(|(_, p)| p).sum()
    }

    #[inline]
    pub(crate) fn power_of(&self, key: usize) -> usize {
        self.0
            .binary_search_by_key(&key, |(k, _)| *k)
            .map_or(0, |i| self.0[i].1)
    }

    /// The monomial with the factor on `key` removed.
    #[inline]
    pub(crate) fn without(&self, key: usize) -> Self {
        Self(self.0.iter().filter(|(k, _)| *k != key).copied().collect())
    }

    /// Product; powers of common keys are summed.
    pub(crate) fn mul(&self, other: &Self) -> Self {
        let mut res = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut lhs, mut rhs) = (self.0.iter().peekable(), other.0.iter().peekable());
        loop {
            let next = match (lhs.peek(), rhs.peek()) {
                (Some(l), Some(r)) => match l.0.cmp(&r.0) {
                    Ordering::Less => lhs.next().copied(),
                    Ordering::Greater => rhs.next().copied(),
                    Ordering::Equal => {
                        let merged = (l.0, l.1 + r.1);
                        lhs.next();
                        rhs.next();
                        Some(merged)
                    }
                },
                (Some(_), None) => lhs.next().copied(),
                (None, Some(_)) => rhs.next().copied(),
                (None, None) => break,
            };
            res.extend(next);
        }
        Self(res)
    }

    #[inline]
    pub(crate) fn pow(&self, k: usize) -> Self {
        if k == 0 {
            return Self::default();
        }
        Self(self.0.iter().map(|(key, p)| (*key, p * k)).collect())
    }

    /// `∏ k!`, the ratio between a partial derivative and its Taylor coefficient.
    #[inline]
    pub(crate) fn multiplicity(&self) -> f64 {
        self.0.iter().map(|(_, p)| factorial(*p) as f64).product()
    }

    /// Re-key the factors, failing on the first key which cannot be mapped.
    pub(crate) fn remap<E>(&self, f: impl Fn(usize) -> Result<usize, E>) -> Result<Self, E> {
        let mut factors = self
            .0
            .iter()
            .map(|(k, p)| f(*k).map(|k| (k, *p)))
            .collect::<Result<Vec<_>, _>>()?;
        factors.sort();
        Ok(Self(factors))
    }
}

// -----------------------------------------------------------------------------
// DiffOp
// d
// -----------------------------------------------------------------------------
/// Differential operator, a product of powers of differentials of expressions.
///
/// `d(x).pow(2) * d(y)` requests `∂³/∂x²∂y` when `x` and `y` are variables.
/// On intermediate expressions it designates a term of the Taylor expansion
/// in the differentials of those expressions, which is how outputs are seeded
/// in [crate::BackPropagator].
#[derive(Debug)]
pub struct DiffOp<K> {
    graph: Graph<K>,
    mono: Monomial,
}

/// First order differential of `expr`.
#[inline]
pub fn d<K>(expr: &Expr<K>) -> DiffOp<K> {
    DiffOp {
        graph: expr.graph().clone(),
        mono: Monomial::single(expr.id(), 1),
    }
}

impl<K> Clone for DiffOp<K> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            mono: self.mono.clone(),
        }
    }
}

impl<K> PartialEq for DiffOp<K> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.mono == other.mono && Graph::ptr_eq(&self.graph, &other.graph)
    }
}

impl<K> Eq for DiffOp<K> {}

impl<K> Hash for DiffOp<K> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mono.hash(state);
    }
}

impl<K> Display for DiffOp<K>
where
    K: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.mono.is_identity() {
            return write!(f, "1");
        }
        let rendered = self
            .mono
            .factors()
            .iter()
            .map(|(id, p)| {
                let expr = Expr::new(self.graph.clone(), *id);
                match p {
                    1 => format!("d({expr})"),
                    _ => format!("d^{p}({expr})"),
                }
            })
            .join("*");
        write!(f, "{rendered}")
    }
}

//
// ctor
//
impl<K> DiffOp<K> {
    /// The identity operator, i.e. the value itself.
    #[inline]
    pub fn identity(graph: &Graph<K>) -> Self {
        Self {
            graph: graph.clone(),
            mono: Monomial::default(),
        }
    }

    #[inline]
    pub(crate) fn from_monomial(graph: Graph<K>, mono: Monomial) -> Self {
        Self { graph, mono }
    }
}

//
// methods
//
impl<K> DiffOp<K> {
    /// Raise every factor to the `k`-th power.
    #[inline]
    pub fn pow(&self, k: usize) -> Self {
        Self {
            graph: self.graph.clone(),
            mono: self.mono.pow(k),
        }
    }

    #[inline]
    pub fn total_order(&self) -> usize {
        self.mono.total_order()
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.mono.is_identity()
    }

    #[inline]
    pub fn graph(&self) -> &Graph<K> {
        &self.graph
    }

    /// Factors as `(expression, power)` in node creation order.
    pub fn factors(&self) -> Vec<(Expr<K>, usize)> {
        self.mono
            .factors()
            .iter()
            .map(|(id, p)| (Expr::new(self.graph.clone(), *id), *p))
            .collect()
    }

    #[inline]
    pub(crate) fn monomial(&self) -> &Monomial {
        &self.mono
    }
}

//
// arithmetic operations
//
impl<K> std::ops::Mul<&DiffOp<K>> for &DiffOp<K> {
    type Output = DiffOp<K>;

    #[inline]
    fn mul(self, rhs: &DiffOp<K>) -> Self::Output {
        if !Graph::ptr_eq(&self.graph, &rhs.graph) {
            panic!(
                "Cannot Mul differential operators from different graphs: lhs.graph={:?}, rhs.graph={:?}",
                self.graph._debug_ptr(),
                rhs.graph._debug_ptr()
            );
        }
        DiffOp {
            graph: self.graph.clone(),
            mono: self.mono.mul(&rhs.mono),
        }
    }
}

impl<K> std::ops::Mul<DiffOp<K>> for &DiffOp<K> {
    type Output = DiffOp<K>;

    #[inline]
    fn mul(self, rhs: DiffOp<K>) -> Self::Output {
        self * &rhs
    }
}

impl<K> std::ops::Mul<&DiffOp<K>> for DiffOp<K> {
    type Output = DiffOp<K>;

    #[inline]
    fn mul(self, rhs: &DiffOp<K>) -> Self::Output {
        &self * rhs
    }
}

impl<K> std::ops::Mul<DiffOp<K>> for DiffOp<K> {
    type Output = DiffOp<K>;

    #[inline]
    fn mul(self, rhs: DiffOp<K>) -> Self::Output {
        &self * &rhs
    }
}

impl<K> std::ops::MulAssign<&DiffOp<K>> for DiffOp<K> {
    #[inline]
    fn mul_assign(&mut self, rhs: &DiffOp<K>) {
        *self = &*self * rhs;
    }
}

// -----------------------------------------------------------------------------
// sort_differential_operators
// -----------------------------------------------------------------------------
/// Sort operators into the canonical order induced by `tree`.
///
/// Factors are compared by their position in the topological order of the tree,
/// the latest position first. The sort is stable, hence sorting a sorted
/// sequence leaves it unchanged.
pub fn sort_differential_operators<K>(
    ops: &mut [DiffOp<K>],
    tree: &CalcTree<K>,
) -> Result<(), Error<K>>
where
    K: Display,
{
    let keys = ops
        .iter()
        .map(|op| tree._monomial(op))
        .collect::<Result<Vec<_>, _>>()?;
    let mut keyed: Vec<_> = keys.into_iter().zip(ops.iter().cloned()).collect();
    keyed.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
    for (dst, (_, op)) in ops.iter_mut().zip(keyed) {
        *dst = op;
    }
    Ok(())
}
