use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use crate::{
    calc_tree::Slot,
    diffop::Monomial,
    expand::{binary_terms, expand_multinomial, expand_univariate},
    CalcTree, DiffOp, Error, Graph,
};

/// Highest total order of an input derivative.
///
/// Multiplicities `∏ k!` are computed in `u64`, which holds `20!` but not `21!`.
pub const MAX_ORDER: usize = 20;

// -----------------------------------------------------------------------------
// DerivativeType
// -----------------------------------------------------------------------------
/// Convention used to read a result of back-propagation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DerivativeType {
    /// Coefficient of the monomial in the Taylor expansion of the seeded outputs.
    TaylorCoefficient,
    /// Partial derivative, i.e. the Taylor coefficient multiplied by `∏ k!`.
    #[default]
    Derivative,
}

// -----------------------------------------------------------------------------
// _Request
// -----------------------------------------------------------------------------
#[derive(Debug, Clone)]
struct _Request {
    // keyed by node id
    key: Monomial,
    // keyed by position in the tree
    at: Monomial,
    value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum _Role {
    Input(usize),
    Output(usize),
}

// -----------------------------------------------------------------------------
// BackPropagator
// -----------------------------------------------------------------------------
/// Higher order reverse mode propagation over a [CalcTree].
///
/// Requested operators are split into inputs, whose factors are all variables,
/// and outputs, anything else. Outputs are seeded with [BackPropagator::set],
/// then [BackPropagator::backpropagate] pushes the seeded Taylor expansion
/// down to the variables, node by node in reverse topological order.
///
/// ```
/// use qhoad::{d, BackPropagator, CalcTree, Graph};
///
/// let graph = Graph::new();
/// let x = graph.create_var("x").unwrap();
/// let y = graph.create_var("y").unwrap();
/// let f = &x * &y;
///
/// let mut tree = CalcTree::new(&[&f]).unwrap();
/// tree.set(&x, 2.0).unwrap();
/// tree.set(&y, 3.0).unwrap();
/// tree.evaluate();
///
/// let mut bp = BackPropagator::new(&tree, &[d(&f), d(&x), d(&y)]).unwrap();
/// bp.set(&d(&f), 1.0).unwrap();
/// bp.backpropagate(&tree).unwrap();
///
/// assert_eq!(bp.get(&d(&x)).unwrap(), 3.0);
/// assert_eq!(bp.get(&d(&y)).unwrap(), 2.0);
/// ```
#[derive(Debug)]
pub struct BackPropagator<K> {
    graph: Graph<K>,
    order: Vec<usize>,
    inputs: Vec<_Request>,
    outputs: Vec<_Request>,
    roles: HashMap<Monomial, _Role>,
    max_order: usize,
    // maximal requested power of each variable, zero elsewhere
    caps: Vec<usize>,
    // whether a node depends on a requested variable
    relevant: Vec<bool>,
}

//
// ctor
//
impl<K> BackPropagator<K> {
    /// Classify `ders` against `tree` and precompute the pruning tables.
    ///
    /// Input derivatives are limited to a total order of [MAX_ORDER];
    /// larger requests fail with [Error::OrderTooHigh].
    pub fn new(tree: &CalcTree<K>, ders: &[DiffOp<K>]) -> Result<Self, Error<K>>
    where
        K: Display,
    {
        let slots = tree._slots();
        let mut inputs = BTreeMap::new();
        let mut outputs = BTreeMap::new();
        for op in ders {
            let at = tree._monomial(op)?;
            if at.is_identity() {
                return Err(Error::ZeroOrder);
            }
            let is_input = at
                .factors()
                .iter()
                .all(|(pos, _)| matches!(slots[*pos], Slot::Var(_)));
            let dst = if is_input { &mut inputs } else { &mut outputs };
            dst.insert(at, op.monomial().clone());
        }
        if inputs.is_empty() {
            return Err(Error::NoInputDerivatives);
        }
        if outputs.is_empty() {
            return Err(Error::NoOutputDerivatives);
        }

        let into_requests = |reqs: BTreeMap<Monomial, Monomial>| -> Vec<_Request> {
            reqs.into_iter()
                .map(|(at, key)| _Request {
                    key,
                    at,
                    value: 0.0,
                })
                .collect()
        };
        let inputs = into_requests(inputs);
        let outputs = into_requests(outputs);

        let roles = inputs
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), _Role::Input(i)))
            .chain(
                outputs
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (r.key.clone(), _Role::Output(i))),
            )
            .collect();

        let max_order = inputs
            .iter()
            .map(|r| r.at.total_order())
            .max()
            .unwrap_or_default();
        if max_order > MAX_ORDER {
            return Err(Error::OrderTooHigh(max_order));
        }
        let mut caps = vec![0; slots.len()];
        for (pos, k) in inputs.iter().flat_map(|r| r.at.factors()) {
            caps[*pos] = caps[*pos].max(*k);
        }
        let mut relevant = Vec::with_capacity(slots.len());
        for (pos, slot) in slots.iter().enumerate() {
            let flag = match *slot {
                Slot::Var(_) => caps[pos] > 0,
                Slot::Const(_) => false,
                Slot::Unary(_, arg) => relevant[arg],
                Slot::Binary(_, lhs, rhs) => relevant[lhs] || relevant[rhs],
            };
            relevant.push(flag);
        }

        Ok(Self {
            graph: tree.graph().clone(),
            order: tree._order().to_vec(),
            inputs,
            outputs,
            roles,
            max_order,
            caps,
            relevant,
        })
    }
}

//
// methods
//
impl<K> BackPropagator<K> {
    /// Seed an output with the Taylor coefficient `value`.
    pub fn set(&mut self, op: &DiffOp<K>, value: f64) -> Result<(), Error<K>>
    where
        K: Display,
    {
        match self._role(op)? {
            Some(_Role::Output(i)) => {
                self.outputs[i].value = value;
                Ok(())
            }
            _ => Err(Error::NotAnOutput(op.to_string())),
        }
    }

    /// Clear seeds and results.
    pub fn reset(&mut self) {
        for req in self.outputs.iter_mut().chain(self.inputs.iter_mut()) {
            req.value = 0.0;
        }
    }

    /// Propagate the seeds down to the variables.
    ///
    /// `tree` must be the tree this propagator was built from, evaluated at the
    /// point of interest. Previous results are overwritten.
    pub fn backpropagate(&mut self, tree: &CalcTree<K>) -> Result<(), Error<K>> {
        let same_graph = Graph::ptr_eq(tree.graph(), &self.graph);
        if !same_graph || tree._order() != self.order.as_slice() {
            return Err(Error::TreeMismatch);
        }
        let slots = tree._slots();
        let values = tree._values();

        let mut buckets = vec![BTreeMap::<Monomial, f64>::new(); slots.len()];
        let mut terminal = BTreeMap::<Monomial, f64>::new();
        let mut seeds = 0;
        for out in self.outputs.iter().filter(|r| r.value != 0.0) {
            self._file(
                slots,
                out.at.clone(),
                out.value,
                &mut buckets,
                &mut terminal,
            );
            seeds += 1;
        }

        for pos in (0..slots.len()).rev() {
            let bucket = std::mem::take(&mut buckets[pos]);
            if bucket.is_empty() {
                continue;
            }
            log::trace!(
                "back-propagating node: pos={}, slot={:?}, terms={}",
                pos,
                slots[pos],
                bucket.len()
            );
            let mut cache = HashMap::new();
            for (mono, coef) in bucket {
                let k = mono.power_of(pos);
                let rest = mono.without(pos);
                let budget = self.max_order - rest.total_order();
                let expansion = cache
                    .entry((k, budget))
                    .or_insert_with(|| _expand(slots[pos], values, pos, k, budget));
                for (em, w) in expansion.iter() {
                    self._file(slots, rest.mul(em), coef * w, &mut buckets, &mut terminal);
                }
            }
        }

        for req in self.inputs.iter_mut() {
            req.value = terminal.get(&req.at).copied().unwrap_or_default();
        }
        log::debug!(
            "back-propagation is done: seeds={}, max_order={}, terminals={}",
            seeds,
            self.max_order,
            terminal.len()
        );
        Ok(())
    }

    /// Partial derivative of the seeded outputs for a requested input.
    #[inline]
    pub fn get(&self, op: &DiffOp<K>) -> Result<f64, Error<K>>
    where
        K: Display,
    {
        self.get_as(op, DerivativeType::Derivative)
    }

    pub fn get_as(&self, op: &DiffOp<K>, ty: DerivativeType) -> Result<f64, Error<K>>
    where
        K: Display,
    {
        match self._role(op)? {
            Some(_Role::Input(i)) => Ok(self.inputs[i]._read(ty)),
            Some(_Role::Output(_)) => Err(Error::NotAnInput(op.to_string())),
            None => Err(Error::NotRequested(op.to_string())),
        }
    }

    /// All input derivatives in the canonical order of the tree.
    pub fn collect(&self) -> Vec<(DiffOp<K>, f64)> {
        self.inputs
            .iter()
            .map(|r| {
                let op = DiffOp::from_monomial(self.graph.clone(), r.key.clone());
                (op, r._read(DerivativeType::Derivative))
            })
            .collect()
    }

    /// Requested input operators in canonical order.
    pub fn inputs(&self) -> Vec<DiffOp<K>> {
        self.inputs
            .iter()
            .map(|r| DiffOp::from_monomial(self.graph.clone(), r.key.clone()))
            .collect()
    }

    /// Requested output operators in canonical order.
    pub fn outputs(&self) -> Vec<DiffOp<K>> {
        self.outputs
            .iter()
            .map(|r| DiffOp::from_monomial(self.graph.clone(), r.key.clone()))
            .collect()
    }

    /// Highest total order among the inputs.
    #[inline]
    pub fn max_order(&self) -> usize {
        self.max_order
    }
}

// impls
impl<K> BackPropagator<K> {
    fn _role(&self, op: &DiffOp<K>) -> Result<Option<_Role>, Error<K>> {
        if !Graph::ptr_eq(op.graph(), &self.graph) {
            return Err(Error::DifferentGraphs("back-propagator lookup"));
        }
        Ok(self.roles.get(op.monomial()).copied())
    }

    /// Accumulate `coef * mono` under its latest non-variable factor.
    ///
    /// Monomials which cannot reach a requested input are dropped.
    fn _file(
        &self,
        slots: &[Slot],
        mono: Monomial,
        coef: f64,
        buckets: &mut [BTreeMap<Monomial, f64>],
        terminal: &mut BTreeMap<Monomial, f64>,
    ) {
        if mono.total_order() > self.max_order {
            return;
        }
        let mut lead = None;
        for (pos, k) in mono.factors() {
            match slots[*pos] {
                Slot::Const(_) => return,
                Slot::Var(_) if *k > self.caps[*pos] => return,
                Slot::Var(_) => {}
                _ if !self.relevant[*pos] => return,
                _ => lead = Some(*pos),
            }
        }
        let dst = match lead {
            Some(pos) => &mut buckets[pos],
            None => terminal,
        };
        *dst.entry(mono).or_default() += coef;
    }
}

impl _Request {
    #[inline]
    fn _read(&self, ty: DerivativeType) -> f64 {
        match ty {
            DerivativeType::TaylorCoefficient => self.value,
            DerivativeType::Derivative => self.value * self.key.multiplicity(),
        }
    }
}

/// `d(node)^power` in terms of the differentials of its operands.
fn _expand(
    slot: Slot,
    values: &[f64],
    pos: usize,
    power: usize,
    max_order: usize,
) -> Vec<(Monomial, f64)> {
    match slot {
        Slot::Unary(op, arg) => {
            let ders = op.derivatives(values[arg], values[pos], max_order);
            expand_univariate(&ders, power, max_order)
                .into_iter()
                .map(|(n, w)| (Monomial::single(arg, n), w))
                .collect()
        }
        Slot::Binary(op, lhs, rhs) => {
            let terms = binary_terms(op, (lhs, values[lhs]), (rhs, values[rhs]), max_order);
            expand_multinomial(&terms, power, max_order)
        }
        Slot::Var(_) | Slot::Const(_) => Vec::new(),
    }
}
