use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use crate::{
    diffop::Monomial,
    graph::Node,
    graphviz::{GraphvizBuilder, _Row},
    op::{BinaryOp, UnaryOp},
    DiffOp, Error, Expr, Graph,
};

// -----------------------------------------------------------------------------
// Bindings
// -----------------------------------------------------------------------------
/// Values of variables keyed by the variable key.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(transparent)]
#[serde(bound(deserialize = "K: serde::Deserialize<'de> + Ord"))]
pub struct Bindings<K>(BTreeMap<K, f64>);

impl<K> Default for Bindings<K> {
    #[inline]
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<K: Ord> FromIterator<(K, f64)> for Bindings<K> {
    #[inline]
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K> Bindings<K> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with(mut self, key: K, value: f64) -> Self
    where
        K: Ord,
    {
        self.0.insert(key, value);
        self
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: f64) -> Option<f64>
    where
        K: Ord,
    {
        self.0.insert(key, value)
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<f64>
    where
        K: Ord,
    {
        self.0.get(key).copied()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Slot
// -----------------------------------------------------------------------------
/// A node of the tree whose operands are referred to by position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Slot {
    Var(usize),
    Const(f64),
    Unary(UnaryOp, usize),
    Binary(BinaryOp, usize, usize),
}

// -----------------------------------------------------------------------------
// CalcTree
// -----------------------------------------------------------------------------
/// Nodes reachable from a set of roots, in topological order, with their values.
///
/// The order is the post-order of a depth first search from the roots, visiting
/// operands from left to right, so every operand precedes its consumers and the
/// order only depends on the structure of the roots.
/// Values are stored by position. Constants are set at construction and
/// variables hold `NaN` until they are set.
#[derive(Debug)]
pub struct CalcTree<K> {
    graph: Graph<K>,
    order: Vec<usize>,
    positions: HashMap<usize, usize>,
    slots: Vec<Slot>,
    values: Vec<f64>,
    roots: Vec<usize>,
}

//
// ctor
//
impl<K> CalcTree<K> {
    pub fn new(roots: &[&Expr<K>]) -> Result<Self, Error<K>> {
        let graph = roots.first().ok_or(Error::EmptyRoots)?.graph().clone();
        if roots.iter().any(|r| !Graph::ptr_eq(r.graph(), &graph)) {
            return Err(Error::DifferentGraphs("calculation tree construction"));
        }

        let mut order = Vec::new();
        let mut positions = HashMap::new();
        let mut stack: Vec<_> = roots.iter().rev().map(|r| (r.id(), false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if positions.contains_key(&id) {
                continue;
            }
            if expanded {
                positions.insert(id, order.len());
                order.push(id);
                continue;
            }
            stack.push((id, true));
            let node = graph._node(id);
            stack.extend(
                node.operands()
                    .rev()
                    .filter(|op| !positions.contains_key(op))
                    .map(|op| (op, false)),
            );
        }

        let slots: Vec<_> = order
            .iter()
            .map(|id| match graph._node(*id) {
                Node::Var(idx) => Slot::Var(idx),
                Node::Const(bits) => Slot::Const(f64::from_bits(bits)),
                Node::Unary(op, arg) => Slot::Unary(op, positions[&arg]),
                Node::Binary(op, lhs, rhs) => Slot::Binary(op, positions[&lhs], positions[&rhs]),
            })
            .collect();
        let values = slots
            .iter()
            .map(|slot| match slot {
                Slot::Const(v) => *v,
                _ => f64::NAN,
            })
            .collect();
        let roots = roots.iter().map(|r| positions[&r.id()]).collect();

        let tree = Self {
            graph,
            order,
            positions,
            slots,
            values,
            roots,
        };
        log::debug!(
            "calculation tree is built: nodes={}, vars={}, roots={}",
            tree.len(),
            tree.leaves().len(),
            tree.roots.len()
        );
        Ok(tree)
    }
}

//
// methods
//
impl<K> CalcTree<K> {
    /// Set the value of a variable.
    pub fn set(&mut self, var: &Expr<K>, value: f64) -> Result<(), Error<K>>
    where
        K: Display,
    {
        let pos = self._position(var)?;
        match self.slots[pos] {
            Slot::Var(_) => {
                self.values[pos] = value;
                Ok(())
            }
            _ => Err(Error::NotAVariable(var.to_string())),
        }
    }

    /// Set the value of the variable registered with `key`.
    pub fn set_by_key(&mut self, key: &K, value: f64) -> Result<(), Error<K>>
    where
        K: Eq + Display,
    {
        let var = self
            .graph
            .var(key)
            .ok_or_else(|| Error::NotInTree(key.to_string()))?;
        self.set(&var, value)
    }

    /// Set all values of `bindings`.
    ///
    /// Keys are checked before any value is set.
    pub fn bind(&mut self, bindings: &Bindings<K>) -> Result<(), Error<K>>
    where
        K: Eq + Display,
    {
        let targets = bindings
            .iter()
            .map(|(key, value)| {
                let var = self
                    .graph
                    .var(key)
                    .filter(|v| self.contains(v))
                    .ok_or_else(|| Error::NotInTree(key.to_string()))?;
                Ok::<_, Error<K>>((var, value))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (var, value) in targets {
            self.set(&var, value)?;
        }
        Ok(())
    }

    /// Compute the values of all nodes from the values of variables.
    pub fn evaluate(&mut self) {
        for (pos, slot) in self.slots.iter().enumerate() {
            self.values[pos] = match *slot {
                Slot::Var(_) | Slot::Const(_) => continue,
                Slot::Unary(op, arg) => op.value(self.values[arg]),
                Slot::Binary(op, lhs, rhs) => op.value(self.values[lhs], self.values[rhs]),
            };
        }
    }

    /// Current value of a node.
    pub fn get(&self, expr: &Expr<K>) -> Result<f64, Error<K>>
    where
        K: Display,
    {
        self._position(expr).map(|pos| self.values[pos])
    }

    /// Position of `expr` in the topological order.
    #[inline]
    pub fn position(&self, expr: &Expr<K>) -> Option<usize> {
        if !Graph::ptr_eq(expr.graph(), &self.graph) {
            return None;
        }
        self.positions.get(&expr.id()).copied()
    }

    #[inline]
    pub fn contains(&self, expr: &Expr<K>) -> bool {
        self.position(expr).is_some()
    }

    pub fn topological_order(&self) -> Vec<Expr<K>> {
        self.order
            .iter()
            .map(|id| Expr::new(self.graph.clone(), *id))
            .collect()
    }

    /// Variables of the tree in topological order.
    pub fn leaves(&self) -> Vec<Expr<K>> {
        self.slots
            .iter()
            .zip(&self.order)
            .filter(|(slot, _)| matches!(slot, Slot::Var(_)))
            .map(|(_, id)| Expr::new(self.graph.clone(), *id))
            .collect()
    }

    pub fn roots(&self) -> Vec<Expr<K>> {
        self.roots
            .iter()
            .map(|pos| Expr::new(self.graph.clone(), self.order[*pos]))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn graph(&self) -> &Graph<K> {
        &self.graph
    }

    /// Graphviz rendering of the tree with the current values.
    pub fn graphviz(&self) -> GraphvizBuilder<K>
    where
        K: Display,
    {
        let mut edges = Vec::new();
        let mut rows = Vec::with_capacity(self.slots.len());
        for (pos, slot) in self.slots.iter().enumerate() {
            let id = self.order[pos];
            let value = self.values[pos];
            let label = match *slot {
                Slot::Var(_) => Expr::new(self.graph.clone(), id).to_string(),
                Slot::Const(_) => "const".to_string(),
                Slot::Unary(op, arg) => {
                    edges.push((arg, pos, None));
                    op.to_string()
                }
                Slot::Binary(op, lhs, rhs) => {
                    edges.push((lhs, pos, Some("L")));
                    edges.push((rhs, pos, Some("R")));
                    op.to_string()
                }
            };
            rows.push(_Row {
                id,
                label,
                leaf: matches!(slot, Slot::Var(_) | Slot::Const(_)),
                value,
                derivatives: Vec::new(),
            });
        }
        edges.sort();
        GraphvizBuilder::new(self.graph.clone(), rows, edges)
    }
}

// impls
impl<K> CalcTree<K> {
    fn _position(&self, expr: &Expr<K>) -> Result<usize, Error<K>>
    where
        K: Display,
    {
        if !Graph::ptr_eq(expr.graph(), &self.graph) {
            return Err(Error::DifferentGraphs("calculation tree lookup"));
        }
        self.positions
            .get(&expr.id())
            .copied()
            .ok_or_else(|| Error::NotInTree(expr.to_string()))
    }

    #[inline]
    pub(crate) fn _slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub(crate) fn _values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub(crate) fn _order(&self) -> &[usize] {
        &self.order
    }

    /// The monomial of `op` keyed by positions in this tree.
    pub(crate) fn _monomial(&self, op: &DiffOp<K>) -> Result<Monomial, Error<K>>
    where
        K: Display,
    {
        if !Graph::ptr_eq(op.graph(), &self.graph) {
            return Err(Error::DifferentGraphs("differential operator lookup"));
        }
        op.monomial().remap(|id| {
            self.positions
                .get(&id)
                .copied()
                .ok_or_else(|| Error::NotInTree(Expr::new(self.graph.clone(), id).to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use qmath::num::{Erfc, Exp, Log, Sqrt};
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_topological_order() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();
        let xy = &x * &y;
        let f = xy.clone().exp() + &x;

        let tree = CalcTree::new(&[&f]).unwrap();

        assert_eq!(
            tree.topological_order(),
            vec![x.clone(), y.clone(), xy.clone(), xy.clone().exp(), f.clone()]
        );
        assert_eq!(tree.leaves(), vec![x.clone(), y.clone()]);
        assert_eq!(tree.roots(), vec![f.clone()]);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.position(&f), Some(4));
    }

    #[test]
    fn test_operands_precede_consumers() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();
        let a = (&y / &x).log();
        let b = (&a * &x + &y).sqrt();
        let f = &b - &a * 2.0;

        let tree = CalcTree::new(&[&f, &a]).unwrap();

        for (pos, slot) in tree._slots().iter().enumerate() {
            match *slot {
                Slot::Unary(_, arg) => assert!(arg < pos),
                Slot::Binary(_, lhs, rhs) => assert!(lhs < pos && rhs < pos),
                _ => {}
            }
        }
        assert_eq!(tree.roots(), vec![f, a]);
    }

    #[test]
    fn test_order_is_deterministic() {
        let build = || {
            let graph = Graph::new();
            let x = graph.create_var("x").unwrap();
            let y = graph.create_var("y").unwrap();
            let f = (&x * &y).erfc() / (&y + 1.0).log();
            let tree = CalcTree::new(&[&f]).unwrap();
            tree.topological_order()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        };

        assert_eq!(build(), build());
    }

    #[rstest]
    #[case(1.2, 0.4)]
    #[case(0.3, 2.5)]
    #[case(-1.0, 4.0)]
    fn test_evaluate(#[case] xv: f64, #[case] yv: f64) {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();
        let f = (&x * &y).erfc() + (&x / &y).exp() - -&y;

        let mut tree = CalcTree::new(&[&f]).unwrap();
        tree.set(&x, xv).unwrap();
        tree.set(&y, yv).unwrap();
        tree.evaluate();

        let expected = Erfc::erfc(xv * yv) + (xv / yv).exp() + yv;
        assert_relative_eq!(tree.get(&f).unwrap(), expected, max_relative = 1e-15);
        assert_eq!(tree.get(&x).unwrap(), xv);
    }

    #[test]
    fn test_product_scenario() {
        let graph = Graph::new();
        let val0 = graph.create_var("val0").unwrap();
        let val1 = graph.create_var("val1").unwrap();
        let f = &val0 * &val1;

        let mut tree = CalcTree::new(&[&f]).unwrap();
        tree.set(&val0, 2.0).unwrap();
        tree.set(&val1, 3.0).unwrap();
        tree.evaluate();

        assert_eq!(tree.get(&f).unwrap(), 6.0);
    }

    #[test]
    fn test_evaluate_is_bit_identical() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let f = (x.clone().sqrt() * 0.1 + 3.0).log() / &x;

        let mut tree = CalcTree::new(&[&f]).unwrap();
        tree.set(&x, 0.7).unwrap();
        tree.evaluate();
        let first = tree.get(&f).unwrap();
        tree.evaluate();
        let second = tree.get(&f).unwrap();

        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_initial_values() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let c = graph.constant(0.4);
        let f = &x * &c;

        let tree = CalcTree::new(&[&f]).unwrap();

        assert!(tree.get(&x).unwrap().is_nan());
        assert_eq!(tree.get(&c).unwrap(), 0.4);
    }

    #[test]
    fn test_floating_point_edge_cases() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();
        let f = &x / &y;
        let g = y.clone().log();

        let mut tree = CalcTree::new(&[&f, &g]).unwrap();
        tree.set(&x, 1.0).unwrap();
        tree.set(&y, 0.0).unwrap();
        tree.evaluate();

        assert_eq!(tree.get(&f).unwrap(), f64::INFINITY);
        assert_eq!(tree.get(&g).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_set_errors() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();
        let f = x.clone().exp();

        let mut tree = CalcTree::new(&[&f]).unwrap();

        assert_eq!(
            tree.set(&f, 1.0),
            Err(Error::NotAVariable("exp(x)".to_string()))
        );
        assert_eq!(tree.set(&y, 1.0), Err(Error::NotInTree("y".to_string())));
        assert_eq!(
            tree.set_by_key(&"z", 1.0),
            Err(Error::NotInTree("z".to_string()))
        );
        assert_eq!(tree.get(&y), Err(Error::NotInTree("y".to_string())));

        let other = Graph::new().create_var("x").unwrap();
        assert_eq!(
            tree.set(&other, 1.0),
            Err(Error::DifferentGraphs("calculation tree lookup"))
        );
    }

    #[test]
    fn test_construction_errors() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = Graph::new().create_var("y").unwrap();

        assert_eq!(CalcTree::<&str>::new(&[]).unwrap_err(), Error::EmptyRoots);
        assert_eq!(
            CalcTree::new(&[&x, &y]).unwrap_err(),
            Error::DifferentGraphs("calculation tree construction")
        );
    }

    #[test]
    fn test_bind() {
        let graph = Graph::new();
        let s = graph.create_var("S".to_string()).unwrap();
        let k = graph.create_var("K".to_string()).unwrap();
        let f = (&s / &k).log();

        let bindings: Bindings<String> =
            serde_json::from_str(r#"{"S": 100.0, "K": 102.0}"#).unwrap();
        let mut tree = CalcTree::new(&[&f]).unwrap();
        tree.bind(&bindings).unwrap();
        tree.evaluate();

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.get(&"S".to_string()), Some(100.0));
        assert_relative_eq!(
            tree.get(&f).unwrap(),
            (100.0f64 / 102.0).ln(),
            max_relative = 1e-15
        );
    }

    #[test]
    fn test_bind_rejects_unknown_key() {
        let graph = Graph::new();
        let s = graph.create_var("S".to_string()).unwrap();
        graph.create_var("T".to_string()).unwrap();
        let mut tree = CalcTree::new(&[&s.clone().exp()]).unwrap();

        let bindings = Bindings::new()
            .with("S".to_string(), 1.0)
            .with("T".to_string(), 2.0);
        let res = tree.bind(&bindings);

        assert_eq!(res, Err(Error::NotInTree("T".to_string())));
        // nothing is set on failure
        assert!(tree.get(&s).unwrap().is_nan());
    }

    #[test]
    fn test_bindings_serde() {
        let bindings: Bindings<String> = [("v".to_string(), 0.15), ("T".to_string(), 0.5)]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&bindings).unwrap();
        let schema = serde_json::to_value(schemars::schema_for!(Bindings<String>)).unwrap();

        assert_eq!(json, r#"{"T":0.5,"v":0.15}"#);
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn test_monomial_conversion() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();
        let f = (&y * &x).exp();
        let tree = CalcTree::new(&[&f]).unwrap();
        let op = crate::d(&x).pow(2) * crate::d(&f);

        let mono = tree._monomial(&op).unwrap();

        assert_eq!(mono.factors(), &[(1, 2), (3, 1)]);
        let mono = tree._monomial(&crate::d(&y).pow(3)).unwrap();
        assert_eq!(mono.factors(), &[(0, 3)]);
    }
}
