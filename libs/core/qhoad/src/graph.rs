use std::{cell::RefCell, collections::HashMap, fmt::Debug, hash::Hash, rc::Rc};

use crate::{
    op::{BinaryOp, UnaryOp},
    Error, Expr,
};

// -----------------------------------------------------------------------------
// Node
// -----------------------------------------------------------------------------
/// Structural description of a node.
///
/// Operands are referred to by node id, i.e. the index in the arena.
/// Constants are stored by bit pattern so that the whole enum is hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Node {
    Var(usize),
    Const(u64),
    Unary(UnaryOp, usize),
    Binary(BinaryOp, usize, usize),
}

impl Node {
    #[inline]
    pub(crate) fn constant(value: f64) -> Self {
        Node::Const(value.to_bits())
    }

    /// Operand ids from left to right.
    #[inline]
    pub(crate) fn operands(&self) -> impl DoubleEndedIterator<Item = usize> {
        let (lhs, rhs) = match *self {
            Node::Var(_) | Node::Const(_) => (None, None),
            Node::Unary(_, arg) => (Some(arg), None),
            Node::Binary(_, lhs, rhs) => (Some(lhs), Some(rhs)),
        };
        lhs.into_iter().chain(rhs)
    }
}

// -----------------------------------------------------------------------------
// _Graph
// Graph
// -----------------------------------------------------------------------------
#[derive(Debug)]
pub(crate) struct _Graph<K> {
    pub(crate) nodes: Vec<Node>,
    pub(crate) keys: Vec<K>,
    lookup: HashMap<Node, usize>,
}

/// Arena of expression nodes shared by all [Expr] built from it.
///
/// Nodes are never removed. Registering a node which is structurally identical
/// to an existing one returns the existing id, so common subexpressions are
/// represented once.
#[derive(Debug)]
pub struct Graph<K>(pub(crate) Rc<RefCell<_Graph<K>>>);

impl<K> Clone for Graph<K> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

//
// ctor
//
impl<K> Default for Graph<K> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Graph<K> {
    #[inline]
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(_Graph {
            nodes: Vec::new(),
            keys: Vec::new(),
            lookup: HashMap::new(),
        })))
    }
}

//
// methods
//
impl<K> Graph<K> {
    /// Create a new variable which belongs to this graph.
    #[inline]
    pub fn create_var(&self, key: K) -> Result<Expr<K>, Error<K>>
    where
        K: Debug + Eq,
    {
        if self.0.borrow().keys.contains(&key) {
            return Err(Error::VarAlreadyExists(key));
        }
        let idx = {
            let mut inner = self.0.borrow_mut();
            inner.keys.push(key);
            inner.keys.len() - 1
        };
        Ok(Expr::new(self.clone(), self._reg(Node::Var(idx))))
    }

    /// Find the variable registered with the given key.
    pub fn var(&self, key: &K) -> Option<Expr<K>>
    where
        K: Eq,
    {
        let idx = self.0.borrow().keys.iter().position(|k| k == key)?;
        let id = self.0.borrow().lookup.get(&Node::Var(idx)).copied()?;
        Some(Expr::new(self.clone(), id))
    }

    /// Constant expression of this graph.
    #[inline]
    pub fn constant(&self, value: f64) -> Expr<K> {
        Expr::new(self.clone(), self._reg(Node::constant(value)))
    }

    /// Number of nodes registered so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.borrow().nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that two graphs are the same instance.
    ///
    /// Note that this comparison is not based on the contents of the graphs.
    #[inline]
    pub fn ptr_eq(lhs: &Self, rhs: &Self) -> bool {
        Rc::ptr_eq(&lhs.0, &rhs.0)
    }
}

// impls
impl<K> Graph<K> {
    /// Register a node and return its id, reusing a structurally equal node if any.
    pub(crate) fn _reg(&self, node: Node) -> usize {
        let mut inner = self.0.borrow_mut();
        if let Some(&id) = inner.lookup.get(&node) {
            return id;
        }
        let id = inner.nodes.len();
        inner.nodes.push(node);
        inner.lookup.insert(node, id);
        id
    }

    #[inline]
    pub(crate) fn _debug_ptr(&self) -> impl std::fmt::Debug {
        self.0.as_ptr()
    }

    #[inline]
    pub(crate) fn _node(&self, id: usize) -> Node {
        self.0.borrow().nodes[id]
    }

    #[inline]
    pub(crate) fn _key(&self, var_idx: usize) -> K
    where
        K: Clone,
    {
        self.0.borrow().keys[var_idx].clone()
    }
}

#[cfg(test)]
mod tests {
    use qmath::num::Exp;

    use super::*;

    #[test]
    fn test_create_var() {
        let graph = Graph::new();

        let x = graph.create_var("x").unwrap();

        assert_eq!(x.key(), Some("x"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_create_var_err_already_exists() {
        let graph = Graph::new();

        graph.create_var("x").unwrap();
        let err = graph.create_var("x");

        assert!(err.is_err());
        assert_eq!(err.unwrap_err(), Error::VarAlreadyExists("x"));
    }

    #[test]
    fn test_var_lookup() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();

        assert_eq!(graph.var(&"x"), Some(x));
        assert_eq!(graph.var(&"y"), None);
    }

    #[test]
    fn test_ptr_eq() {
        let graph1 = Graph::<&'static str>::new();
        let graph2 = graph1.clone();

        assert!(Graph::ptr_eq(&graph1, &graph2));
    }

    #[test]
    fn test_ptr_neq() {
        let graph1 = Graph::<&'static str>::new();
        let graph2 = Graph::<&'static str>::new();

        assert!(!Graph::ptr_eq(&graph1, &graph2));
    }

    #[test]
    fn test_structural_dedup() {
        let graph = Graph::new();
        let x = graph.create_var("x").unwrap();
        let y = graph.create_var("y").unwrap();

        let a = (&x * &y).exp();
        let b = (&x * &y).exp();
        let c = (&y * &x).exp();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // x, y, x*y, exp(x*y), y*x, exp(y*x)
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn test_constant_dedup() {
        let graph = Graph::<&str>::new();

        let c1 = graph.constant(0.4);
        let c2 = graph.constant(0.4);
        let c3 = graph.constant(0.5);

        assert_eq!(c1, c2);
        assert_ne!(c1, c3);
        assert_eq!(graph.len(), 2);
    }
}
