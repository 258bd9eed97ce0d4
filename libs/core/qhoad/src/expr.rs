use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

use crate::{
    graph::{Node, _Graph},
    op::{BinaryOp, UnaryOp},
    Graph,
};

// -----------------------------------------------------------------------------
// Expr
// -----------------------------------------------------------------------------
/// Handle to a node of a [Graph].
///
/// Expressions are built with arithmetic operators, `f64` operands becoming
/// constant nodes, and with the elementary function traits of [qmath::num].
/// Two handles are equal iff they point to the same node of the same graph,
/// which, thanks to structural deduplication, means the same expression.
#[derive(Debug)]
pub struct Expr<K> {
    graph: Graph<K>,
    id: usize,
}

impl<K> Clone for Expr<K> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            id: self.id,
        }
    }
}

impl<K> PartialEq for Expr<K> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Graph::ptr_eq(&self.graph, &other.graph)
    }
}

impl<K> Eq for Expr<K> {}

impl<K> Hash for Expr<K> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

//
// ser/de
//
impl<K> Display for Expr<K>
where
    K: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        _fmt_node(&self.graph.0.borrow(), self.id, f)
    }
}

// negations are parenthesized wherever they appear as an operand
fn _precedence(node: &Node) -> u8 {
    match node {
        Node::Unary(UnaryOp::Neg, _) => 0,
        Node::Const(bits) if f64::from_bits(*bits).is_sign_negative() => 0,
        Node::Binary(BinaryOp::Add | BinaryOp::Sub, ..) => 1,
        Node::Binary(BinaryOp::Mul | BinaryOp::Div, ..) => 2,
        _ => 3,
    }
}

fn _fmt_node<K: Display>(
    graph: &_Graph<K>,
    id: usize,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    let wrapped = |id: usize, max_prec: u8, f: &mut std::fmt::Formatter<'_>| {
        if _precedence(&graph.nodes[id]) <= max_prec {
            write!(f, "(")?;
            _fmt_node(graph, id, f)?;
            write!(f, ")")
        } else {
            _fmt_node(graph, id, f)
        }
    };
    match graph.nodes[id] {
        Node::Var(idx) => write!(f, "{}", graph.keys[idx]),
        Node::Const(bits) => write!(f, "{}", f64::from_bits(bits)),
        Node::Unary(UnaryOp::Neg, arg) => {
            write!(f, "-")?;
            wrapped(arg, 2, f)
        }
        Node::Unary(op, arg) => {
            write!(f, "{op}(")?;
            _fmt_node(graph, arg, f)?;
            write!(f, ")")
        }
        Node::Binary(op, lhs, rhs) => {
            let prec = _precedence(&graph.nodes[id]);
            // right operands of the same precedence are parenthesized
            // so that the rendering shows the actual tree
            wrapped(lhs, prec - 1, f)?;
            write!(f, "{op}")?;
            wrapped(rhs, prec, f)
        }
    }
}

//
// methods
//
impl<K> Expr<K> {
    #[inline]
    pub(crate) fn new(graph: Graph<K>, id: usize) -> Self {
        Self { graph, id }
    }

    #[inline]
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// The graph this expression belongs to.
    #[inline]
    pub fn graph(&self) -> &Graph<K> {
        &self.graph
    }

    /// Get the key of the expression.
    /// Only available if this expression is a variable.
    #[inline]
    pub fn key(&self) -> Option<K>
    where
        K: Clone,
    {
        match self.graph._node(self.id) {
            Node::Var(idx) => Some(self.graph._key(idx)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_var(&self) -> bool {
        matches!(self.graph._node(self.id), Node::Var(_))
    }

    /// Get the expression as a constant if possible
    #[inline]
    pub fn as_const(&self) -> Option<f64> {
        match self.graph._node(self.id) {
            Node::Const(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }
}

// impls
impl<K> Expr<K> {
    #[inline]
    fn _unary(&self, op: UnaryOp) -> Expr<K> {
        let id = self.graph._reg(Node::Unary(op, self.id));
        Expr::new(self.graph.clone(), id)
    }

    #[inline]
    fn _binary(op: BinaryOp, lhs: &Expr<K>, rhs: &Expr<K>) -> Expr<K> {
        if !Graph::ptr_eq(&lhs.graph, &rhs.graph) {
            panic!(
                "Cannot {} expressions from different graphs: lhs.graph={:?}, rhs.graph={:?}",
                op,
                lhs.graph._debug_ptr(),
                rhs.graph._debug_ptr()
            );
        }
        let id = lhs.graph._reg(Node::Binary(op, lhs.id, rhs.id));
        Expr::new(lhs.graph.clone(), id)
    }
}

//
// arithmetic operations
//
impl<K> std::ops::Neg for Expr<K> {
    type Output = Expr<K>;

    #[inline]
    fn neg(self) -> Self::Output {
        self._unary(UnaryOp::Neg)
    }
}

impl<K> std::ops::Neg for &Expr<K> {
    type Output = Expr<K>;

    #[inline]
    fn neg(self) -> Self::Output {
        self._unary(UnaryOp::Neg)
    }
}

macro_rules! _define_arithmetic_binary {
    ($tr:ident, $fn:ident, $ass_tr:ident, $ass_fn: ident, $op:ident) => {
        impl<K> std::ops::$tr<&Expr<K>> for &Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: &Expr<K>) -> Self::Output {
                Expr::_binary(BinaryOp::$op, self, rhs)
            }
        }
        impl<K> std::ops::$tr<Expr<K>> for &Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: Expr<K>) -> Self::Output {
                Expr::_binary(BinaryOp::$op, self, &rhs)
            }
        }
        impl<K> std::ops::$tr<&Expr<K>> for Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: &Expr<K>) -> Self::Output {
                Expr::_binary(BinaryOp::$op, &self, rhs)
            }
        }
        impl<K> std::ops::$tr<Expr<K>> for Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: Expr<K>) -> Self::Output {
                Expr::_binary(BinaryOp::$op, &self, &rhs)
            }
        }
        impl<K> std::ops::$tr<f64> for &Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: f64) -> Self::Output {
                Expr::_binary(BinaryOp::$op, self, &self.graph.constant(rhs))
            }
        }
        impl<K> std::ops::$tr<f64> for Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: f64) -> Self::Output {
                std::ops::$tr::$fn(&self, rhs)
            }
        }
        impl<K> std::ops::$tr<&Expr<K>> for f64 {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: &Expr<K>) -> Self::Output {
                Expr::_binary(BinaryOp::$op, &rhs.graph.constant(self), rhs)
            }
        }
        impl<K> std::ops::$tr<Expr<K>> for f64 {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self, rhs: Expr<K>) -> Self::Output {
                std::ops::$tr::$fn(self, &rhs)
            }
        }
        impl<K> std::ops::$ass_tr<Expr<K>> for Expr<K> {
            #[inline]
            fn $ass_fn(&mut self, rhs: Expr<K>) {
                *self = Expr::_binary(BinaryOp::$op, self, &rhs);
            }
        }
        impl<K> std::ops::$ass_tr<&Expr<K>> for Expr<K> {
            #[inline]
            fn $ass_fn(&mut self, rhs: &Expr<K>) {
                *self = Expr::_binary(BinaryOp::$op, self, rhs);
            }
        }
        impl<K> std::ops::$ass_tr<f64> for Expr<K> {
            #[inline]
            fn $ass_fn(&mut self, rhs: f64) {
                *self = std::ops::$tr::$fn(&*self, rhs);
            }
        }
    };
}

_define_arithmetic_binary!(Add, add, AddAssign, add_assign, Add);
_define_arithmetic_binary!(Sub, sub, SubAssign, sub_assign, Sub);
_define_arithmetic_binary!(Mul, mul, MulAssign, mul_assign, Mul);
_define_arithmetic_binary!(Div, div, DivAssign, div_assign, Div);

//
// unary elementary functions
//
macro_rules! _define_elementary_unary {
    ($tr:ident, $fn:ident, $op:ident) => {
        impl<K> qmath::num::$tr for Expr<K> {
            type Output = Expr<K>;

            #[inline]
            fn $fn(self) -> Self::Output {
                self._unary(UnaryOp::$op)
            }
        }
    };
}

_define_elementary_unary!(Exp, exp, Exp);
_define_elementary_unary!(Log, log, Log);
_define_elementary_unary!(Sqrt, sqrt, Sqrt);
_define_elementary_unary!(Erf, erf, Erf);
_define_elementary_unary!(Erfc, erfc, Erfc);
_define_elementary_unary!(Sin, sin, Sin);
_define_elementary_unary!(Cos, cos, Cos);
_define_elementary_unary!(Tan, tan, Tan);
_define_elementary_unary!(Asin, asin, Asin);
_define_elementary_unary!(Acos, acos, Acos);
_define_elementary_unary!(Atan, atan, Atan);
_define_elementary_unary!(Sinh, sinh, Sinh);
_define_elementary_unary!(Cosh, cosh, Cosh);
_define_elementary_unary!(Tanh, tanh, Tanh);
_define_elementary_unary!(Asinh, asinh, Asinh);
_define_elementary_unary!(Acosh, acosh, Acosh);
_define_elementary_unary!(Atanh, atanh, Atanh);
_define_elementary_unary!(Tgamma, tgamma, Tgamma);
_define_elementary_unary!(Lgamma, lgamma, Lgamma);
