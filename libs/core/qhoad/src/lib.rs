mod backprop;
mod calc_tree;
mod diffop;
mod error;
mod expand;
mod expr;
mod graph;
mod graphviz;
mod op;

pub use backprop::{BackPropagator, DerivativeType, MAX_ORDER};
pub use calc_tree::{Bindings, CalcTree};
pub use diffop::{d, sort_differential_operators, DiffOp};
pub use error::Error;
pub use expr::Expr;
pub use graph::Graph;
pub use graphviz::GraphvizBuilder;
pub use op::{BinaryOp, UnaryOp};
