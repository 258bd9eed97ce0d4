mod elementary_fn;
mod special;

pub use elementary_fn::{
    Acos, Acosh, Asin, Asinh, Atan, Atanh, Cos, Cosh, Erf, Erfc, Exp, Lgamma, Log, Powi, Sin,
    Sinh, Sqrt, Tan, Tanh, Tgamma,
};
pub use special::{digamma, polygamma};
