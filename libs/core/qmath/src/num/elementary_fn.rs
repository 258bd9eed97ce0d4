// -----------------------------------------------------------------------------
// Powi
// -----------------------------------------------------------------------------
/// Trait to generalize integer power function interface.
pub trait Powi: Sized {
    type Output: Into<Self>;

    fn powi(self, n: i32) -> Self::Output;
}

impl Powi for f64 {
    type Output = Self;

    #[inline]
    fn powi(self, n: i32) -> Self::Output {
        f64::powi(self, n)
    }
}

impl Powi for f32 {
    type Output = Self;

    #[inline]
    fn powi(self, n: i32) -> Self::Output {
        f32::powi(self, n)
    }
}

// -----------------------------------------------------------------------------
// Unary elementary functions
// -----------------------------------------------------------------------------
macro_rules! _define_elementary_fn {
    ($(#[$doc:meta])* $tr:ident, $fn:ident, $f64:expr, $f32:expr) => {
        $(#[$doc])*
        pub trait $tr: Sized {
            type Output: Into<Self>;

            fn $fn(self) -> Self::Output;
        }

        impl $tr for f64 {
            type Output = Self;

            #[inline]
            fn $fn(self) -> Self::Output {
                $f64(self)
            }
        }

        impl $tr for f32 {
            type Output = Self;

            #[inline]
            fn $fn(self) -> Self::Output {
                $f32(self)
            }
        }
    };
}

_define_elementary_fn!(
    /// Trait to provide the exponential function interface.
    Exp, exp, f64::exp, f32::exp
);
_define_elementary_fn!(
    /// Trait to generalize logarithm (in natural base) function interface.
    Log, log, f64::ln, f32::ln
);
_define_elementary_fn!(Sqrt, sqrt, f64::sqrt, f32::sqrt);

// error and gamma functions
_define_elementary_fn!(
    /// Trait to generalize error function interface.
    Erf, erf, libm::erf, libm::erff
);
_define_elementary_fn!(
    /// Complementary error function, `1 - erf(x)`, without cancellation for large `x`.
    Erfc, erfc, libm::erfc, libm::erfcf
);
_define_elementary_fn!(
    /// Gamma function.
    Tgamma, tgamma, libm::tgamma, libm::tgammaf
);
_define_elementary_fn!(
    /// Natural logarithm of the absolute value of the gamma function.
    Lgamma, lgamma, libm::lgamma, libm::lgammaf
);

// trigonometric
_define_elementary_fn!(Sin, sin, f64::sin, f32::sin);
_define_elementary_fn!(Cos, cos, f64::cos, f32::cos);
_define_elementary_fn!(Tan, tan, f64::tan, f32::tan);
_define_elementary_fn!(Asin, asin, f64::asin, f32::asin);
_define_elementary_fn!(Acos, acos, f64::acos, f32::acos);
_define_elementary_fn!(Atan, atan, f64::atan, f32::atan);

// hyperbolic
_define_elementary_fn!(Sinh, sinh, f64::sinh, f32::sinh);
_define_elementary_fn!(Cosh, cosh, f64::cosh, f32::cosh);
_define_elementary_fn!(Tanh, tanh, f64::tanh, f32::tanh);
_define_elementary_fn!(Asinh, asinh, f64::asinh, f32::asinh);
_define_elementary_fn!(Acosh, acosh, f64::acosh, f32::acosh);
_define_elementary_fn!(Atanh, atanh, f64::atanh, f32::atanh);
